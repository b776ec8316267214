use serde::{Deserialize, Serialize};

/// Payload for creating a registry entry, shared by the REST body and the
/// `add-user` gateway command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewUser {
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[serde(rename = "idade", default)]
    pub age: Option<i64>,
}
