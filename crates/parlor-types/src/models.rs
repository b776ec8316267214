use serde::{Deserialize, Serialize};

/// A registered user as exposed to clients.
///
/// Field names on the wire stay `nome`/`idade` for compatibility with the
/// legacy desktop client, matching the storage schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[serde(rename = "idade")]
    pub age: Option<i64>,
}
