/// Database row types — these map directly to SQLite rows.
/// Distinct from the parlor-types API models to keep the store layer
/// independent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub age: Option<i64>,
}
