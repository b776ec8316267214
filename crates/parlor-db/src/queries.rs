use anyhow::Result;
use rusqlite::params;

use crate::Database;
use crate::models::UserRow;

impl Database {
    /// Insert a registry entry and return its freshly assigned identity.
    pub fn insert_user(&self, name: &str, email: &str, age: Option<i64>) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO usuarios (nome, email, idade) VALUES (?1, ?2, ?3)",
                params![name, email, age],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// All registry rows in storage-native order.
    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, nome, email, idade FROM usuarios")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(UserRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                        age: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}
