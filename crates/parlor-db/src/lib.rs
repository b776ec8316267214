pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;

use std::path::Path;

use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

use crate::pool::{ConnectionPool, PooledConnection};

/// Default pool capacity; mirrors the connection limit the desktop shell
/// always ran with.
pub const DEFAULT_POOL_SIZE: usize = 5;

/// Handle to the user registry store.
///
/// All access goes through a fixed-capacity connection pool; every
/// operation holds exactly one connection for its duration and releases it
/// on every exit path.
pub struct Database {
    pool: ConnectionPool,
}

impl Database {
    pub fn open(path: &Path, capacity: usize) -> Result<Self> {
        let pool = ConnectionPool::open(capacity, || {
            let conn = Connection::open(path)?;
            configure(&conn)?;
            Ok(conn)
        })?;

        pool.with_conn(migrations::run)?;

        info!(
            "Database opened at {} ({} pooled connections)",
            path.display(),
            capacity
        );
        Ok(Self { pool })
    }

    /// Single-connection in-memory database, for tests.
    pub fn open_in_memory() -> Result<Self> {
        let pool = ConnectionPool::open(1, || {
            let conn = Connection::open_in_memory()?;
            configure(&conn)?;
            Ok(conn)
        })?;
        pool.with_conn(migrations::run)?;
        Ok(Self { pool })
    }

    /// Acquire a connection and run `f` on it. The connection returns to
    /// the pool when the call completes, whether `f` succeeded or not.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        self.pool.with_conn(f)
    }

    /// Acquire a connection guard directly. Blocks while the pool is
    /// exhausted.
    pub fn acquire(&self) -> Result<PooledConnection> {
        self.pool.acquire()
    }

    /// Number of currently idle connections.
    pub fn idle_connections(&self) -> usize {
        self.pool.idle()
    }
}

fn configure(conn: &Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    // WAL mode for concurrent reads
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(())
}
