//! Fixed-capacity connection pool.
//!
//! Idle connections sit in a bounded channel: receiving acquires one,
//! dropping the guard sends it back. Release is tied to `Drop`, so a
//! connection finds its way home on success, error, and panic paths alike.

use std::ops::Deref;

use anyhow::{Result, anyhow};
use crossbeam_channel::{Receiver, Sender, bounded};
use rusqlite::Connection;

pub struct ConnectionPool {
    idle: Receiver<Connection>,
    returns: Sender<Connection>,
}

impl ConnectionPool {
    /// Build a pool of `capacity` connections produced by `make`.
    pub fn open<F>(capacity: usize, make: F) -> Result<Self>
    where
        F: Fn() -> Result<Connection>,
    {
        if capacity == 0 {
            return Err(anyhow!("connection pool capacity must be at least 1"));
        }

        let (returns, idle) = bounded(capacity);
        for _ in 0..capacity {
            returns
                .send(make()?)
                .map_err(|_| anyhow!("connection pool channel closed during setup"))?;
        }

        Ok(Self { idle, returns })
    }

    /// Take a connection out of the pool, blocking while all are in use.
    pub fn acquire(&self) -> Result<PooledConnection> {
        let conn = self
            .idle
            .recv()
            .map_err(|_| anyhow!("connection pool is closed"))?;
        Ok(PooledConnection {
            conn: Some(conn),
            returns: self.returns.clone(),
        })
    }

    /// Acquire a connection, run `f`, release.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.acquire()?;
        f(&conn)
    }

    pub fn idle(&self) -> usize {
        self.idle.len()
    }
}

/// Scoped handle to a pooled connection; returns it on `Drop`.
pub struct PooledConnection {
    conn: Option<Connection>,
    returns: Sender<Connection>,
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn
            .as_ref()
            .expect("connection present until dropped")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            // Fails only when the pool itself is gone; the connection just
            // closes in that case.
            let _ = self.returns.send(conn);
        }
    }
}
