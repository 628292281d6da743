use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

/// Key under which the explicit-disconnect intent is stored
pub const DISCONNECT_FLAG_KEY: &str = "twitter3_isDisconnected";

/// Client-local storage for the disconnect intent.
///
/// The flag is set only by an explicit disconnect and cleared only by an
/// explicit connect. It survives restarts.
pub trait SessionStore: Send + Sync {
    fn is_disconnected(&self) -> Result<bool>;

    fn set_disconnected(&self, disconnected: bool) -> Result<()>;
}

/// SQLite-backed session store
#[derive(Debug)]
pub struct SqliteSessionStore {
    conn: Mutex<Connection>,
}

impl SqliteSessionStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).with_context(|| format!("open db {}", path.display()))?;
        Self::with_connection(conn)
    }

    /// Store that lives as long as this value; used by tests and when no
    /// data directory is available.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory db")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init()?;
        Ok(store)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn init(&self) -> Result<()> {
        self.conn().execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }
}

impl SessionStore for SqliteSessionStore {
    fn is_disconnected(&self) -> Result<bool> {
        let value: Option<String> = self
            .conn()
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![DISCONNECT_FLAG_KEY],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.as_deref() == Some("true"))
    }

    fn set_disconnected(&self, disconnected: bool) -> Result<()> {
        let conn = self.conn();
        if disconnected {
            conn.execute(
                "INSERT INTO kv(key, value) VALUES (?1, 'true')
                 ON CONFLICT(key) DO UPDATE SET value=excluded.value",
                params![DISCONNECT_FLAG_KEY],
            )?;
        } else {
            conn.execute("DELETE FROM kv WHERE key = ?1", params![DISCONNECT_FLAG_KEY])?;
        }
        Ok(())
    }
}
