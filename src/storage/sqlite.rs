//! SQLite-backed key-value storage.
//!
//! Every `set` upserts `kv_entries` and appends a `write_log` row inside one
//! transaction, so a reader never sees the entry without its audit row.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

use super::{KeyValueBackend, StorageError};

pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Wrap an already opened and migrated connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Open (or create) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Ok(Self::new(crate::db::open_database(path)?))
    }

    /// Fully migrated in-memory database.
    pub fn open_in_memory() -> anyhow::Result<Self> {
        Ok(Self::new(crate::db::open_memory_database()?))
    }

    /// Remove the entry under `key`. Returns `true` if a row was deleted.
    pub fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let conn = self.conn.lock().map_err(|_| StorageError::Poisoned)?;
        let rows = conn.execute("DELETE FROM kv_entries WHERE key = ?1", params![key])?;
        Ok(rows > 0)
    }

    /// Run `f` against the underlying connection (health checks, reporting).
    pub fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> anyhow::Result<T>,
    ) -> anyhow::Result<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
        f(&conn)
    }
}

impl KeyValueBackend for SqliteBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let conn = self.conn.lock().map_err(|_| StorageError::Poisoned)?;
        let value = conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1",
                params![key],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let mut conn = self.conn.lock().map_err(|_| StorageError::Poisoned)?;
        let now = chrono::Utc::now().to_rfc3339();

        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO kv_entries (key, value, updated_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        tx.execute(
            "INSERT INTO write_log (key, bytes, created_at) VALUES (?1, ?2, ?3)",
            params![key, value.len() as i64, now],
        )?;
        tx.commit()?;

        tracing::debug!(key, bytes = value.len(), "kv entry written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_missing_key_is_none() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        assert!(backend.get("cityCollection.v2").unwrap().is_none());
    }

    #[test]
    fn set_then_get_returns_latest_value() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        backend.set("k", b"first").unwrap();
        backend.set("k", b"second").unwrap();
        assert_eq!(backend.get("k").unwrap().as_deref(), Some(&b"second"[..]));
    }

    #[test]
    fn set_writes_audit_row() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        backend.set("k", b"[]").unwrap();
        backend.set("k", b"[1]").unwrap();

        let (count, bytes): (i64, i64) = backend
            .with_connection(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*), MAX(bytes) FROM write_log WHERE key = 'k'",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?)
            })
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(bytes, 3);
    }

    #[test]
    fn delete_removes_entry() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        backend.set("k", b"x").unwrap();
        assert!(backend.delete("k").unwrap());
        assert!(!backend.delete("k").unwrap());
        assert!(backend.get("k").unwrap().is_none());
    }
}
