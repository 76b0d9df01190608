//! Durable key-value backends.
//!
//! The collection store only ever needs `get` and `set` on a single key, so the
//! seam is the small [`KeyValueBackend`] trait. [`SqliteBackend`] is the on-disk
//! implementation; [`MemoryBackend`] keeps everything in process.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

/// Failure reported by a backend. Never partially applied.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("backend lock poisoned")]
    Poisoned,
    #[error("write rejected: {0}")]
    Rejected(String),
}

/// A synchronous key-value store holding raw bytes.
pub trait KeyValueBackend: Send + Sync {
    /// Read the value stored under `key`, or `None` if it was never written.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Replace the value stored under `key`.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;
}
