//! Durable key/value slots backing the entity collections.
//!
//! Each collection is stored as one serialized JSON array under a stable
//! slot name ("tasks", "habits", ...). Backends only move strings around;
//! (de)serialization lives in the store.

mod file;
mod memory;
mod sqlite;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("I/O error on slot `{key}`: {source}")]
    IoError {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize collection: {0}")]
    SerializeError(#[from] serde_json::Error),
    #[error("Failed to create storage directory: {0}")]
    DirectoryError(String),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// A durable key/value slot store.
///
/// Writes replace the whole slot. Implementations are used from a single
/// thread and take `&self`, so stores can share one backend.
pub trait SlotStorage {
    /// Read a slot; `Ok(None)` when it has never been written.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the slot contents.
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Names of all slots written so far, sorted.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// Which backend the application persists to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Files,
    Memory,
}

/// Open the configured backend rooted at `data_path`.
///
/// For `Sqlite` the path is the database file, for `Files` it is the
/// directory holding one `<slot>.json` per collection. `Memory` ignores it.
pub fn open_storage(
    backend: StorageBackend,
    data_path: &Path,
) -> Result<Rc<dyn SlotStorage>, StorageError> {
    let storage: Rc<dyn SlotStorage> = match backend {
        StorageBackend::Sqlite => Rc::new(SqliteStorage::new(data_path)?),
        StorageBackend::Files => Rc::new(FileStorage::new(data_path)?),
        StorageBackend::Memory => Rc::new(MemoryStorage::new()),
    };
    tracing::debug!(?backend, path = %data_path.display(), "storage opened");
    Ok(storage)
}
