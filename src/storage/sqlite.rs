use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

use super::{SlotStorage, StorageError};

/// Slots kept as rows of a single SQLite table
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Open (or create) the database file and initialize the schema
    pub fn new(path: &Path) -> Result<Self, StorageError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StorageError::DirectoryError(e.to_string()))?;
            }
        }

        let conn = Connection::open(path)?;
        let storage = SqliteStorage { conn };
        storage.initialize_schema()?;
        Ok(storage)
    }

    /// In-memory database, gone when dropped
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let storage = SqliteStorage {
            conn: Connection::open_in_memory()?,
        };
        storage.initialize_schema()?;
        Ok(storage)
    }

    fn initialize_schema(&self) -> Result<(), StorageError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS slots (
                key             TEXT PRIMARY KEY,
                value           TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }
}

impl SlotStorage for SqliteStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM slots WHERE key = ?1",
                rusqlite::params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO slots (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            rusqlite::params![
                key,
                value,
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT key FROM slots ORDER BY key ASC")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_replaces_slot() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        storage.write("goals", "[]").unwrap();
        storage.write("goals", "[{\"id\":7}]").unwrap();
        assert_eq!(
            storage.read("goals").unwrap().as_deref(),
            Some("[{\"id\":7}]")
        );
        assert_eq!(storage.keys().unwrap(), vec!["goals"]);
    }

    #[test]
    fn reopening_file_keeps_slots() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("app.db");
        {
            let storage = SqliteStorage::new(&path).unwrap();
            storage.write("reminders", "[]").unwrap();
        }
        let storage = SqliteStorage::new(&path).unwrap();
        assert_eq!(storage.read("reminders").unwrap().as_deref(), Some("[]"));
        assert_eq!(storage.read("habits").unwrap(), None);
    }
}
