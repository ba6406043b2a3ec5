use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{SlotStorage, StorageError};

const SLOT_EXTENSION: &str = "json";

/// One `<slot>.json` file per collection inside a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Use `dir` for slot files, creating it if needed
    pub fn new(dir: &Path) -> Result<Self, StorageError> {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| StorageError::DirectoryError(e.to_string()))?;
        }
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", key, SLOT_EXTENSION))
    }
}

impl SlotStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.slot_path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::IoError {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        // Write beside the slot and rename so a crash never leaves half a file
        let path = self.slot_path(key);
        let tmp = path.with_extension(format!("{}.tmp", SLOT_EXTENSION));
        let io_err = |source| StorageError::IoError {
            key: key.to_string(),
            source,
        };
        fs::write(&tmp, value).map_err(io_err)?;
        fs::rename(&tmp, &path).map_err(io_err)?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| StorageError::IoError {
            key: String::new(),
            source,
        })?;
        let mut keys: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == SLOT_EXTENSION))
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().to_string()))
            .collect();
        keys.sort();
        Ok(keys)
    }
}
