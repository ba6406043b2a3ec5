use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use super::{SlotStorage, StorageError};

/// Session-only storage. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: RefCell<BTreeMap<String, String>>,
    fail_writes: Cell<bool>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, as a full or revoked quota would
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Seed a slot directly, bypassing any write failure flag
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.slots
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }
}

impl SlotStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.slots.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes.get() {
            return Err(StorageError::Unavailable(format!(
                "quota exceeded while writing `{}`",
                key
            )));
        }
        self.insert_raw(key, value);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.slots.borrow().keys().cloned().collect())
    }
}
