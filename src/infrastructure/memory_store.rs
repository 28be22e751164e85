// In-memory key-value store
use crate::application::persistence::{KeyValueStore, PersistenceError, StoreKey};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<StoreKey, Value>>,
    fail_saves: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every save returns an I/O error; loads still work.
    #[cfg(test)]
    pub fn failing_saves() -> Self {
        Self {
            records: Mutex::default(),
            fail_saves: true,
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: StoreKey) -> Result<Option<Value>, PersistenceError> {
        let records = self.records.lock().unwrap_or_else(|p| p.into_inner());
        Ok(records.get(&key).cloned())
    }

    fn save(&self, key: StoreKey, value: &Value) -> Result<(), PersistenceError> {
        if self.fail_saves {
            return Err(PersistenceError::Io {
                key: key.as_str(),
                source: std::io::Error::other("storage full"),
            });
        }

        let mut records = self.records.lock().unwrap_or_else(|p| p.into_inner());
        records.insert(key, value.clone());
        Ok(())
    }
}
