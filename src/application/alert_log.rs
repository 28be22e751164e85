// Alert log - capped, persisted record of dispatched alerts
use crate::application::persistence::{KeyValueStore, PersistenceError, StoreKey, load_or_default, save_typed};
use crate::domain::alert::{AlertLog as Records, AlertRecord};
use std::sync::{Arc, Mutex};

pub struct AlertLog {
    store: Arc<dyn KeyValueStore>,
    records: Mutex<Records>,
}

impl AlertLog {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let records: Records = load_or_default(store.as_ref(), StoreKey::EmergencyLogs);
        Self {
            store,
            records: Mutex::new(records),
        }
    }

    pub fn append(&self, record: AlertRecord) -> Result<(), PersistenceError> {
        // Held across the save; the persisted log never trails a newer in-memory one.
        let mut records = self.records.lock().unwrap_or_else(|p| p.into_inner());
        records.append(record);
        save_typed(self.store.as_ref(), StoreKey::EmergencyLogs, &*records)
    }

    /// Oldest first.
    pub fn records(&self) -> Vec<AlertRecord> {
        let records = self.records.lock().unwrap_or_else(|p| p.into_inner());
        records.records().to_vec()
    }
}
