// History store - bounded location history with persistence
use crate::application::persistence::{KeyValueStore, PersistenceError, StoreKey, load_or_default, save_typed};
use crate::domain::history::LocationHistory;
use crate::domain::location::PositionSample;
use std::sync::{Arc, Mutex, MutexGuard};

pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
    history: Mutex<LocationHistory>,
}

impl HistoryStore {
    /// Restores the persisted history. A missing or corrupt record starts empty.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let history: LocationHistory = load_or_default(store.as_ref(), StoreKey::LocationHistory);
        tracing::debug!("Loaded {} history entries", history.len());

        Self {
            store,
            history: Mutex::new(history),
        }
    }

    /// Inserts newest-first and persists. The in-memory insert stands even if saving fails.
    ///
    /// The save runs under the guard so concurrent records persist in insertion order.
    pub fn record(&self, sample: PositionSample) -> Result<(), PersistenceError> {
        let mut history = self.lock();
        history.record(sample);
        save_typed(self.store.as_ref(), StoreKey::LocationHistory, &*history)
    }

    /// Snapshot for rendering, newest first.
    pub fn entries(&self) -> Vec<PositionSample> {
        self.lock().to_vec()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, LocationHistory> {
        self.history.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::SlowFirstSave;
    use crate::infrastructure::memory_store::MemoryStore;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn sample(minute: u32) -> PositionSample {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 9, minute, 0).unwrap();
        PositionSample::new(1.0, 2.0, 5.0, t).unwrap()
    }

    #[test]
    fn test_record_persists_every_insert() {
        let store = Arc::new(MemoryStore::new());
        let history = HistoryStore::load(store.clone());

        history.record(sample(1)).unwrap();
        history.record(sample(2)).unwrap();

        let saved = store.load(StoreKey::LocationHistory).unwrap().unwrap();
        let saved = saved.as_array().unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0]["timestamp"], "2024-01-01T09:02:00Z");
    }

    #[test]
    fn test_reload_restores_timestamps() {
        let store = Arc::new(MemoryStore::new());
        let first = HistoryStore::load(store.clone());
        for minute in 1..=12 {
            first.record(sample(minute)).unwrap();
        }

        let reloaded = HistoryStore::load(store);
        let entries = reloaded.entries();
        assert_eq!(entries.len(), 10);
        assert_eq!(entries[0].captured_at(), sample(12).captured_at());
        assert_eq!(entries[9].captured_at(), sample(3).captured_at());
    }

    #[test]
    fn test_corrupt_store_loads_empty() {
        let store = Arc::new(MemoryStore::new());
        store
            .save(StoreKey::LocationHistory, &json!([{"latitude": "north"}]))
            .unwrap();

        let history = HistoryStore::load(store);
        assert_eq!(history.len(), 0);
    }

    #[test]
    fn test_concurrent_records_persist_in_order() {
        let store = Arc::new(SlowFirstSave::default());
        let history = HistoryStore::load(store.clone());

        std::thread::scope(|s| {
            s.spawn(|| history.record(sample(1)).unwrap());
            std::thread::sleep(SlowFirstSave::STALL / 4);
            s.spawn(|| history.record(sample(2)).unwrap());
        });

        let reloaded = HistoryStore::load(store);
        assert_eq!(history.len(), 2);
        assert_eq!(reloaded.entries(), history.entries());
        assert_eq!(reloaded.entries()[0].captured_at(), sample(2).captured_at());
    }

    #[test]
    fn test_failed_save_keeps_sample_in_memory() {
        let store = Arc::new(MemoryStore::failing_saves());
        let history = HistoryStore::load(store);

        assert!(history.record(sample(1)).is_err());
        assert_eq!(history.len(), 1);
    }
}
