// Settings store - persisted tracker settings
use crate::application::persistence::{KeyValueStore, PersistenceError, StoreKey, load_or_default, save_typed};
use crate::domain::settings::TrackerSettings;
use std::sync::Arc;

#[derive(Clone)]
pub struct SettingsStore {
    store: Arc<dyn KeyValueStore>,
}

impl SettingsStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Saved settings, or the defaults (auto-start, one minute) when none are stored.
    pub fn load(&self) -> TrackerSettings {
        load_or_default(self.store.as_ref(), StoreKey::TrackerSettings)
    }

    pub fn save(&self, settings: &TrackerSettings) -> Result<(), PersistenceError> {
        save_typed(self.store.as_ref(), StoreKey::TrackerSettings, settings)
    }
}
