// Persistence port - durable key to JSON value storage
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Every record the app persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    LocationHistory,
    EmergencyContacts,
    TrackerSettings,
    EmergencyLogs,
}

impl StoreKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKey::LocationHistory => "locationHistory",
            StoreKey::EmergencyContacts => "emergencyContacts",
            StoreKey::TrackerSettings => "trackerSettings",
            StoreKey::EmergencyLogs => "emergencyLogs",
        }
    }
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage I/O error for {key}: {source}")]
    Io {
        key: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("stored {key} is corrupt: {reason}")]
    Corrupt { key: &'static str, reason: String },
    #[error("could not encode {key}: {reason}")]
    Encode { key: &'static str, reason: String },
}

pub trait KeyValueStore: Send + Sync {
    /// `Ok(None)` when nothing has been stored under `key`.
    fn load(&self, key: StoreKey) -> Result<Option<Value>, PersistenceError>;

    fn save(&self, key: StoreKey, value: &Value) -> Result<(), PersistenceError>;
}

/// Decodes a stored record, treating missing or undecodable data as `T::default()`.
pub fn load_or_default<T>(store: &dyn KeyValueStore, key: StoreKey) -> T
where
    T: DeserializeOwned + Default,
{
    let value = match store.load(key) {
        Ok(Some(value)) => value,
        Ok(None) => return T::default(),
        Err(e) => {
            tracing::warn!("Ignoring unreadable {}: {}", key.as_str(), e);
            return T::default();
        }
    };

    match serde_json::from_value(value) {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::warn!("Ignoring undecodable {}: {}", key.as_str(), e);
            T::default()
        }
    }
}

pub fn save_typed<T>(store: &dyn KeyValueStore, key: StoreKey, value: &T) -> Result<(), PersistenceError>
where
    T: Serialize,
{
    let encoded = serde_json::to_value(value).map_err(|e| PersistenceError::Encode {
        key: key.as_str(),
        reason: e.to_string(),
    })?;
    store.save(key, &encoded)
}
