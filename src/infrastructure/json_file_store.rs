// File-backed key-value store: one JSON document per key
use crate::application::persistence::{KeyValueStore, PersistenceError, StoreKey};
use serde_json::Value;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Saves are synchronous `std::fs` writes of a few kilobytes, issued from the
/// caller's task while the owning store holds its lock.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Creates the data directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: StoreKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }
}

impl KeyValueStore for JsonFileStore {
    fn load(&self, key: StoreKey) -> Result<Option<Value>, PersistenceError> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(PersistenceError::Io {
                    key: key.as_str(),
                    source,
                });
            }
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| PersistenceError::Corrupt {
                key: key.as_str(),
                reason: e.to_string(),
            })
    }

    fn save(&self, key: StoreKey, value: &Value) -> Result<(), PersistenceError> {
        let bytes = serde_json::to_vec_pretty(value).map_err(|e| PersistenceError::Encode {
            key: key.as_str(),
            reason: e.to_string(),
        })?;

        // Unique temp file per save, renamed over the record; a crash never leaves half a file.
        let path = self.path_for(key);
        let io_err = |source| PersistenceError::Io {
            key: key.as_str(),
            source,
        };
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        tmp.write_all(&bytes).map_err(io_err)?;
        tmp.persist(&path).map_err(|e| io_err(e.error))?;

        tracing::trace!("Saved {}", path.display());
        Ok(())
    }
}
