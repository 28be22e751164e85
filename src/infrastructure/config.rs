use crate::application::tracking_controller::TrackerOptions;
use crate::domain::location::PositionOptions;
use crate::domain::settings::DEFAULT_INTERVAL_MS;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_PATH: &str = "config/safetrack.toml";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub tracking: TrackingSettings,
    pub position: PositionSettings,
    pub geocoder: GeocoderSettings,
    pub share: ShareSettings,
    pub assets: AssetSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    File,
    Memory,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    pub data_dir: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            data_dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct TrackingSettings {
    pub high_accuracy: bool,
    pub timeout_ms: u64,
    pub maximum_age_ms: u64,
    /// Used until settings are saved.
    pub default_interval_ms: u64,
    pub discard_stale_samples: bool,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout_ms: 10_000,
            maximum_age_ms: 0,
            default_interval_ms: DEFAULT_INTERVAL_MS,
            discard_stale_samples: false,
        }
    }
}

impl TrackingSettings {
    pub fn tracker_options(&self) -> TrackerOptions {
        TrackerOptions {
            position: PositionOptions {
                high_accuracy: self.high_accuracy,
                timeout: Duration::from_millis(self.timeout_ms),
                max_cache_age: Duration::from_millis(self.maximum_age_ms),
            },
            interval: Duration::from_millis(self.default_interval_ms),
            discard_stale_samples: self.discard_stale_samples,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PositionProvider {
    Http,
    Fixed,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PositionSettings {
    pub provider: PositionProvider,
    /// Device or bridge endpoint for the `http` provider.
    pub url: String,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
}

impl Default for PositionSettings {
    fn default() -> Self {
        Self {
            provider: PositionProvider::Http,
            url: "http://127.0.0.1:8947/position".to_string(),
            latitude: 0.0,
            longitude: 0.0,
            accuracy: 0.0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct GeocoderSettings {
    pub enabled: bool,
    pub base_url: String,
    pub user_agent: String,
}

impl Default for GeocoderSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: concat!("safetrack/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct ShareSettings {
    /// Native sharing is unavailable when unset.
    pub webhook_url: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AssetSettings {
    pub root: PathBuf,
    pub cache_dir: PathBuf,
    pub cache_name: String,
    pub urls: Vec<String>,
}

impl Default for AssetSettings {
    fn default() -> Self {
        let urls = [
            "/",
            "/index.html",
            "/styles/style.css",
            "/scripts/app.js",
            "/scripts/location.js",
            "/scripts/notifications.js",
            "/icons/icon-72x72.png",
            "/icons/icon-192x192.png",
            "/icons/icon-512x512.png",
        ];

        Self {
            root: PathBuf::from("public"),
            cache_dir: PathBuf::from("data/asset-cache"),
            cache_name: "safetrack-v1".to_string(),
            urls: urls.iter().map(|u| u.to_string()).collect(),
        }
    }
}

/// Reads `path` (optional) under `SAFETRACK__SECTION__KEY` environment overrides.
pub fn load_app_config(path: &Path) -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix("SAFETRACK")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()
        .with_context(|| format!("Failed to read configuration from {}", path.display()))?;

    Ok(settings.try_deserialize()?)
}

pub fn default_config_toml() -> anyhow::Result<String> {
    Ok(toml::to_string_pretty(&AppConfig::default())?)
}

/// Writes the default configuration to `path` unless a file is already there.
pub fn write_default_config(path: &Path) -> anyhow::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, default_config_toml()?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}
