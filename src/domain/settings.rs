// Tracker settings
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

pub const DEFAULT_INTERVAL_MS: u64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerSettings {
    #[serde(default = "default_auto_update")]
    pub auto_update: bool,
    #[serde(default = "default_interval_ms", deserialize_with = "interval_ms")]
    pub update_frequency: u64,
}

impl TrackerSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.update_frequency)
    }
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            auto_update: default_auto_update(),
            update_frequency: DEFAULT_INTERVAL_MS,
        }
    }
}

fn default_auto_update() -> bool {
    true
}

fn default_interval_ms() -> u64 {
    DEFAULT_INTERVAL_MS
}

// Older stores saved the raw form value, so the frequency may be a string.
fn interval_ms<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    let parsed = match Raw::deserialize(deserializer)? {
        Raw::Number(n) if n.is_finite() && n >= 1.0 => Some(n as u64),
        Raw::Number(_) => None,
        Raw::Text(s) => s.trim().parse::<u64>().ok().filter(|ms| *ms > 0),
    };

    Ok(parsed.unwrap_or(DEFAULT_INTERVAL_MS))
}
