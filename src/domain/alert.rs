// Emergency alert domain model
use super::location::PositionSample;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of alert records kept.
pub const ALERT_LOG_CAPACITY: usize = 50;

pub const ALERT_TITLE: &str = "Emergency Alert";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Emergency,
}

/// What was sent, recorded at dispatch time. Records intent, not delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRecord {
    #[serde(rename = "coordinates")]
    pub sample: PositionSample,
    pub maps_url: String,
    pub message: String,
    #[serde(rename = "timestamp")]
    pub dispatched_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: AlertKind,
}

impl AlertRecord {
    pub fn emergency(sample: PositionSample, dispatched_at: DateTime<Utc>) -> Self {
        let maps_url = maps_url(&sample);
        let message = emergency_message(&maps_url);
        Self {
            sample,
            maps_url,
            message,
            dispatched_at,
            kind: AlertKind::Emergency,
        }
    }
}

/// Oldest-first log capped at [`ALERT_LOG_CAPACITY`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertLog {
    records: Vec<AlertRecord>,
}

impl AlertLog {
    pub fn append(&mut self, record: AlertRecord) {
        self.records.push(record);
        if self.records.len() > ALERT_LOG_CAPACITY {
            let excess = self.records.len() - ALERT_LOG_CAPACITY;
            self.records.drain(..excess);
        }
    }

    pub fn records(&self) -> &[AlertRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

pub fn maps_url(sample: &PositionSample) -> String {
    format!(
        "https://www.google.com/maps?q={},{}",
        sample.latitude(),
        sample.longitude()
    )
}

pub fn emergency_message(maps_url: &str) -> String {
    format!("🚨 EMERGENCY ALERT 🚨\nI need help!\nMy location: {}", maps_url)
}

/// `sms:` compose URI. With no recipients the client opens an empty compose window.
pub fn sms_uri(recipients: &[String], body: &str) -> String {
    format!("sms:{}?body={}", recipients.join(","), urlencoding::encode(body))
}
