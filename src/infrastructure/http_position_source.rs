// Position sources backed by a device endpoint or a fixed fix
use crate::application::position_source::PositionSource;
use crate::domain::location::{LocationError, PositionOptions, PositionSample};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;

/// Polls a device or bridge that answers `GET` with a single JSON fix.
#[derive(Debug, Clone)]
pub struct HttpPositionSource {
    url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct DeviceFix {
    latitude: f64,
    longitude: f64,
    accuracy: f64,
    /// Epoch milliseconds, as reported by the device.
    #[serde(default)]
    timestamp: Option<i64>,
}

impl HttpPositionSource {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl PositionSource for HttpPositionSource {
    async fn fetch_once(&self, options: &PositionOptions) -> Result<PositionSample, LocationError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("enableHighAccuracy", options.high_accuracy.to_string()),
                ("timeout", options.timeout.as_millis().to_string()),
                ("maximumAge", options.max_cache_age.as_millis().to_string()),
            ])
            .timeout(options.timeout)
            .send()
            .await
            .map_err(|e| classify_transport_error(&e))?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::debug!("Position endpoint answered {}", status);
            return Err(classify_status(status));
        }

        let fix = response.json::<DeviceFix>().await.map_err(|e| {
            tracing::warn!("Unreadable position response: {}", e);
            LocationError::Unknown
        })?;

        let captured_at = fix
            .timestamp
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .unwrap_or_else(Utc::now);

        PositionSample::new(fix.latitude, fix.longitude, fix.accuracy, captured_at)
    }
}

fn classify_status(status: StatusCode) -> LocationError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LocationError::PermissionDenied,
        StatusCode::NO_CONTENT
        | StatusCode::NOT_FOUND
        | StatusCode::GONE
        | StatusCode::SERVICE_UNAVAILABLE => LocationError::PositionUnavailable,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => LocationError::Timeout,
        _ => LocationError::Unknown,
    }
}

fn classify_transport_error(error: &reqwest::Error) -> LocationError {
    if error.is_timeout() {
        LocationError::Timeout
    } else if error.is_connect() {
        LocationError::PositionUnavailable
    } else {
        tracing::warn!("Position request failed: {}", error);
        LocationError::Unknown
    }
}

/// Always reports the same configured fix, stamped with the current time.
#[derive(Debug, Clone, Copy)]
pub struct FixedPositionSource {
    latitude: f64,
    longitude: f64,
    accuracy: f64,
}

impl FixedPositionSource {
    pub fn new(latitude: f64, longitude: f64, accuracy: f64) -> Result<Self, LocationError> {
        PositionSample::new(latitude, longitude, accuracy, Utc::now())?;
        Ok(Self {
            latitude,
            longitude,
            accuracy,
        })
    }
}

#[async_trait]
impl PositionSource for FixedPositionSource {
    async fn fetch_once(&self, _options: &PositionOptions) -> Result<PositionSample, LocationError> {
        PositionSample::new(self.latitude, self.longitude, self.accuracy, Utc::now())
    }
}
