// Location domain model
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// One geolocation fix. Only constructed through [`PositionSample::new`], deserialization included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredSample")]
pub struct PositionSample {
    latitude: f64,
    longitude: f64,
    #[serde(rename = "accuracy")]
    accuracy_meters: f64,
    #[serde(rename = "timestamp")]
    captured_at: DateTime<Utc>,
}

impl PositionSample {
    pub fn new(
        latitude: f64,
        longitude: f64,
        accuracy_meters: f64,
        captured_at: DateTime<Utc>,
    ) -> Result<Self, LocationError> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude)
            && accuracy_meters.is_finite()
            && accuracy_meters >= 0.0;

        if !valid {
            return Err(LocationError::PositionUnavailable);
        }

        Ok(Self {
            latitude,
            longitude,
            accuracy_meters,
            captured_at,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn accuracy_meters(&self) -> f64 {
        self.accuracy_meters
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// "Lat: 51.500000 Lon: -0.120000 (±12m)"
    pub fn display_coordinates(&self) -> String {
        format!(
            "Lat: {:.6} Lon: {:.6} (±{}m)",
            self.latitude,
            self.longitude,
            self.accuracy_meters.round()
        )
    }
}

#[derive(Deserialize)]
struct StoredSample {
    latitude: f64,
    longitude: f64,
    accuracy: f64,
    timestamp: DateTime<Utc>,
}

impl TryFrom<StoredSample> for PositionSample {
    type Error = LocationError;

    fn try_from(stored: StoredSample) -> Result<Self, Self::Error> {
        PositionSample::new(stored.latitude, stored.longitude, stored.accuracy, stored.timestamp)
    }
}

/// Options for a single position query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Maximum age of a cached device fix that may be returned. Zero means never reuse one.
    pub max_cache_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_millis(10_000),
            max_cache_age: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    PositionUnavailable,
    #[error("location request timed out")]
    Timeout,
    #[error("unknown location error")]
    Unknown,
}

impl LocationError {
    /// Message shown on the error banner.
    pub fn user_message(&self) -> &'static str {
        match self {
            LocationError::PermissionDenied => {
                "Location permission denied. Please enable location services."
            }
            LocationError::PositionUnavailable => "Location information is unavailable.",
            LocationError::Timeout => "Location request timed out.",
            LocationError::Unknown => "An unknown error occurred.",
        }
    }
}

/// Short human-readable address for a coordinate pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressSummary {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl AddressSummary {
    /// Keeps the first three comma-separated components of a full display name.
    pub fn from_display_name(display_name: &str, latitude: f64, longitude: f64) -> Self {
        let address = display_name
            .split(',')
            .take(3)
            .collect::<Vec<_>>()
            .join(",");

        Self {
            address,
            latitude,
            longitude,
        }
    }

    pub fn share_message(&self) -> String {
        format!(
            "My current location is: {} ({:.6}, {:.6})",
            self.address, self.latitude, self.longitude
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sample_rejects_out_of_range() {
        let t = Utc.timestamp_opt(0, 0).unwrap();
        assert!(PositionSample::new(91.0, 0.0, 5.0, t).is_err());
        assert!(PositionSample::new(0.0, 181.0, 5.0, t).is_err());
        assert!(PositionSample::new(0.0, 0.0, -1.0, t).is_err());
        assert!(PositionSample::new(f64::NAN, 0.0, 1.0, t).is_err());
        assert!(PositionSample::new(-33.86, 151.21, 0.0, t).is_ok());
    }

    #[test]
    fn test_sample_json_shape() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let sample = PositionSample::new(1.0, 2.0, 5.0, t).unwrap();
        let json = serde_json::to_value(&sample).unwrap();

        assert_eq!(json["latitude"], 1.0);
        assert_eq!(json["accuracy"], 5.0);
        assert_eq!(json["timestamp"], "2024-03-01T12:30:00Z");

        let back: PositionSample = serde_json::from_value(json).unwrap();
        assert_eq!(back.captured_at(), t);
    }

    #[test]
    fn test_deserialize_rejects_out_of_range() {
        let stored = serde_json::json!({
            "latitude": 999.0,
            "longitude": 2.0,
            "accuracy": 5.0,
            "timestamp": "2024-03-01T12:30:00Z"
        });
        assert!(serde_json::from_value::<PositionSample>(stored).is_err());

        let negative_accuracy = serde_json::json!({
            "latitude": 1.0,
            "longitude": 2.0,
            "accuracy": -3.0,
            "timestamp": "2024-03-01T12:30:00Z"
        });
        assert!(serde_json::from_value::<PositionSample>(negative_accuracy).is_err());
    }

    #[test]
    fn test_display_coordinates() {
        let t = Utc.timestamp_opt(0, 0).unwrap();
        let sample = PositionSample::new(51.5, -0.12, 12.4, t).unwrap();
        assert_eq!(sample.display_coordinates(), "Lat: 51.500000 Lon: -0.120000 (±12m)");
    }

    #[test]
    fn test_address_keeps_first_three_components() {
        let summary = AddressSummary::from_display_name(
            "10 Downing Street, Westminster, London, Greater London, England, United Kingdom",
            51.5034,
            -0.1276,
        );
        assert_eq!(summary.address, "10 Downing Street, Westminster, London");
        assert_eq!(
            summary.share_message(),
            "My current location is: 10 Downing Street, Westminster, London (51.503400, -0.127600)"
        );

        let short = AddressSummary::from_display_name("Nowhere", 0.0, 0.0);
        assert_eq!(short.address, "Nowhere");
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            LocationError::PermissionDenied.user_message(),
            "Location permission denied. Please enable location services."
        );
        assert_eq!(LocationError::Timeout.user_message(), "Location request timed out.");
    }

    #[test]
    fn test_default_options_never_reuse_cached_fix() {
        let options = PositionOptions::default();
        assert!(options.high_accuracy);
        assert_eq!(options.timeout, Duration::from_secs(10));
        assert_eq!(options.max_cache_age, Duration::ZERO);
    }
}
