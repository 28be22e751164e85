// Reverse geocoding trait
use crate::domain::location::AddressSummary;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoding request failed: {0}")]
    Request(String),
    #[error("geocoder returned status {0}")]
    Status(u16),
    #[error("could not parse geocoder response: {0}")]
    Parse(String),
    #[error("no address found")]
    NoAddress,
    #[error("geocoding disabled")]
    Disabled,
}

#[async_trait]
pub trait GeocodeResolver: Send + Sync {
    async fn resolve(&self, latitude: f64, longitude: f64) -> Result<AddressSummary, GeocodeError>;
}

/// Resolver used when geocoding is turned off in configuration.
pub struct DisabledGeocoder;

#[async_trait]
impl GeocodeResolver for DisabledGeocoder {
    async fn resolve(&self, _latitude: f64, _longitude: f64) -> Result<AddressSummary, GeocodeError> {
        Err(GeocodeError::Disabled)
    }
}
