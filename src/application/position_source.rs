// Position source trait for one-shot location queries
use crate::domain::location::{LocationError, PositionOptions, PositionSample};
use async_trait::async_trait;

#[async_trait]
pub trait PositionSource: Send + Sync {
    /// Ask the device for a single fix. Fails fast and never retries.
    async fn fetch_once(&self, options: &PositionOptions) -> Result<PositionSample, LocationError>;
}
