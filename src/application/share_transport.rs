// Native share transport trait
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareRequest {
    pub title: String,
    pub text: String,
    pub url: String,
}

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("share cancelled")]
    Cancelled,
    #[error("sharing is not supported")]
    Unsupported,
    #[error("share failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait ShareTransport: Send + Sync {
    fn is_available(&self) -> bool {
        true
    }

    async fn share(&self, request: &ShareRequest) -> Result<(), ShareError>;
}
