// Webhook share transport
use crate::application::share_transport::{ShareError, ShareRequest, ShareTransport};
use async_trait::async_trait;

/// Posts share requests as JSON to a webhook URL.
#[derive(Debug, Clone)]
pub struct WebhookShareTransport {
    url: String,
    client: reqwest::Client,
}

impl WebhookShareTransport {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ShareTransport for WebhookShareTransport {
    async fn share(&self, request: &ShareRequest) -> Result<(), ShareError> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| ShareError::Failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ShareError::Failed(format!(
                "webhook answered {}",
                response.status()
            )));
        }

        tracing::debug!("Share delivered to webhook");
        Ok(())
    }
}
