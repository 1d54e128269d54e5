use async_trait::async_trait;
use reqwest::Client;
use tally_types::EventBatch;
use url::Url;

use crate::config::BatcherConfig;
use crate::error::{ConfigurationError, DeliveryError, Result};
use crate::transport::Transport;

/// HTTP transport posting batches as JSON to the destination
///
/// Every batch becomes one `POST <destination><events_path>` request with a
/// `{"events": [...]}` body. Any 2xx response counts as delivered.
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
}

impl HttpTransport {
    /// Create a transport for the destination described by `config`
    pub fn new(config: &BatcherConfig) -> Result<Self> {
        let endpoint = config.endpoint()?;
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(ConfigurationError::Client)?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Map a response to delivered / rejected
    async fn handle_response(&self, response: reqwest::Response) -> std::result::Result<(), DeliveryError> {
        let status = response.status();

        if status.is_success() {
            tracing::debug!("Event batch accepted: {}", status);
            Ok(())
        } else {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read response body".to_string());

            Err(DeliveryError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, batch: &EventBatch) -> std::result::Result<(), DeliveryError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(batch)
            .send()
            .await?;

        self.handle_response(response).await
    }
}
