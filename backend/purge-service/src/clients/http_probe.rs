/// Edge existence probe over plain HTTP
use super::EdgeProbe;
use crate::error::ProviderError;
use async_trait::async_trait;
use std::time::Duration;

#[derive(Clone)]
pub struct HttpEdgeProbe {
    client: reqwest::Client,
}

impl HttpEdgeProbe {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Probe with its own connect/request deadline
    pub fn with_timeout(timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl EdgeProbe for HttpEdgeProbe {
    async fn fetch_status(&self, url: &str) -> Result<u16, ProviderError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(e.to_string())
            } else {
                ProviderError::Transient(e.to_string())
            }
        })?;

        Ok(response.status().as_u16())
    }
}
