/// CloudFront CDN management capability
use super::{classify_sdk_error, CdnClient, InvalidationTicket};
use crate::error::ProviderError;
use async_trait::async_trait;
use aws_sdk_cloudfront::types::{InvalidationBatch, Paths};
use aws_sdk_cloudfront::Client;
use tracing::instrument;

#[derive(Clone)]
pub struct CloudFrontClient {
    client: Client,
}

impl CloudFrontClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_sdk_config(sdk_config: &aws_config::SdkConfig) -> Self {
        Self::new(Client::new(sdk_config))
    }
}

#[async_trait]
impl CdnClient for CloudFrontClient {
    #[instrument(skip(self))]
    async fn distribution_domain(&self, distribution_id: &str) -> Result<String, ProviderError> {
        let output = self
            .client
            .get_distribution()
            .id(distribution_id)
            .send()
            .await
            .map_err(|err| classify_sdk_error(&err))?;

        output
            .distribution()
            .map(|distribution| distribution.domain_name().to_string())
            .filter(|domain| !domain.is_empty())
            .ok_or_else(|| {
                ProviderError::NotFound(format!("distribution {distribution_id} has no domain name"))
            })
    }

    #[instrument(skip(self), fields(provider = "cloudfront"))]
    async fn create_invalidation(
        &self,
        distribution_id: &str,
        paths: &[String],
        caller_reference: &str,
    ) -> Result<InvalidationTicket, ProviderError> {
        let paths = Paths::builder()
            .quantity(paths.len() as i32)
            .set_items(Some(paths.to_vec()))
            .build()
            .map_err(|e| ProviderError::Other(format!("invalid invalidation paths: {e}")))?;

        let batch = InvalidationBatch::builder()
            .paths(paths)
            .caller_reference(caller_reference)
            .build()
            .map_err(|e| ProviderError::Other(format!("invalid invalidation batch: {e}")))?;

        let output = self
            .client
            .create_invalidation()
            .distribution_id(distribution_id)
            .invalidation_batch(batch)
            .send()
            .await
            .map_err(|err| classify_sdk_error(&err))?;

        let invalidation = output
            .invalidation()
            .ok_or_else(|| ProviderError::Other("response carried no invalidation".to_string()))?;

        Ok(InvalidationTicket {
            id: invalidation.id().to_string(),
            status: invalidation.status().to_string(),
        })
    }
}
