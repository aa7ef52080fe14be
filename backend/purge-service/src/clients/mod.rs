/// Capability handles for the external providers a purge run talks to
///
/// The services only see these traits, so the AWS and HTTP implementations can
/// be swapped for fakes in tests. Every method performs exactly one remote
/// interaction and classifies failures as [`ProviderError`].
use crate::config::StorageConfig;
use crate::error::ProviderError;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use secrecy::ExposeSecret;

pub mod cloudfront;
pub mod http_probe;
pub mod s3;

pub use cloudfront::CloudFrontClient;
pub use http_probe::HttpEdgeProbe;
pub use s3::S3StoreClient;

/// What the object store reported for a delete-by-key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStatus {
    /// The key existed and is gone now
    Removed,
    /// The key did not exist
    NotFound,
}

/// Object store delete capability
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    /// Check that the bucket is reachable with the configured credentials
    async fn verify(&self, bucket: &str) -> Result<(), ProviderError>;

    /// Delete one key; deleting an absent key is not an error
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<DeleteStatus, ProviderError>;
}

/// Accepted invalidation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationTicket {
    pub id: String,
    pub status: String,
}

/// CDN management capability
#[async_trait]
pub trait CdnClient: Send + Sync {
    /// Public domain name serving the distribution
    async fn distribution_domain(&self, distribution_id: &str) -> Result<String, ProviderError>;

    /// Request eviction of `paths` (normalized, leading slash)
    async fn create_invalidation(
        &self,
        distribution_id: &str,
        paths: &[String],
        caller_reference: &str,
    ) -> Result<InvalidationTicket, ProviderError>;
}

/// Read-only HTTP fetch capability
#[async_trait]
pub trait EdgeProbe: Send + Sync {
    /// Fetch `url` and return the response status code
    async fn fetch_status(&self, url: &str) -> Result<u16, ProviderError>;
}

/// Shared AWS SDK configuration for the S3 and CloudFront clients
pub async fn load_sdk_config(storage: &StorageConfig) -> aws_config::SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(aws_config::Region::new(storage.region.clone()));

    if let Some(creds) = &storage.credentials {
        loader = loader.credentials_provider(aws_sdk_s3::config::Credentials::new(
            creds.access_key_id.clone(),
            creds.secret_access_key.expose_secret().to_string(),
            None,
            None,
            "appsettings",
        ));
    }

    loader.load().await
}

/// Map an AWS SDK error onto the provider taxonomy.
///
/// Error codes take precedence; the HTTP status decides when the code is unknown.
pub(crate) fn classify_sdk_error<E>(err: &SdkError<E, HttpResponse>) -> ProviderError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let message = DisplayErrorContext(err).to_string();
    match err {
        SdkError::TimeoutError(_) => ProviderError::Timeout(message),
        SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            ProviderError::Transient(message)
        }
        SdkError::ServiceError(service_err) => {
            let code = service_err.err().code().unwrap_or_default();
            ProviderError::from_code(code, message.clone()).unwrap_or_else(|| {
                ProviderError::from_status(service_err.raw().status().as_u16(), message)
            })
        }
        _ => ProviderError::Other(message),
    }
}
