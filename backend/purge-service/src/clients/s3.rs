/// S3 object store capability
use super::{classify_sdk_error, DeleteStatus, ObjectStoreClient};
use crate::error::ProviderError;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct S3StoreClient {
    client: Client,
}

impl S3StoreClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_sdk_config(sdk_config: &aws_config::SdkConfig) -> Self {
        Self::new(Client::new(sdk_config))
    }
}

#[async_trait]
impl ObjectStoreClient for S3StoreClient {
    #[instrument(skip(self))]
    async fn verify(&self, bucket: &str) -> Result<(), ProviderError> {
        self.client
            .head_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|err| classify_sdk_error(&err))?;

        Ok(())
    }

    /// S3 answers `DeleteObject` with 204 whether or not the key existed, so a
    /// `HeadObject` probe runs first to tell the two apart. The delete itself is
    /// always sent.
    #[instrument(skip(self), fields(backend = "s3"))]
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<DeleteStatus, ProviderError> {
        let existed = match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(_) => true,
            Err(err) => match classify_sdk_error(&err) {
                ProviderError::NotFound(_) => false,
                other => {
                    debug!(error = %other, "Existence probe failed, deleting anyway");
                    true
                }
            },
        };

        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| classify_sdk_error(&err))?;

        Ok(if existed {
            DeleteStatus::Removed
        } else {
            DeleteStatus::NotFound
        })
    }
}
