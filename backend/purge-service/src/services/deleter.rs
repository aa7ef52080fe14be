/// Object deletion - removes one store key and classifies what happened
use super::guarded;
use crate::clients::{DeleteStatus, ObjectStoreClient};
use crate::error::ProviderError;
use crate::models::{Operation, PurgeOutcome, PurgeStatus, PurgeTarget};
use resilience::ServiceConfig;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct ObjectDeleter {
    client: Arc<dyn ObjectStoreClient>,
    policy: ServiceConfig,
}

impl ObjectDeleter {
    pub fn new(client: Arc<dyn ObjectStoreClient>, policy: ServiceConfig) -> Self {
        Self { client, policy }
    }

    /// Delete the target's store key.
    ///
    /// Never fails: every provider error becomes a `Failed` outcome carrying the
    /// provider message. An absent key is `AlreadyAbsent`, not an error.
    pub async fn delete(&self, bucket: &str, target: &PurgeTarget) -> PurgeOutcome {
        let result = guarded(&self.policy, || {
            self.client.delete_object(bucket, &target.store_key)
        })
        .await;

        let outcome = |status| PurgeOutcome::new(target.clone(), Operation::Delete, status);
        match result {
            Ok(DeleteStatus::Removed) => {
                debug!(store_key = %target.store_key, "Object deleted");
                outcome(PurgeStatus::Deleted)
            }
            Ok(DeleteStatus::NotFound) | Err(ProviderError::NotFound(_)) => {
                debug!(store_key = %target.store_key, "Object already absent");
                outcome(PurgeStatus::AlreadyAbsent)
            }
            Err(err) => {
                warn!(store_key = %target.store_key, error = %err, "Delete failed");
                outcome(PurgeStatus::Failed).with_detail(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TargetRole;
    use async_trait::async_trait;
    use mockall::mock;
    use resilience::{object_storage_config, RetryConfig};
    use std::time::Duration;

    mock! {
        Store {}

        #[async_trait]
        impl ObjectStoreClient for Store {
            async fn verify(&self, bucket: &str) -> Result<(), ProviderError>;
            async fn delete_object(&self, bucket: &str, key: &str) -> Result<DeleteStatus, ProviderError>;
        }
    }

    fn target() -> PurgeTarget {
        PurgeTarget::new("abc123", TargetRole::Primary, "products/abc123.webp".to_string())
    }

    fn no_retry() -> ServiceConfig {
        object_storage_config().with_max_retries(0)
    }

    fn fast_retry(max_retries: u32) -> ServiceConfig {
        ServiceConfig {
            retry: Some(RetryConfig {
                max_retries,
                initial_backoff: Duration::from_millis(1),
                max_backoff: Duration::from_millis(5),
                backoff_multiplier: 2.0,
                jitter: false,
            }),
            ..object_storage_config()
        }
    }

    #[tokio::test]
    async fn test_removed_maps_to_deleted() {
        let mut store = MockStore::new();
        store
            .expect_delete_object()
            .times(1)
            .returning(|_, _| Ok(DeleteStatus::Removed));

        let outcome = ObjectDeleter::new(Arc::new(store), no_retry())
            .delete("bucket", &target())
            .await;

        assert_eq!(outcome.status, PurgeStatus::Deleted);
        assert_eq!(outcome.operation, Operation::Delete);
        assert!(outcome.detail.is_none());
    }

    #[tokio::test]
    async fn test_absent_key_is_already_absent() {
        let mut store = MockStore::new();
        store
            .expect_delete_object()
            .times(1)
            .returning(|_, _| Ok(DeleteStatus::NotFound));

        let outcome = ObjectDeleter::new(Arc::new(store), no_retry())
            .delete("bucket", &target())
            .await;

        assert_eq!(outcome.status, PurgeStatus::AlreadyAbsent);
    }

    #[tokio::test]
    async fn test_not_found_error_is_already_absent() {
        let mut store = MockStore::new();
        store
            .expect_delete_object()
            .times(1)
            .returning(|_, _| Err(ProviderError::NotFound("NoSuchKey".into())));

        let outcome = ObjectDeleter::new(Arc::new(store), no_retry())
            .delete("bucket", &target())
            .await;

        assert_eq!(outcome.status, PurgeStatus::AlreadyAbsent);
    }

    #[tokio::test]
    async fn test_access_denied_on_delete_is_failed_with_message() {
        let mut store = MockStore::new();
        store
            .expect_delete_object()
            .times(1)
            .returning(|_, _| Err(ProviderError::AccessDenied("AccessDenied: no s3:DeleteObject".into())));

        let outcome = ObjectDeleter::new(Arc::new(store), fast_retry(3))
            .delete("bucket", &target())
            .await;

        assert_eq!(outcome.status, PurgeStatus::Failed);
        assert!(outcome.detail.unwrap().contains("no s3:DeleteObject"));
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let mut store = MockStore::new();
        let mut seq = mockall::Sequence::new();
        store
            .expect_delete_object()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(ProviderError::Transient("SlowDown".into())));
        store
            .expect_delete_object()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(DeleteStatus::Removed));

        let outcome = ObjectDeleter::new(Arc::new(store), fast_retry(3))
            .delete("bucket", &target())
            .await;

        assert_eq!(outcome.status, PurgeStatus::Deleted);
    }

    #[tokio::test]
    async fn test_exhausted_retries_report_last_error() {
        let mut store = MockStore::new();
        store
            .expect_delete_object()
            .times(3)
            .returning(|_, _| Err(ProviderError::Timeout("deadline".into())));

        let outcome = ObjectDeleter::new(Arc::new(store), fast_retry(2))
            .delete("bucket", &target())
            .await;

        assert_eq!(outcome.status, PurgeStatus::Failed);
        assert!(outcome.detail.unwrap().contains("deadline"));
    }
}
