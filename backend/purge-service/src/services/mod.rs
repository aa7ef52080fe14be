/// Purge services
///
/// - Key resolution (identifier -> store keys and edge paths)
/// - Object deletion with outcome classification
/// - Edge existence checks against the public CDN domain
/// - Invalidation dispatch (live or dry-run)
/// - The coordinator that drives a whole run
use crate::error::ProviderError;
use resilience::{with_retry_if, with_timeout_result, RetryError, ServiceConfig};
use std::future::Future;

pub mod coordinator;
pub mod deleter;
pub mod edge_checker;
pub mod invalidator;
pub mod resolver;

pub use coordinator::{Capabilities, CdnStage, PurgeCoordinator};
pub use deleter::ObjectDeleter;
pub use edge_checker::{edge_url, EdgeChecker};
pub use invalidator::{DryRunDispatcher, InvalidationDispatcher, LiveDispatcher};
pub use resolver::{join_key, KeyResolver};

/// Run one remote call under the provider's timeout and retry policy.
///
/// Each attempt gets its own deadline; only retryable failures are repeated.
pub(crate) async fn guarded<F, Fut, T>(policy: &ServiceConfig, mut call: F) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let timeout = policy.timeout.duration;
    with_retry_if(policy.retry_policy(), ProviderError::is_retryable, || {
        with_timeout_result(timeout, call())
    })
    .await
    .map_err(RetryError::into_inner)
}
