/// Resilience patterns for calls to external providers
///
/// This library provides the call wrappers used by the purge tooling:
/// - **Timeout**: Enforces time limits on all external calls
/// - **Retry**: Bounded exponential backoff with jitter, applied only to retryable failures
/// - **Preset Configurations**: Pre-tuned settings for object storage, CDN APIs and edge probes
///
/// # Example: Object storage call with timeout and retry
///
/// ```rust,no_run
/// use resilience::{presets, retry::with_retry_if, timeout::with_timeout_result};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let config = presets::object_storage_config();
///     let timeout = config.timeout.duration;
///
///     let result = with_retry_if(
///         config.retry.unwrap_or_default(),
///         |_err: &resilience::TimeoutError| true,
///         || with_timeout_result(timeout, async {
///             // Your S3 call here
///             Ok::<_, resilience::TimeoutError>(())
///         }),
///     )
///     .await;
/// }
/// ```

pub mod presets;
pub mod retry;
pub mod timeout;

// Re-export main types for convenience
pub use presets::{cdn_api_config, edge_probe_config, object_storage_config, ServiceConfig};
pub use retry::{with_retry, with_retry_if, RetryConfig, RetryError};
pub use timeout::{with_timeout, with_timeout_result, TimeoutConfig, TimeoutError};
