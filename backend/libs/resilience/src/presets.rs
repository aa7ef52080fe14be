/// Preset configurations for the providers a purge run talks to
use crate::retry::RetryConfig;
use crate::timeout::TimeoutConfig;
use std::time::Duration;

/// Configuration bundle for a provider type
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub timeout: TimeoutConfig,
    pub retry: Option<RetryConfig>,
}

impl ServiceConfig {
    /// Override the per-call timeout
    pub fn with_timeout(mut self, duration: Duration) -> Self {
        self.timeout = TimeoutConfig { duration };
        self
    }

    /// Override the retry budget; 0 disables retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.retry = if max_retries == 0 {
            None
        } else {
            Some(RetryConfig {
                max_retries,
                ..self.retry.unwrap_or_default()
            })
        };
        self
    }

    /// Retry policy to apply, `RetryConfig::none()` when retries are disabled
    pub fn retry_policy(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_else(RetryConfig::none)
    }
}

/// S3/Object storage operations (head/delete)
///
/// - Timeout: 30s (single-key calls, no payload)
/// - Retry: 3 attempts (delete-by-key is idempotent)
pub fn object_storage_config() -> ServiceConfig {
    ServiceConfig {
        timeout: TimeoutConfig {
            duration: Duration::from_secs(30),
        },
        retry: Some(RetryConfig {
            max_retries: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: true,
        }),
    }
}

/// CDN management API (distribution lookup, invalidation)
///
/// - Timeout: 30s
/// - Retry: 2 attempts with longer backoff (invalidation API is rate limited)
pub fn cdn_api_config() -> ServiceConfig {
    ServiceConfig {
        timeout: TimeoutConfig {
            duration: Duration::from_secs(30),
        },
        retry: Some(RetryConfig {
            max_retries: 2,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(20),
            backoff_multiplier: 2.0,
            jitter: true,
        }),
    }
}

/// Public edge probes (plain HTTP GET)
///
/// - Timeout: 10s
/// - No retry (a failed probe is treated as "not cached")
pub fn edge_probe_config() -> ServiceConfig {
    ServiceConfig {
        timeout: TimeoutConfig {
            duration: Duration::from_secs(10),
        },
        retry: None,
    }
}
