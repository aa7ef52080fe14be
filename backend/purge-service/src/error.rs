/// Error types for the purge service
///
/// Two layers: [`ProviderError`] classifies a single failed remote call and is
/// always converted into a `PurgeOutcome` status; [`PurgeError`] covers the
/// preconditions that stop a run before any per-identifier work begins.
use resilience::TimeoutError;
use thiserror::Error;

/// Result type for run-level operations
pub type Result<T> = std::result::Result<T, PurgeError>;

/// Run-level failures. None of these are produced once iteration has started.
#[derive(Debug, Error)]
pub enum PurgeError {
    /// A required setting or credential is absent or unusable
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    /// The identifier source yielded nothing to do
    #[error("No identifiers found in {0}")]
    EmptyInput(String),

    /// The identifier source could not be read
    #[error("Unable to read identifier source {path}: {source}")]
    Source {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The store or CDN connection could not be established
    #[error("Connection error: {0}")]
    Connection(String),
}

impl From<config::ConfigError> for PurgeError {
    fn from(err: config::ConfigError) -> Self {
        PurgeError::ConfigurationMissing(err.to_string())
    }
}

/// Classified failure of one remote call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Object or CDN item absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Authorization failure on this operation
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Call exceeded its deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Network failure, throttling or a provider-side 5xx
    #[error("Transient failure: {0}")]
    Transient(String),

    /// Anything else the provider reported
    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    /// Only timeouts and transient failures are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::Timeout(_) | ProviderError::Transient(_))
    }

    /// Classify an HTTP status returned by a provider
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            404 => ProviderError::NotFound(message),
            401 | 403 => ProviderError::AccessDenied(message),
            408 | 429 | 500..=599 => ProviderError::Transient(message),
            _ => ProviderError::Other(message),
        }
    }

    /// Classify a provider error code (e.g. `AccessDenied`, `NoSuchKey`, `Throttling`)
    pub fn from_code(code: &str, message: impl Into<String>) -> Option<Self> {
        let message = message.into();
        match code {
            "NoSuchKey" | "NotFound" | "NoSuchDistribution" => {
                Some(ProviderError::NotFound(message))
            }
            "AccessDenied" | "AccessDeniedException" | "InvalidAccessKeyId"
            | "SignatureDoesNotMatch" | "ExpiredToken" => Some(ProviderError::AccessDenied(message)),
            "Throttling" | "ThrottlingException" | "SlowDown" | "RequestTimeout"
            | "TooManyInvalidationsInProgress" | "ServiceUnavailable" | "InternalError" => {
                Some(ProviderError::Transient(message))
            }
            _ => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ProviderError::NotFound(m)
            | ProviderError::AccessDenied(m)
            | ProviderError::Timeout(m)
            | ProviderError::Transient(m)
            | ProviderError::Other(m) => m,
        }
    }
}

impl From<TimeoutError> for ProviderError {
    fn from(err: TimeoutError) -> Self {
        ProviderError::Timeout(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_display() {
        let err = PurgeError::ConfigurationMissing("S3_BUCKET".to_string());
        assert_eq!(err.to_string(), "Configuration missing: S3_BUCKET");

        let err = PurgeError::EmptyInput("FileNamesToDelete.txt".to_string());
        assert_eq!(err.to_string(), "No identifiers found in FileNamesToDelete.txt");
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(ProviderError::from_status(404, "x"), ProviderError::NotFound(_)));
        assert!(matches!(ProviderError::from_status(403, "x"), ProviderError::AccessDenied(_)));
        assert!(matches!(ProviderError::from_status(503, "x"), ProviderError::Transient(_)));
        assert!(matches!(ProviderError::from_status(429, "x"), ProviderError::Transient(_)));
        assert!(matches!(ProviderError::from_status(400, "x"), ProviderError::Other(_)));
    }

    #[test]
    fn test_code_classification() {
        assert_eq!(
            ProviderError::from_code("AccessDenied", "nope"),
            Some(ProviderError::AccessDenied("nope".into()))
        );
        assert!(matches!(
            ProviderError::from_code("SlowDown", "later"),
            Some(ProviderError::Transient(_))
        ));
        assert_eq!(ProviderError::from_code("MalformedXML", "bad"), None);
    }

    #[test]
    fn test_timeout_conversion_is_retryable() {
        let err: ProviderError = TimeoutError::Elapsed(Duration::from_secs(1)).into();
        assert!(matches!(err, ProviderError::Timeout(_)));
        assert!(err.is_retryable());
        assert!(!ProviderError::AccessDenied("x".into()).is_retryable());
    }
}
