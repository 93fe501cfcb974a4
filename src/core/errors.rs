//! Custom error types for gateway operations

use thiserror::Error;

/// Why a single provider attempt failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Credentials for the provider are not configured
    #[error("credentials not configured")]
    MissingCredentials,

    /// The call did not complete within the per-call bound
    #[error("request timed out")]
    Timeout,

    /// The provider rejected our credentials
    #[error("unauthorized ({0})")]
    Unauthorized(u16),

    /// The provider is throttling us (HTTP 429)
    #[error("throttled by provider (429)")]
    Throttled,

    /// Any other non-success status
    #[error("API error: {0} - {1}")]
    Status(u16, String),

    /// Connection-level failure
    #[error("network error: {0}")]
    Network(String),

    /// Body could not be parsed into a translation string
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Failure of one provider attempt.
///
/// These are recorded into the health tracker and never surfaced to callers
/// of [`Gateway::translate`](crate::Gateway::translate).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{provider_id}: {kind}")]
pub struct ProviderError {
    pub provider_id: String,
    pub kind: ProviderErrorKind,
}

impl ProviderError {
    pub fn new(provider_id: impl Into<String>, kind: ProviderErrorKind) -> Self {
        Self {
            provider_id: provider_id.into(),
            kind,
        }
    }

    /// Map a reqwest failure onto the provider taxonomy
    pub fn from_reqwest(provider_id: &str, err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ProviderErrorKind::Timeout
        } else if err.is_decode() {
            ProviderErrorKind::InvalidResponse(err.to_string())
        } else {
            ProviderErrorKind::Network(err.to_string())
        };
        Self::new(provider_id, kind)
    }
}

/// Errors visible at the gateway boundary
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Missing text or target language
    #[error("Invalid request: {message}")]
    InvalidRequest {
        message: String,
    },

    /// Admission denied by the global rate limiter
    #[error("Rate limit exceeded. Retry after {retry_after_secs} seconds")]
    RateLimited {
        retry_after_secs: u64,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
    },

    /// Reqwest client could not be built
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl GatewayError {
    pub fn invalid(message: impl Into<String>) -> Self {
        GatewayError::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        GatewayError::ConfigError {
            message: message.into(),
        }
    }
}

/// Result type for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;
