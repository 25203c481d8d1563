//! Error types for the scan core

use thiserror::Error;

/// Main error type for scan operations
#[derive(Error, Debug)]
pub enum ScanError {
    /// URL rejected by validation (message is user-facing, Vietnamese)
    #[error("{0}")]
    InvalidUrl(String),

    /// Network error talking to a remote service
    #[error("Network error: {0}")]
    Network(String),

    /// Remote service answered with an unexpected status
    #[error("{service} returned HTTP {status}")]
    Http { service: &'static str, status: u16 },

    /// Remote service rejected the API key
    #[error("{0}: invalid API key")]
    InvalidApiKey(&'static str),

    /// Local or remote rate limit hit
    #[error("Rate limited, retry after {retry_after}s")]
    RateLimited { retry_after: u64 },

    /// Service not configured (missing API key)
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// Response body could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Domain list storage failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for scan operations
pub type Result<T> = std::result::Result<T, ScanError>;

impl From<reqwest::Error> for ScanError {
    fn from(e: reqwest::Error) -> Self {
        ScanError::Network(e.to_string())
    }
}

impl ScanError {
    /// True when the error is caused by caller input rather than the service
    pub fn is_user_error(&self) -> bool {
        matches!(self, ScanError::InvalidUrl(_))
    }
}
