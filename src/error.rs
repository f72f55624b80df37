//! Error types for the Veil redaction system.

use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to encode record: {0}")]
    Encode(String),

    #[error("Failed to decode record: {0}")]
    Decode(String),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

impl StorageError {
    pub(crate) fn sled(context: &str, err: sled::Error) -> Self {
        StorageError::IoError(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("{}: {}", context, err),
        ))
    }
}

/// Model output that could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Neither DROP nor FORWARD appeared in a classification response.
    #[error("Ambiguous verdict (no DROP or FORWARD marker): {response:?}")]
    AmbiguousVerdict { response: String },

    /// A policy fold response without a complete ``` fenced block.
    #[error("Policy response is missing a fenced block ({segments} segment(s) after splitting)")]
    MissingFence { segments: usize },

    #[error("Policy response contains an empty fenced block")]
    EmptyFence,
}

/// Crate-wide error
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Provider request failed with status {status}: {message}")]
    ProviderRequestFailed { status: u16, message: String },

    #[error("Provider authentication failed: {0}")]
    ProviderAuthFailed(String),

    #[error("Provider rate limit exceeded: {0}")]
    ProviderRateLimit(String),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ApiError {
    /// Non-success responses from the completion endpoint.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ApiError::ProviderRequestFailed { .. }
                | ApiError::ProviderAuthFailed(_)
                | ApiError::ProviderRateLimit(_)
        )
    }

    /// Missing or invalid configuration; never worth retrying.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            ApiError::ConfigError(_) | ApiError::ProviderNotConfigured(_)
        )
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
