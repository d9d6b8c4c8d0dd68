//! Huginn error types

use std::time::Duration;

/// Huginn error types
#[derive(Debug, thiserror::Error)]
pub enum HuginnError {
    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    // Upstream/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("upstream request timed out after {0:?}")]
    Timeout(Duration),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    // Data errors
    #[error("invalid mention payload: {0}")]
    InvalidPayload(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HuginnError {
    /// Whether this error came from talking to the aggregation service
    /// (network, timeout, status or payload) rather than from local setup.
    pub fn is_upstream(&self) -> bool {
        !matches!(self, HuginnError::Configuration(_))
    }

    /// HTTP status code for `Api` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            HuginnError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for HuginnError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            HuginnError::InvalidPayload(err.to_string())
        } else {
            HuginnError::Http(err.to_string())
        }
    }
}

/// Result type alias for Huginn operations
pub type Result<T> = std::result::Result<T, HuginnError>;
