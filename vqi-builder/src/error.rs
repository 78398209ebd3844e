//! Error types for vqi-builder
//!
//! Two layers:
//! - [`FetchError`] describes one failed HTTP attempt and knows whether a retry
//!   may help.
//! - [`BuildError`] is what aborts a build. Per-item enrichment failures never
//!   become a `BuildError`; they end up as text in the enrichment error map.

use thiserror::Error;

/// Failure of a single request to a remote source
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    /// Connection, DNS, timeout or body read failure
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP 429
    #[error("HTTP 429 rate limited")]
    RateLimited {
        /// Seconds from the `Retry-After` header, when the server sent one
        retry_after_secs: Option<u64>,
    },

    /// HTTP 5xx
    #[error("Server error {0}: {1}")]
    Server(u16, String),

    /// HTTP 401/403
    #[error("Authentication failed ({0})")]
    Auth(u16),

    /// HTTP 404
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success status
    #[error("HTTP error {0}: {1}")]
    Http(u16, String),

    /// Response body was not the expected JSON
    #[error("Parse error: {0}")]
    Parse(String),
}

impl FetchError {
    /// Whether another attempt may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FetchError::Network(_) | FetchError::RateLimited { .. } | FetchError::Server(..)
        )
    }

    /// Server-requested wait before the next attempt
    pub fn retry_after(&self) -> Option<std::time::Duration> {
        match self {
            FetchError::RateLimited {
                retry_after_secs: Some(secs),
            } => Some(std::time::Duration::from_secs(*secs)),
            _ => None,
        }
    }

    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, path: &str, body: String) -> Self {
        match status {
            401 | 403 => FetchError::Auth(status),
            404 => FetchError::NotFound(path.to_string()),
            429 => FetchError::RateLimited {
                retry_after_secs: None,
            },
            500..=599 => FetchError::Server(status, body),
            _ => FetchError::Http(status, body),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Parse(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// Errors that stop a build
#[derive(Debug, Error)]
pub enum BuildError {
    /// Missing credentials or invalid arguments, raised before network activity
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A listing page failed; the item universe is unknown
    #[error("Listing failed: {0}")]
    Listing(#[source] FetchError),

    /// Input file is structurally unusable (e.g. required columns missing)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV reader error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// vqi-common error
    #[error("Common error: {0}")]
    Common(#[from] vqi_common::Error),
}

/// Result type for build operations
pub type BuildResult<T> = Result<T, BuildError>;
