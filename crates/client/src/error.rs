//! Backend client error types.

use std::sync::Arc;

/// Errors shared by the network backend clients.
///
/// Every variant maps to "this source is unusable for this attempt" at the
/// chain boundary; the variants exist so logs can tell the failures apart.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    /// The backend was never configured (missing URL or credential).
    #[error("backend not configured: {0}")]
    NotConfigured(&'static str),

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Unexpected HTTP status from the backend.
    #[error("HTTP error: {status}")]
    HttpStatus { status: u16 },

    /// Response payload did not have the expected shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// Document-store write failure.
    #[error("store error: {0}")]
    Store(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { BackendError::Timeout } else { BackendError::Network(Arc::new(err)) }
    }
}
