//! # Backend Errors
//!
//! Failures talking to the database service. These carry the raw backend
//! detail for logging; the HTTP layer only ever returns a summary.

use std::time::Duration;

use thiserror::Error;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// Connection could not be established or was dropped
    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    /// Call exceeded its time budget
    #[error("Backend call timed out after {0:?}")]
    Timeout(Duration),

    /// Backend answered with a server-side failure (5xx)
    #[error("Backend failure (status {status}): {message}")]
    Server { status: u16, message: String },

    /// Backend refused an otherwise validated request (4xx)
    #[error("Backend rejected request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    /// Response body could not be understood
    #[error("Malformed backend response: {0}")]
    Malformed(String),

    /// Table does not exist on the backend
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Client could not be built from the supplied settings
    #[error("Invalid backend configuration: {0}")]
    Configuration(String),
}

impl BackendError {
    /// Classify an HTTP status returned by the backend
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status >= 500 {
            BackendError::Server { status, message }
        } else {
            BackendError::Rejected { status, message }
        }
    }

    /// Whether the failure means the backend could not serve the call at all
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            BackendError::Unreachable(_) | BackendError::Timeout(_) | BackendError::Server { .. }
        )
    }
}
