//! # Schema Resolution Errors

use thiserror::Error;

use crate::backend::BackendError;

/// Result type for schema resolution
pub type SchemaResult<T> = Result<T, SchemaError>;

#[derive(Debug, Clone, Error)]
pub enum SchemaError {
    /// Table is not in the resolved table set
    #[error("Unknown table '{0}'")]
    UnknownTable(String),

    /// Backend unreachable, timed out, or failing
    #[error("Schema backend unavailable: {0}")]
    BackendUnavailable(BackendError),

    /// Backend answered but the schema could not be understood
    #[error("Schema introspection failed: {0}")]
    IntrospectionError(String),
}

impl From<BackendError> for SchemaError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::TableNotFound(table) => SchemaError::UnknownTable(table),
            BackendError::Malformed(detail) => SchemaError::IntrospectionError(detail),
            BackendError::Rejected { status, message } => SchemaError::IntrospectionError(
                format!("introspection rejected with status {}: {}", status, message),
            ),
            other => SchemaError::BackendUnavailable(other),
        }
    }
}
