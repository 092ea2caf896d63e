//! # API Errors
//!
//! Every failure a caller can see, with its HTTP status and the
//! `{ "error": { "kind", "message" } }` envelope.
//!
//! Backend error text never reaches the caller. Conversions from
//! [`BackendError`] keep only a summary; the handler logs the detail.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::backend::BackendError;
use crate::query::QueryError;
use crate::schema::SchemaError;

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, Error)]
pub enum ApiError {
    // ==================
    // Client Errors (4xx)
    // ==================
    /// Missing or mismatched `X-API-Key`
    #[error("Missing or invalid API key")]
    Unauthorized,

    /// Table not in the resolved table set
    #[error("Unknown table '{0}'")]
    UnknownTable(String),

    /// Query parameters rejected by the translator
    #[error("{0}")]
    Query(#[from] QueryError),

    // ==================
    // Backend Errors (5xx)
    // ==================
    /// Backend unreachable, timed out, or failing
    #[error("Backend service unavailable")]
    BackendUnavailable,

    /// Backend schema could not be understood
    #[error("Backend schema could not be read")]
    IntrospectionError,

    /// Backend refused a query that passed validation
    #[error("Backend rejected the query")]
    BackendRejected,
}

impl ApiError {
    /// Stable kind name carried in the error envelope
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "Unauthorized",
            ApiError::UnknownTable(_) => "UnknownTable",
            ApiError::Query(err) => err.kind(),
            ApiError::BackendUnavailable => "BackendUnavailable",
            ApiError::IntrospectionError => "IntrospectionError",
            ApiError::BackendRejected => "BackendRejected",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::UnknownTable(_) => StatusCode::NOT_FOUND,
            ApiError::Query(_) => StatusCode::BAD_REQUEST,
            ApiError::BackendUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::IntrospectionError => StatusCode::BAD_GATEWAY,
            ApiError::BackendRejected => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl From<SchemaError> for ApiError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::UnknownTable(table) => ApiError::UnknownTable(table),
            SchemaError::BackendUnavailable(_) => ApiError::BackendUnavailable,
            SchemaError::IntrospectionError(_) => ApiError::IntrospectionError,
        }
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::TableNotFound(table) => ApiError::UnknownTable(table),
            BackendError::Rejected { .. } | BackendError::Malformed(_) => ApiError::BackendRejected,
            BackendError::Unreachable(_)
            | BackendError::Timeout(_)
            | BackendError::Server { .. }
            | BackendError::Configuration(_) => ApiError::BackendUnavailable,
        }
    }
}

/// Error detail inside the envelope
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        Self {
            error: ErrorBody {
                kind: err.kind(),
                message: err.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse::from(&self));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::UnknownTable("t".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(QueryError::InvalidPagination("limit".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::BackendUnavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(ApiError::IntrospectionError.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(ApiError::BackendRejected.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_query_error_kinds_pass_through() {
        let err = ApiError::from(QueryError::unknown_column("orders", "bogus_col"));
        assert_eq!(err.kind(), "UnknownColumn");
        assert!(err.to_string().contains("bogus_col"));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_backend_detail_is_not_exposed() {
        let err = ApiError::from(BackendError::Server {
            status: 500,
            message: "relation pg_secret does not exist".into(),
        });
        assert_eq!(err.kind(), "BackendUnavailable");
        assert!(!err.to_string().contains("pg_secret"));

        let err = ApiError::from(BackendError::from_status(400, "syntax error near"));
        assert_eq!(err.kind(), "BackendRejected");
        assert!(!err.to_string().contains("syntax"));

        let err = ApiError::from(SchemaError::from(BackendError::Timeout(Duration::from_secs(1))));
        assert_eq!(err.kind(), "BackendUnavailable");
    }

    #[test]
    fn test_error_envelope_shape() {
        let body = serde_json::to_value(ErrorResponse::from(&ApiError::Unauthorized)).unwrap();
        assert_eq!(body["error"]["kind"], "Unauthorized");
        assert!(body["error"]["message"].is_string());
        assert_eq!(body.as_object().unwrap().len(), 1);
    }
}
