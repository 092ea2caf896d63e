//! API Layer for tablegate
//!
//! The gate, the generic table handler, and the JSON envelopes it returns.
//!
//! # Operations
//!
//! - query: filtered, sorted, paginated read of one table
//! - list_tables: every queryable table
//! - describe: column layout of one table

pub mod auth;
mod errors;
mod handler;
mod response;

pub use auth::{require_api_key, ApiKeyGate, API_KEY_HEADER};
pub use errors::{ApiError, ApiResult, ErrorBody, ErrorResponse};
pub use handler::{HandlerConfig, Stage, TableQueryHandler, DEFAULT_EXECUTE_TIMEOUT};
pub use response::{SchemaResponse, TableResponse, TablesResponse};
