//! # Backend Query Client
//!
//! The capability the gateway needs from the database service: list the
//! tables, describe one table, and run a structured read query.
//!
//! - [`PostgrestBackend`] talks to a PostgREST/Supabase endpoint over HTTP.
//! - [`InMemoryBackend`] evaluates the same queries over in-process rows.

pub mod errors;
pub mod memory;
pub mod postgrest;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::query::QueryRequest;
use crate::schema::TableSchema;

pub use errors::{BackendError, BackendResult};
pub use memory::InMemoryBackend;
pub use postgrest::{PostgrestBackend, PostgrestConfig};

/// A row as returned by the backend, column name to value
pub type Row = Map<String, Value>;

/// Rows produced by one executed query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub rows: Vec<Row>,
    /// Total matching rows, present only when a count was requested
    pub total: Option<u64>,
}

impl QueryResult {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows, total: None }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Run a backend call with a time budget; expiry becomes [`BackendError::Timeout`]
pub async fn bounded<T, F>(timeout: Duration, call: F) -> BackendResult<T>
where
    F: Future<Output = BackendResult<T>>,
{
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| BackendError::Timeout(timeout))?
}

/// Read-only database capability
#[async_trait]
pub trait Backend: Send + Sync {
    /// Names of every table the backend exposes
    async fn list_tables(&self) -> BackendResult<Vec<String>>;

    /// Column layout of one table, in ordinal order
    async fn describe_table(&self, table: &str) -> BackendResult<TableSchema>;

    /// Execute a validated query
    async fn execute(&self, request: &QueryRequest) -> BackendResult<QueryResult>;
}
