//! Table Query Handler for tablegate
//!
//! One handler serves every table. Each request moves through a fixed
//! sequence of stages:
//!
//! ```text
//! Authenticating -> ResolvingSchema -> Translating -> Executing -> Shaping -> Responding
//! ```
//!
//! `Errored` is reachable from any stage. Stages never repeat and nothing is
//! retried. Authentication happens in the gate middleware, so a request
//! reaching the handler starts at `ResolvingSchema`.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::backend::{bounded, Backend};
use crate::observability::Event;
use crate::query::{translate, PaginationLimits};
use crate::schema::SchemaResolver;

use super::errors::{ApiError, ApiResult};
use super::response::{SchemaResponse, TableResponse, TablesResponse};

/// Default time budget for one query execution
pub const DEFAULT_EXECUTE_TIMEOUT: Duration = Duration::from_secs(10);

/// Request processing stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Authenticating,
    ResolvingSchema,
    Translating,
    Executing,
    Shaping,
    Responding,
    Errored,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Authenticating => "authenticating",
            Stage::ResolvingSchema => "resolving_schema",
            Stage::Translating => "translating",
            Stage::Executing => "executing",
            Stage::Shaping => "shaping",
            Stage::Responding => "responding",
            Stage::Errored => "errored",
        }
    }

    /// The stage that follows on success; terminal stages have none
    pub fn next(&self) -> Option<Stage> {
        match self {
            Stage::Authenticating => Some(Stage::ResolvingSchema),
            Stage::ResolvingSchema => Some(Stage::Translating),
            Stage::Translating => Some(Stage::Executing),
            Stage::Executing => Some(Stage::Shaping),
            Stage::Shaping => Some(Stage::Responding),
            Stage::Responding | Stage::Errored => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks one request through its stages
struct StageTracker<'a> {
    table: &'a str,
    stage: Stage,
}

impl<'a> StageTracker<'a> {
    fn authenticated(table: &'a str) -> Self {
        Self {
            table,
            stage: Stage::ResolvingSchema,
        }
    }

    fn advance(&mut self) {
        if let Some(next) = self.stage.next() {
            tracing::debug!(table = self.table, from = %self.stage, to = %next, "stage transition");
            self.stage = next;
        }
    }

    fn fail(&mut self, err: ApiError) -> ApiError {
        let failed = self.stage;
        self.stage = Stage::Errored;

        if err.is_client_error() {
            tracing::info!(
                event = %Event::QueryRejected,
                table = self.table,
                stage = %failed,
                kind = err.kind(),
                error = %err
            );
        } else {
            tracing::warn!(
                event = %Event::QueryFailed,
                table = self.table,
                stage = %failed,
                kind = err.kind()
            );
        }
        err
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HandlerConfig {
    pub limits: PaginationLimits,
    pub execute_timeout: Duration,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            limits: PaginationLimits::default(),
            execute_timeout: DEFAULT_EXECUTE_TIMEOUT,
        }
    }
}

/// Schema-driven read handler shared by all tables
pub struct TableQueryHandler {
    resolver: Arc<SchemaResolver>,
    backend: Arc<dyn Backend>,
    config: HandlerConfig,
}

impl TableQueryHandler {
    pub fn new(resolver: Arc<SchemaResolver>, backend: Arc<dyn Backend>, config: HandlerConfig) -> Self {
        Self {
            resolver,
            backend,
            config,
        }
    }

    /// Run a filtered, paginated read against `table`
    pub async fn query(&self, table: &str, params: &[(String, String)]) -> ApiResult<TableResponse> {
        let started = Instant::now();
        let mut tracker = StageTracker::authenticated(table);
        tracing::debug!(event = %Event::QueryReceived, table, params = params.len());

        let schema = self
            .resolver
            .describe_table(table)
            .await
            .map_err(|e| tracker.fail(e.into()))?;
        tracker.advance();

        let request = translate(&schema, params, self.config.limits)
            .map_err(|e| tracker.fail(e.into()))?;
        tracker.advance();

        let result = bounded(self.config.execute_timeout, self.backend.execute(&request))
            .await
            .map_err(|e| {
                tracing::warn!(table, error = %e, "backend execution failed");
                tracker.fail(e.into())
            })?;
        tracker.advance();

        let response = TableResponse::new(&schema.table, result, request.pagination);
        tracker.advance();

        tracing::info!(
            event = %Event::QueryExecuted,
            table,
            filters = request.filters.len(),
            rows = response.count,
            elapsed_ms = started.elapsed().as_millis() as u64
        );
        Ok(response)
    }

    /// Every queryable table, sorted by name
    pub async fn list_tables(&self) -> ApiResult<TablesResponse> {
        let tables = self.resolver.list_tables().await?;
        Ok(TablesResponse::new(tables.iter().cloned().collect()))
    }

    /// Column layout of one table
    pub async fn describe(&self, table: &str) -> ApiResult<SchemaResponse> {
        let schema = self.resolver.describe_table(table).await?;
        Ok(SchemaResponse::from(schema.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::schema::{ColumnDescriptor, ColumnType, ResolverConfig, TableSchema};
    use serde_json::json;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn setup() -> (Arc<InMemoryBackend>, TableQueryHandler) {
        let schema = TableSchema::new(
            "orders",
            vec![
                ColumnDescriptor::new("id", ColumnType::Integer).not_null(),
                ColumnDescriptor::new("status", ColumnType::Text),
                ColumnDescriptor::new("total", ColumnType::Float),
            ],
        );
        let rows = (1..=30)
            .map(|i| {
                let status = if i % 3 == 0 { "shipped" } else { "pending" };
                json!({"id": i, "status": status, "total": i as f64 * 1.5})
            })
            .collect();

        let backend = Arc::new(InMemoryBackend::new().with_table(schema, rows));
        let resolver = Arc::new(SchemaResolver::new(backend.clone(), ResolverConfig::default()));
        let handler = TableQueryHandler::new(resolver, backend.clone(), HandlerConfig::default());
        (backend, handler)
    }

    #[test]
    fn test_stage_order() {
        let mut stage = Stage::Authenticating;
        let mut seen = vec![stage];
        while let Some(next) = stage.next() {
            stage = next;
            seen.push(stage);
        }

        assert_eq!(
            seen,
            vec![
                Stage::Authenticating,
                Stage::ResolvingSchema,
                Stage::Translating,
                Stage::Executing,
                Stage::Shaping,
                Stage::Responding,
            ]
        );
        assert_eq!(Stage::Errored.next(), None);
    }

    #[tokio::test]
    async fn test_query_filters_and_paginates() {
        let (_backend, handler) = setup();

        let response = handler
            .query("orders", &pairs(&[("status", "eq.pending"), ("limit", "10")]))
            .await
            .unwrap();

        assert_eq!(response.table, "orders");
        assert_eq!(response.count, 10);
        assert_eq!(response.limit, 10);
        assert_eq!(response.offset, 0);
        assert!(response.data.iter().all(|row| row["status"] == "pending"));
    }

    #[tokio::test]
    async fn test_unknown_column_skips_execution() {
        let (backend, handler) = setup();

        let err = handler
            .query("orders", &pairs(&[("status", "pending"), ("bogus_col", "5")]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "UnknownColumn");
        assert_eq!(backend.execute_calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_table_regardless_of_params() {
        let (backend, handler) = setup();

        let err = handler
            .query("ghost", &pairs(&[("limit", "9999"), ("x__zz", "1")]))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::UnknownTable(_)));
        assert_eq!(backend.execute_calls(), 0);
    }

    #[tokio::test]
    async fn test_count_reports_total() {
        let (_backend, handler) = setup();

        let response = handler
            .query("orders", &pairs(&[("status", "shipped"), ("count", "exact"), ("limit", "2")]))
            .await
            .unwrap();

        assert_eq!(response.count, 2);
        assert_eq!(response.total, Some(10));
    }

    #[tokio::test]
    async fn test_execution_timeout() {
        let (backend, handler) = setup();
        let handler = TableQueryHandler::new(
            Arc::clone(&handler.resolver),
            backend.clone(),
            HandlerConfig {
                execute_timeout: Duration::from_millis(20),
                ..Default::default()
            },
        );

        // Warm the schema cache, then slow the backend down
        handler.describe("orders").await.unwrap();
        backend.set_latency(Some(Duration::from_secs(5)));

        let err = handler.query("orders", &[]).await.unwrap_err();
        assert!(matches!(err, ApiError::BackendUnavailable));
    }

    #[tokio::test]
    async fn test_meta_operations() {
        let (_backend, handler) = setup();

        let tables = handler.list_tables().await.unwrap();
        assert_eq!(tables.tables, vec!["orders"]);
        assert_eq!(tables.total, 1);

        let schema = handler.describe("orders").await.unwrap();
        assert_eq!(schema.columns.len(), 3);
        assert!(!schema.columns[0].nullable);

        assert!(matches!(
            handler.describe("nonexistent_table").await,
            Err(ApiError::UnknownTable(_))
        ));
    }
}
