//! In-memory backend.
//!
//! Holds tables and rows in process and evaluates [`QueryRequest`]s with the
//! same semantics the PostgREST backend applies server-side. Used for tests
//! and local development. Latency and outages can be injected.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use serde_json::Value;

use crate::query::QueryRequest;
use crate::schema::TableSchema;

use super::errors::{BackendError, BackendResult};
use super::{Backend, QueryResult, Row};

struct MemoryTable {
    schema: TableSchema,
    rows: Vec<Row>,
}

/// In-process table store
pub struct InMemoryBackend {
    tables: RwLock<BTreeMap<String, MemoryTable>>,
    latency: RwLock<Option<Duration>>,
    offline: AtomicBool,
    introspection_calls: AtomicUsize,
    execute_calls: AtomicUsize,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(BTreeMap::new()),
            latency: RwLock::new(None),
            offline: AtomicBool::new(false),
            introspection_calls: AtomicUsize::new(0),
            execute_calls: AtomicUsize::new(0),
        }
    }

    /// Builder form of [`insert_table`](Self::insert_table)
    pub fn with_table(self, schema: TableSchema, rows: Vec<Value>) -> Self {
        self.insert_table(schema, rows);
        self
    }

    /// Create or replace a table. Non-object rows are ignored.
    pub fn insert_table(&self, schema: TableSchema, rows: Vec<Value>) {
        let rows = rows
            .into_iter()
            .filter_map(|row| match row {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();

        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        tables.insert(schema.table.clone(), MemoryTable { schema, rows });
    }

    pub fn drop_table(&self, table: &str) -> bool {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        tables.remove(table).is_some()
    }

    /// Delay every call by `latency`
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.write().unwrap_or_else(|e| e.into_inner()) = latency;
    }

    /// Make every call fail as unreachable
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, AtomicOrdering::SeqCst);
    }

    /// Number of `list_tables`/`describe_table` calls served
    pub fn introspection_calls(&self) -> usize {
        self.introspection_calls.load(AtomicOrdering::SeqCst)
    }

    /// Number of `execute` calls served
    pub fn execute_calls(&self) -> usize {
        self.execute_calls.load(AtomicOrdering::SeqCst)
    }

    async fn simulate_network(&self) -> BackendResult<()> {
        let latency = *self.latency.read().unwrap_or_else(|e| e.into_inner());
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.offline.load(AtomicOrdering::SeqCst) {
            return Err(BackendError::Unreachable("in-memory backend offline".into()));
        }
        Ok(())
    }

    fn run_query(table: &MemoryTable, request: &QueryRequest) -> QueryResult {
        let mut rows: Vec<&Row> = table
            .rows
            .iter()
            .filter(|row| {
                // FilterClause evaluates against a JSON object
                let value = Value::Object((*row).clone());
                request.filters.iter().all(|f| f.matches(&value))
            })
            .collect();

        if let Some(sort) = &request.sort {
            rows.sort_by(|a, b| {
                let ordering = compare_cells(a.get(&sort.column), b.get(&sort.column));
                if sort.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        let total = request.count.map(|_| rows.len() as u64);

        let page = rows
            .into_iter()
            .skip(request.pagination.offset as usize)
            .take(request.pagination.limit as usize)
            .map(|row| match &request.select {
                Some(columns) => columns
                    .iter()
                    .map(|c| (c.clone(), row.get(c).cloned().unwrap_or(Value::Null)))
                    .collect(),
                None => row.clone(),
            })
            .collect();

        QueryResult { rows: page, total }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Ascending order with NULLs last
fn compare_cells(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(a)), Some(Value::Number(b))) => {
            let a = a.as_f64().unwrap_or(0.0);
            let b = b.as_f64().unwrap_or(0.0);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(a)), Some(Value::String(b))) => {
            match (DateTime::parse_from_rfc3339(a), DateTime::parse_from_rfc3339(b)) {
                (Ok(a), Ok(b)) => a.cmp(&b),
                _ => a.cmp(b),
            }
        }
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (Some(a), Some(b)) => a.to_string().cmp(&b.to_string()),
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn list_tables(&self) -> BackendResult<Vec<String>> {
        self.introspection_calls.fetch_add(1, AtomicOrdering::SeqCst);
        self.simulate_network().await?;

        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        Ok(tables.keys().cloned().collect())
    }

    async fn describe_table(&self, table: &str) -> BackendResult<TableSchema> {
        self.introspection_calls.fetch_add(1, AtomicOrdering::SeqCst);
        self.simulate_network().await?;

        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        tables
            .get(table)
            .map(|t| t.schema.clone())
            .ok_or_else(|| BackendError::TableNotFound(table.to_string()))
    }

    async fn execute(&self, request: &QueryRequest) -> BackendResult<QueryResult> {
        self.execute_calls.fetch_add(1, AtomicOrdering::SeqCst);
        self.simulate_network().await?;

        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        let table = tables
            .get(&request.table)
            .ok_or_else(|| BackendError::TableNotFound(request.table.clone()))?;

        Ok(Self::run_query(table, request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{
        CountMode, FilterClause, FilterOperator, FilterValue, PaginationLimits, SortSpec,
    };
    use crate::schema::{ColumnDescriptor, ColumnType};
    use serde_json::json;

    fn backend() -> InMemoryBackend {
        InMemoryBackend::new().with_table(
            TableSchema::new(
                "orders",
                vec![
                    ColumnDescriptor::new("id", ColumnType::Integer),
                    ColumnDescriptor::new("status", ColumnType::Text),
                    ColumnDescriptor::new("total", ColumnType::Float),
                ],
            ),
            vec![
                json!({"id": 1, "status": "pending", "total": 30.0}),
                json!({"id": 2, "status": "shipped", "total": 10.0}),
                json!({"id": 3, "status": "pending", "total": null}),
                json!({"id": 4, "status": "pending", "total": 20.0}),
            ],
        )
    }

    fn ids(result: &QueryResult) -> Vec<i64> {
        result
            .rows
            .iter()
            .map(|r| r["id"].as_i64().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_filter_sort_paginate() {
        let backend = backend();
        let mut request = QueryRequest::new("orders", PaginationLimits::default());
        request.filters.push(FilterClause::new(
            "status",
            FilterOperator::Eq,
            FilterValue::Text("pending".into()),
        ));
        request.sort = Some(SortSpec {
            column: "total".into(),
            descending: false,
        });

        let result = backend.execute(&request).await.unwrap();
        assert_eq!(ids(&result), vec![4, 1, 3]);

        request.pagination.offset = 1;
        request.pagination.limit = 1;
        let result = backend.execute(&request).await.unwrap();
        assert_eq!(ids(&result), vec![1]);
        assert_eq!(result.total, None);
    }

    #[tokio::test]
    async fn test_projection_and_count() {
        let backend = backend();
        let mut request = QueryRequest::new("orders", PaginationLimits::default());
        request.select = Some(vec!["id".into()]);
        request.count = Some(CountMode::Exact);
        request.pagination.limit = 2;

        let result = backend.execute(&request).await.unwrap();
        assert_eq!(result.row_count(), 2);
        assert_eq!(result.total, Some(4));
        assert_eq!(result.rows[0].len(), 1);
    }

    #[tokio::test]
    async fn test_offline_and_counters() {
        let backend = backend();
        assert_eq!(backend.list_tables().await.unwrap(), vec!["orders"]);
        assert_eq!(backend.introspection_calls(), 1);

        backend.set_offline(true);
        let err = backend.describe_table("orders").await.unwrap_err();
        assert!(err.is_unavailable());
        assert_eq!(backend.execute_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_table() {
        let backend = backend();
        assert!(backend.drop_table("orders"));

        let err = backend.describe_table("orders").await.unwrap_err();
        assert!(matches!(err, BackendError::TableNotFound(_)));
    }
}
