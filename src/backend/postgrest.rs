//! PostgREST backend.
//!
//! Introspection reads the OpenAPI document PostgREST serves at the REST root
//! (`definitions` holds one entry per table with its columns and Postgres
//! types). Queries are sent as `GET /rest/v1/{table}` using PostgREST's
//! `column=op.value` filter syntax.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_RANGE};
use reqwest::{Client, Response};
use serde_json::Value;

use crate::query::QueryRequest;
use crate::schema::{ColumnDescriptor, ColumnType, TableSchema};

use super::errors::{BackendError, BackendResult};
use super::{Backend, QueryResult, Row};

const REST_PATH: &str = "rest/v1";

/// Longest backend error body kept for logs
const MAX_ERROR_BODY: usize = 512;

/// Connection settings for a PostgREST endpoint
#[derive(Debug, Clone)]
pub struct PostgrestConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub base_url: String,
    /// Key sent as both `apikey` and bearer token
    pub api_key: String,
    pub timeout: Duration,
}

pub struct PostgrestBackend {
    client: Client,
    rest_url: String,
    timeout: Duration,
}

impl PostgrestBackend {
    pub fn new(config: PostgrestConfig) -> BackendResult<Self> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| BackendError::Configuration("backend key is not a valid header".into()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| BackendError::Configuration("backend key is not a valid header".into()))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::Configuration(format!("failed to build client: {}", e)))?;

        Ok(Self {
            client,
            rest_url: format!("{}/{}", config.base_url.trim_end_matches('/'), REST_PATH),
            timeout: config.timeout,
        })
    }

    fn map_transport(&self, err: reqwest::Error) -> BackendError {
        if err.is_timeout() {
            BackendError::Timeout(self.timeout)
        } else if err.is_decode() {
            BackendError::Malformed(err.to_string())
        } else {
            BackendError::Unreachable(err.to_string())
        }
    }

    async fn check_status(&self, response: Response) -> BackendResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body: String = response
            .text()
            .await
            .unwrap_or_default()
            .chars()
            .take(MAX_ERROR_BODY)
            .collect();
        Err(BackendError::from_status(status.as_u16(), body))
    }

    async fn fetch_openapi(&self) -> BackendResult<Value> {
        let response = self
            .client
            .get(format!("{}/", self.rest_url))
            .header(ACCEPT, "application/openapi+json")
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let response = self.check_status(response).await?;
        response.json().await.map_err(|e| self.map_transport(e))
    }
}

#[async_trait]
impl Backend for PostgrestBackend {
    async fn list_tables(&self) -> BackendResult<Vec<String>> {
        let doc = self.fetch_openapi().await?;
        table_names(&doc)
    }

    async fn describe_table(&self, table: &str) -> BackendResult<TableSchema> {
        let doc = self.fetch_openapi().await?;
        table_schema(&doc, table)
    }

    async fn execute(&self, request: &QueryRequest) -> BackendResult<QueryResult> {
        let mut call = self
            .client
            .get(format!("{}/{}", self.rest_url, request.table))
            .header(ACCEPT, "application/json")
            .query(&query_pairs(request));

        if let Some(mode) = request.count {
            call = call.header("Prefer", format!("count={}", mode.as_str()));
        }

        let response = call.send().await.map_err(|e| self.map_transport(e))?;
        let response = self.check_status(response).await?;

        let total = request
            .count
            .and_then(|_| response.headers().get(CONTENT_RANGE))
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range);

        let body: Value = response.json().await.map_err(|e| self.map_transport(e))?;
        let rows = rows_from_body(body)?;

        Ok(QueryResult { rows, total })
    }
}

fn definitions(doc: &Value) -> BackendResult<&serde_json::Map<String, Value>> {
    doc.get("definitions")
        .and_then(Value::as_object)
        .ok_or_else(|| BackendError::Malformed("OpenAPI document has no definitions".into()))
}

/// Table names from a PostgREST OpenAPI document
pub fn table_names(doc: &Value) -> BackendResult<Vec<String>> {
    Ok(definitions(doc)?.keys().cloned().collect())
}

/// Schema of one table from a PostgREST OpenAPI document
pub fn table_schema(doc: &Value, table: &str) -> BackendResult<TableSchema> {
    let definition = definitions(doc)?
        .get(table)
        .ok_or_else(|| BackendError::TableNotFound(table.to_string()))?;

    let properties = definition
        .get("properties")
        .and_then(Value::as_object)
        .ok_or_else(|| BackendError::Malformed(format!("table '{}' has no properties", table)))?;

    let required: Vec<&str> = definition
        .get("required")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let columns = properties
        .iter()
        .map(|(name, property)| {
            let backend_type = property
                .get("format")
                .or_else(|| property.get("type"))
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    BackendError::Malformed(format!("column '{}.{}' has no type", table, name))
                })?;

            Ok(ColumnDescriptor {
                name: name.clone(),
                column_type: ColumnType::from_backend_type(backend_type),
                nullable: !required.contains(&name.as_str()),
            })
        })
        .collect::<BackendResult<Vec<_>>>()?;

    Ok(TableSchema::new(table, columns))
}

/// PostgREST query-string pairs for a validated request
pub fn query_pairs(request: &QueryRequest) -> Vec<(String, String)> {
    let mut pairs = vec![("select".to_string(), request.select_clause())];

    for filter in &request.filters {
        pairs.push((
            filter.column.clone(),
            format!("{}.{}", filter.operator.as_str(), filter.value.to_backend_literal()),
        ));
    }

    if let Some(sort) = &request.sort {
        pairs.push(("order".to_string(), sort.to_backend_order()));
    }

    pairs.push(("limit".to_string(), request.pagination.limit.to_string()));
    pairs.push(("offset".to_string(), request.pagination.offset.to_string()));
    pairs
}

/// Total from a `Content-Range` header such as `0-9/123`; `*` totals are unknown
pub fn parse_content_range(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

fn rows_from_body(body: Value) -> BackendResult<Vec<Row>> {
    match body {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(row) => Ok(row),
                other => Err(BackendError::Malformed(format!(
                    "expected row object, got {}",
                    other
                ))),
            })
            .collect(),
        other => Err(BackendError::Malformed(format!(
            "expected array of rows, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{
        CountMode, FilterClause, FilterOperator, FilterValue, PaginationLimits, SortSpec,
    };
    use serde_json::json;

    fn openapi_doc() -> Value {
        json!({
            "swagger": "2.0",
            "definitions": {
                "orders": {
                    "required": ["id"],
                    "properties": {
                        "id": {"type": "integer", "format": "bigint"},
                        "status": {"type": "string", "format": "text"},
                        "total": {"type": "number", "format": "numeric"},
                        "paid": {"type": "boolean", "format": "boolean"},
                        "created_at": {"type": "string", "format": "timestamp with time zone"},
                        "meta": {"format": "jsonb"}
                    }
                },
                "staff": {
                    "properties": {
                        "name": {"type": "string", "format": "character varying"}
                    }
                }
            }
        })
    }

    #[test]
    fn test_table_names() {
        let names = table_names(&openapi_doc()).unwrap();
        assert_eq!(names, vec!["orders", "staff"]);

        let err = table_names(&json!({"paths": {}})).unwrap_err();
        assert!(matches!(err, BackendError::Malformed(_)));
    }

    #[test]
    fn test_table_schema() {
        let schema = table_schema(&openapi_doc(), "orders").unwrap();

        let summary: Vec<(&str, ColumnType, bool)> = schema
            .columns
            .iter()
            .map(|c| (c.name.as_str(), c.column_type, c.nullable))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("id", ColumnType::Integer, false),
                ("status", ColumnType::Text, true),
                ("total", ColumnType::Float, true),
                ("paid", ColumnType::Boolean, true),
                ("created_at", ColumnType::Timestamp, true),
                ("meta", ColumnType::Json, true),
            ]
        );
    }

    #[test]
    fn test_table_schema_errors() {
        assert!(matches!(
            table_schema(&openapi_doc(), "ghost"),
            Err(BackendError::TableNotFound(_))
        ));

        let doc = json!({"definitions": {"broken": {"properties": {"x": {}}}}});
        assert!(matches!(
            table_schema(&doc, "broken"),
            Err(BackendError::Malformed(_))
        ));
    }

    #[test]
    fn test_query_pairs() {
        let mut request = QueryRequest::new("orders", PaginationLimits::default());
        request.select = Some(vec!["id".into(), "status".into()]);
        request.filters.push(FilterClause::new(
            "status",
            FilterOperator::Eq,
            FilterValue::Text("pending".into()),
        ));
        request.filters.push(FilterClause::new(
            "id",
            FilterOperator::In,
            FilterValue::List(vec![FilterValue::Integer(1), FilterValue::Integer(2)]),
        ));
        request.sort = Some(SortSpec {
            column: "id".into(),
            descending: true,
        });
        request.pagination.limit = 10;
        request.count = Some(CountMode::Exact);

        let pairs = query_pairs(&request);
        let expected: Vec<(String, String)> = [
            ("select", "id,status"),
            ("status", "eq.pending"),
            ("id", "in.(1,2)"),
            ("order", "id.desc"),
            ("limit", "10"),
            ("offset", "0"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        assert_eq!(pairs, expected);
    }

    #[test]
    fn test_content_range() {
        assert_eq!(parse_content_range("0-9/123"), Some(123));
        assert_eq!(parse_content_range("*/0"), Some(0));
        assert_eq!(parse_content_range("0-9/*"), None);
        assert_eq!(parse_content_range("garbage"), None);
    }

    #[test]
    fn test_rows_from_body() {
        let rows = rows_from_body(json!([{"id": 1}, {"id": 2}])).unwrap();
        assert_eq!(rows.len(), 2);

        assert!(rows_from_body(json!({"message": "oops"})).is_err());
        assert!(rows_from_body(json!([1, 2])).is_err());
    }
}
