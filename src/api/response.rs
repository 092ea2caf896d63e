//! # Response Formatting
//!
//! Success envelopes. Every field is always present so the shape is stable
//! across tables and requests.

use serde::Serialize;

use crate::backend::{QueryResult, Row};
use crate::query::Pagination;
use crate::schema::{ColumnDescriptor, TableSchema};

/// Rows returned by `GET /api/{table}`
#[derive(Debug, Clone, Serialize)]
pub struct TableResponse {
    pub table: String,
    pub data: Vec<Row>,
    /// Rows in `data`
    pub count: usize,
    pub limit: u64,
    pub offset: u64,
    /// Total matching rows; null unless `count` was requested
    pub total: Option<u64>,
}

impl TableResponse {
    pub fn new(table: impl Into<String>, result: QueryResult, pagination: Pagination) -> Self {
        let count = result.row_count();
        Self {
            table: table.into(),
            data: result.rows,
            count,
            limit: pagination.limit,
            offset: pagination.offset,
            total: result.total,
        }
    }
}

/// `GET /api/meta/tables`
#[derive(Debug, Clone, Serialize)]
pub struct TablesResponse {
    pub tables: Vec<String>,
    pub total: usize,
}

impl TablesResponse {
    pub fn new(tables: Vec<String>) -> Self {
        let total = tables.len();
        Self { tables, total }
    }
}

/// `GET /api/meta/schema/{table}`
#[derive(Debug, Clone, Serialize)]
pub struct SchemaResponse {
    pub table: String,
    pub columns: Vec<ColumnDescriptor>,
}

impl From<&TableSchema> for SchemaResponse {
    fn from(schema: &TableSchema) -> Self {
        Self {
            table: schema.table.clone(),
            columns: schema.columns.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;
    use serde_json::json;

    #[test]
    fn test_table_response_serialization() {
        let rows = vec![
            json!({"id": 1}).as_object().unwrap().clone(),
            json!({"id": 2}).as_object().unwrap().clone(),
        ];
        let response = TableResponse::new(
            "orders",
            QueryResult::new(rows),
            Pagination { limit: 10, offset: 20 },
        );

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["table"], "orders");
        assert_eq!(json["count"], 2);
        assert_eq!(json["limit"], 10);
        assert_eq!(json["offset"], 20);
        assert!(json["total"].is_null());
        assert_eq!(json["data"][1]["id"], 2);
    }

    #[test]
    fn test_schema_response_serialization() {
        let schema = TableSchema::new(
            "orders",
            vec![ColumnDescriptor::new("id", ColumnType::Integer).not_null()],
        );

        let json = serde_json::to_value(SchemaResponse::from(&schema)).unwrap();
        assert_eq!(
            json,
            json!({
                "table": "orders",
                "columns": [{"name": "id", "type": "integer", "nullable": false}]
            })
        );
    }

    #[test]
    fn test_tables_response_total() {
        let response = TablesResponse::new(vec!["a".into(), "b".into()]);
        assert_eq!(response.total, 2);
    }
}
