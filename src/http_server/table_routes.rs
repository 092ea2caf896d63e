//! Table HTTP Routes
//!
//! The generic per-table query endpoint and the schema metadata endpoints.
//! Mounted under `/api` behind the API key gate.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::get,
    Json, Router,
};

use crate::api::{ApiError, SchemaResponse, TableQueryHandler, TableResponse, TablesResponse};
use crate::query::QueryError;

/// Ordered query pairs, duplicates preserved
type QueryPairs = Vec<(String, String)>;

/// Create table routes
pub fn table_routes(handler: Arc<TableQueryHandler>) -> Router {
    Router::new()
        .route("/meta/tables", get(list_tables_handler))
        .route("/meta/schema/:table", get(schema_handler))
        .route("/:table", get(query_handler))
        .with_state(handler)
}

/// GET /api/meta/tables
async fn list_tables_handler(
    State(handler): State<Arc<TableQueryHandler>>,
) -> Result<Json<TablesResponse>, ApiError> {
    Ok(Json(handler.list_tables().await?))
}

/// GET /api/meta/schema/:table
async fn schema_handler(
    State(handler): State<Arc<TableQueryHandler>>,
    Path(table): Path<String>,
) -> Result<Json<SchemaResponse>, ApiError> {
    Ok(Json(handler.describe(&table).await?))
}

/// GET /api/:table
async fn query_handler(
    State(handler): State<Arc<TableQueryHandler>>,
    Path(table): Path<String>,
    query: Result<Query<QueryPairs>, QueryRejection>,
) -> Result<Json<TableResponse>, ApiError> {
    let Query(params) = query.map_err(|rejection| {
        ApiError::Query(QueryError::invalid_value(
            "query",
            &rejection.body_text(),
            "a URL-encoded query string",
        ))
    })?;

    Ok(Json(handler.query(&table, &params).await?))
}
