//! # Translation Errors
//!
//! Every way a query string can be rejected before it reaches the backend.

use thiserror::Error;

use crate::schema::ColumnType;

use super::filter::FilterOperator;

/// Result type for query translation
pub type TranslateResult<T> = Result<T, QueryError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Filter, `select` or `sort` references a column the table does not have
    #[error("Unknown column '{column}' on table '{table}'")]
    UnknownColumn { table: String, column: String },

    /// Operator token outside the supported set
    #[error("Unsupported operator '{operator}' on column '{column}'")]
    UnsupportedOperator { column: String, operator: String },

    /// Operator not applicable to the column's type
    #[error("Operator '{operator}' cannot be applied to {column_type} column '{column}'")]
    InvalidFilterOperator {
        column: String,
        operator: FilterOperator,
        column_type: ColumnType,
    },

    /// Value does not parse as the column's type
    #[error("Invalid value '{value}' for '{column}': expected {expected}")]
    InvalidFilterValue {
        column: String,
        value: String,
        expected: String,
    },

    /// `limit`/`offset` missing a number or out of range
    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),
}

impl QueryError {
    /// Stable error kind name, as reported to callers
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::UnknownColumn { .. } => "UnknownColumn",
            QueryError::UnsupportedOperator { .. } => "UnsupportedOperator",
            QueryError::InvalidFilterOperator { .. } => "InvalidFilterOperator",
            QueryError::InvalidFilterValue { .. } => "InvalidFilterValue",
            QueryError::InvalidPagination(_) => "InvalidPagination",
        }
    }

    pub fn unknown_column(table: &str, column: &str) -> Self {
        QueryError::UnknownColumn {
            table: table.to_string(),
            column: column.to_string(),
        }
    }

    pub fn invalid_value(column: &str, value: &str, expected: impl Into<String>) -> Self {
        QueryError::InvalidFilterValue {
            column: column.to_string(),
            value: value.to_string(),
            expected: expected.into(),
        }
    }
}
