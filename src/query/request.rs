//! Structured query request built by the translator.

use std::fmt;

use super::filter::FilterClause;

/// Default number of rows returned when `limit` is omitted
pub const DEFAULT_LIMIT: u64 = 50;

/// Maximum accepted `limit`
pub const MAX_LIMIT: u64 = 500;

/// Pagination bounds enforced by the translator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationLimits {
    pub default_limit: u64,
    pub max_limit: u64,
}

impl Default for PaginationLimits {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub column: String,
    pub descending: bool,
}

impl SortSpec {
    /// PostgREST `order` value, e.g. `created_at.desc`
    pub fn to_backend_order(&self) -> String {
        let direction = if self.descending { "desc" } else { "asc" };
        format!("{}.{}", self.column, direction)
    }
}

/// Total-count strategy requested through the `count` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountMode {
    Exact,
    Planned,
    Estimated,
}

impl CountMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CountMode::Exact => "exact",
            CountMode::Planned => "planned",
            CountMode::Estimated => "estimated",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "exact" => Some(CountMode::Exact),
            "planned" => Some(CountMode::Planned),
            "estimated" => Some(CountMode::Estimated),
            _ => None,
        }
    }
}

impl fmt::Display for CountMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully validated read query against one table.
///
/// Every table and column name in here has been checked against the table's
/// resolved schema.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub table: String,
    pub filters: Vec<FilterClause>,
    pub sort: Option<SortSpec>,
    pub pagination: Pagination,
    /// Projected columns; `None` selects every column
    pub select: Option<Vec<String>>,
    pub count: Option<CountMode>,
}

impl QueryRequest {
    /// Unfiltered request for the first page of a table
    pub fn new(table: impl Into<String>, limits: PaginationLimits) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
            sort: None,
            pagination: Pagination {
                limit: limits.default_limit,
                offset: 0,
            },
            select: None,
            count: None,
        }
    }

    /// PostgREST `select` value
    pub fn select_clause(&self) -> String {
        match &self.select {
            Some(columns) => columns.join(","),
            None => "*".to_string(),
        }
    }
}
