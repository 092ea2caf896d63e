//! # Query Parameter Translator
//!
//! Turns raw query-string pairs into a validated [`QueryRequest`].
//!
//! Reserved parameters: `limit`, `offset`, `sort`, `select`, `count`, and the
//! legacy `order`/`desc` pair. Every other key is a filter of the form
//! `column` or `column__operator`. A bare `column` also accepts the
//! PostgREST value form `op.value` (`status=eq.pending`).
//!
//! Translation is all-or-nothing: the first invalid pair, in request order,
//! aborts the whole request.

use chrono::DateTime;

use crate::schema::{ColumnDescriptor, ColumnType, TableSchema};

use super::errors::{QueryError, TranslateResult};
use super::filter::{FilterClause, FilterOperator, FilterValue};
use super::request::{CountMode, PaginationLimits, QueryRequest, SortSpec};

const OPERATOR_SEPARATOR: &str = "__";

/// Query keys the backend reserves; a column with one of these names cannot
/// be filtered without being misread as pagination or projection.
const BACKEND_RESERVED_KEYS: [&str; 4] = ["select", "order", "limit", "offset"];

/// Translate raw query pairs against a resolved table schema
pub fn translate(
    schema: &TableSchema,
    params: &[(String, String)],
    limits: PaginationLimits,
) -> TranslateResult<QueryRequest> {
    let mut request = QueryRequest::new(schema.table.clone(), limits);
    let mut legacy_order: Option<String> = None;
    let mut legacy_desc = false;

    for (key, value) in params {
        match key.as_str() {
            "limit" => request.pagination.limit = parse_limit(value, limits)?,
            "offset" => request.pagination.offset = parse_offset(value)?,
            "sort" => request.sort = Some(parse_sort(schema, value)?),
            "select" => request.select = parse_select(schema, value)?,
            "count" => {
                let mode = CountMode::from_token(value.trim()).ok_or_else(|| {
                    QueryError::invalid_value("count", value, "one of exact, planned, estimated")
                })?;
                request.count = Some(mode);
            }
            "order" => {
                let column = require_column(schema, value.trim())?;
                legacy_order = Some(column.name.clone());
            }
            "desc" => legacy_desc = parse_bool("desc", value)?,
            _ => request.filters.push(parse_filter(schema, key, value)?),
        }
    }

    if request.sort.is_none() {
        request.sort = legacy_order.map(|column| SortSpec {
            column,
            descending: legacy_desc,
        });
    }

    Ok(request)
}

fn require_column<'a>(schema: &'a TableSchema, name: &str) -> TranslateResult<&'a ColumnDescriptor> {
    schema
        .column(name)
        .ok_or_else(|| QueryError::unknown_column(&schema.table, name))
}

fn parse_limit(value: &str, limits: PaginationLimits) -> TranslateResult<u64> {
    let limit: i64 = value.trim().parse().map_err(|_| {
        QueryError::InvalidPagination(format!("limit must be an integer, got '{}'", value))
    })?;

    if limit < 1 || limit as u64 > limits.max_limit {
        return Err(QueryError::InvalidPagination(format!(
            "limit must be between 1 and {}, got {}",
            limits.max_limit, limit
        )));
    }

    Ok(limit as u64)
}

fn parse_offset(value: &str) -> TranslateResult<u64> {
    let offset: i64 = value.trim().parse().map_err(|_| {
        QueryError::InvalidPagination(format!("offset must be an integer, got '{}'", value))
    })?;

    if offset < 0 {
        return Err(QueryError::InvalidPagination(format!(
            "offset must not be negative, got {}",
            offset
        )));
    }

    Ok(offset as u64)
}

fn parse_sort(schema: &TableSchema, value: &str) -> TranslateResult<SortSpec> {
    let value = value.trim();
    let (name, descending) = match value.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (value, false),
    };

    let column = require_column(schema, name)?;
    Ok(SortSpec {
        column: column.name.clone(),
        descending,
    })
}

/// `None` means every column. Every named column is checked even when `*`
/// is present.
fn parse_select(schema: &TableSchema, value: &str) -> TranslateResult<Option<Vec<String>>> {
    let mut columns: Vec<String> = Vec::new();
    let mut wildcard = false;

    for name in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if name == "*" {
            wildcard = true;
            continue;
        }
        let column = require_column(schema, name)?;
        if !columns.contains(&column.name) {
            columns.push(column.name.clone());
        }
    }

    if wildcard || columns.is_empty() {
        Ok(None)
    } else {
        Ok(Some(columns))
    }
}

fn parse_bool(column: &str, value: &str) -> TranslateResult<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(QueryError::invalid_value(column, value, "true or false")),
    }
}

fn parse_filter(schema: &TableSchema, key: &str, value: &str) -> TranslateResult<FilterClause> {
    // A key that names a column exactly is never split, so columns
    // containing the separator stay addressable.
    let (column, explicit_operator) = match schema.column(key) {
        Some(column) => (column, None),
        None => match key.rsplit_once(OPERATOR_SEPARATOR) {
            Some((name, token)) => (require_column(schema, name)?, Some(token)),
            None => return Err(QueryError::unknown_column(&schema.table, key)),
        },
    };

    let (operator, raw) = match explicit_operator {
        Some(token) => {
            let operator =
                FilterOperator::from_token(token).ok_or_else(|| QueryError::UnsupportedOperator {
                    column: column.name.clone(),
                    operator: token.to_string(),
                })?;
            (operator, value)
        }
        None => split_prefixed_value(value),
    };

    if BACKEND_RESERVED_KEYS.contains(&column.name.as_str())
        || !operator.applies_to(column.column_type)
    {
        return Err(QueryError::InvalidFilterOperator {
            column: column.name.clone(),
            operator,
            column_type: column.column_type,
        });
    }

    let value = match operator {
        FilterOperator::In => parse_list(column, raw)?,
        _ => parse_scalar(column, raw)?,
    };

    Ok(FilterClause::new(column.name.clone(), operator, value))
}

/// Split a PostgREST-style `op.value`; anything else is an `eq` value
fn split_prefixed_value(value: &str) -> (FilterOperator, &str) {
    if let Some((prefix, rest)) = value.split_once('.') {
        if let Some(operator) = FilterOperator::from_token(prefix) {
            return (operator, rest);
        }
    }
    (FilterOperator::Eq, value)
}

fn parse_list(column: &ColumnDescriptor, raw: &str) -> TranslateResult<FilterValue> {
    let inner = raw
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(raw);

    let items = inner
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|item| parse_scalar(column, item))
        .collect::<TranslateResult<Vec<_>>>()?;

    if items.is_empty() {
        return Err(QueryError::invalid_value(
            &column.name,
            raw,
            "a non-empty comma-separated list",
        ));
    }

    Ok(FilterValue::List(items))
}

fn parse_scalar(column: &ColumnDescriptor, raw: &str) -> TranslateResult<FilterValue> {
    let invalid = || QueryError::invalid_value(&column.name, raw, column.column_type.type_name());

    match column.column_type {
        ColumnType::Integer => raw
            .trim()
            .parse::<i64>()
            .map(FilterValue::Integer)
            .map_err(|_| invalid()),
        ColumnType::Float => match raw.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(FilterValue::Float(n)),
            _ => Err(invalid()),
        },
        ColumnType::Boolean => parse_bool(&column.name, raw).map(FilterValue::Boolean),
        ColumnType::Timestamp => DateTime::parse_from_rfc3339(raw.trim())
            .map(FilterValue::Timestamp)
            .map_err(|_| {
                QueryError::invalid_value(&column.name, raw, "an RFC 3339 timestamp")
            }),
        ColumnType::Text | ColumnType::Json => Ok(FilterValue::Text(raw.to_string())),
    }
}
