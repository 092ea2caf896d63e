//! # Filter Clauses
//!
//! Typed filter operations produced by the translator and consumed by backends.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde_json::Value;

use crate::schema::ColumnType;

/// Filter operators (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    /// Equals (default when no operator is given)
    Eq,
    /// Not equals
    Neq,
    /// Greater than
    Gt,
    /// Greater than or equal
    Gte,
    /// Less than
    Lt,
    /// Less than or equal
    Lte,
    /// Pattern match, `%` any sequence, `_` any single character
    Like,
    /// Value in a comma-separated list
    In,
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 8] = [
        FilterOperator::Eq,
        FilterOperator::Neq,
        FilterOperator::Gt,
        FilterOperator::Gte,
        FilterOperator::Lt,
        FilterOperator::Lte,
        FilterOperator::Like,
        FilterOperator::In,
    ];

    /// Get the operator token as used in query strings and PostgREST filters
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Neq => "neq",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
            FilterOperator::Like => "like",
            FilterOperator::In => "in",
        }
    }

    /// Parse an operator token
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == token)
    }

    /// Whether this operator may be applied to a column of the given type
    pub fn applies_to(&self, column_type: ColumnType) -> bool {
        use FilterOperator::*;

        match column_type {
            ColumnType::Text => true,
            ColumnType::Integer | ColumnType::Float | ColumnType::Timestamp => *self != Like,
            ColumnType::Boolean => matches!(self, Eq | Neq | In),
            ColumnType::Json => matches!(self, Eq | Neq),
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A filter value, already coerced to the column's declared type
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Timestamp(DateTime<FixedOffset>),
    List(Vec<FilterValue>),
}

impl FilterValue {
    /// Render the value in PostgREST filter syntax.
    ///
    /// List elements that contain reserved characters are double-quoted.
    pub fn to_backend_literal(&self) -> String {
        match self {
            FilterValue::Text(s) => s.clone(),
            FilterValue::Integer(n) => n.to_string(),
            FilterValue::Float(n) => n.to_string(),
            FilterValue::Boolean(b) => b.to_string(),
            FilterValue::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            FilterValue::List(items) => {
                let rendered: Vec<String> = items
                    .iter()
                    .map(|item| {
                        let literal = item.to_backend_literal();
                        if literal.contains([',', '(', ')', '"', ' ']) {
                            format!("\"{}\"", literal.replace('\\', "\\\\").replace('"', "\\\""))
                        } else {
                            literal
                        }
                    })
                    .collect();
                format!("({})", rendered.join(","))
            }
        }
    }

    /// Compare a row value against this (scalar) filter value.
    ///
    /// Returns `None` when the two are not comparable, including SQL NULL.
    pub fn compare_to(&self, row_value: &Value) -> Option<Ordering> {
        match (self, row_value) {
            (_, Value::Null) => None,
            (FilterValue::Integer(n), Value::Number(v)) => match v.as_i64() {
                Some(v) => Some(v.cmp(n)),
                None => v.as_f64()?.partial_cmp(&(*n as f64)),
            },
            (FilterValue::Float(n), Value::Number(v)) => v.as_f64()?.partial_cmp(n),
            (FilterValue::Boolean(b), Value::Bool(v)) => Some(v.cmp(b)),
            (FilterValue::Timestamp(ts), Value::String(v)) => {
                let v = DateTime::parse_from_rfc3339(v).ok()?;
                Some(v.cmp(ts))
            }
            (FilterValue::Text(s), Value::String(v)) => Some(v.as_str().cmp(s.as_str())),
            // json columns compare on their serialized text
            (FilterValue::Text(s), other) => Some(other.to_string().as_str().cmp(s.as_str())),
            _ => None,
        }
    }
}

/// A single column/operator/value triple
#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    pub column: String,
    pub operator: FilterOperator,
    pub value: FilterValue,
}

impl FilterClause {
    pub fn new(column: impl Into<String>, operator: FilterOperator, value: FilterValue) -> Self {
        Self {
            column: column.into(),
            operator,
            value,
        }
    }

    /// Evaluate the clause against a row with SQL semantics (NULL never matches)
    pub fn matches(&self, row: &Value) -> bool {
        let field = match row.get(&self.column) {
            Some(v) if !v.is_null() => v,
            _ => return false,
        };

        match self.operator {
            FilterOperator::Eq => self.value.compare_to(field) == Some(Ordering::Equal),
            FilterOperator::Neq => matches!(
                self.value.compare_to(field),
                Some(Ordering::Less | Ordering::Greater)
            ),
            FilterOperator::Gt => self.value.compare_to(field) == Some(Ordering::Greater),
            FilterOperator::Gte => matches!(
                self.value.compare_to(field),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOperator::Lt => self.value.compare_to(field) == Some(Ordering::Less),
            FilterOperator::Lte => matches!(
                self.value.compare_to(field),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOperator::Like => match (&self.value, field.as_str()) {
                (FilterValue::Text(pattern), Some(text)) => like_match(text, pattern),
                _ => false,
            },
            FilterOperator::In => match &self.value {
                FilterValue::List(items) => items
                    .iter()
                    .any(|item| item.compare_to(field) == Some(Ordering::Equal)),
                _ => false,
            },
        }
    }
}

/// SQL LIKE matching: `%` matches any sequence, `_` one character
pub fn like_match(value: &str, pattern: &str) -> bool {
    let value: Vec<char> = value.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    let (mut v, mut p) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while v < value.len() {
        if p < pattern.len() && (pattern[p] == '_' || pattern[p] == value[v]) {
            v += 1;
            p += 1;
        } else if p < pattern.len() && pattern[p] == '%' {
            backtrack = Some((p, v));
            p += 1;
        } else if let Some((star_p, star_v)) = backtrack {
            p = star_p + 1;
            v = star_v + 1;
            backtrack = Some((star_p, star_v + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '%')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_eq_filter() {
        let filter = FilterClause::new(
            "status",
            FilterOperator::Eq,
            FilterValue::Text("pending".into()),
        );

        assert!(filter.matches(&json!({"status": "pending"})));
        assert!(!filter.matches(&json!({"status": "shipped"})));
        assert!(!filter.matches(&json!({"status": null})));
        assert!(!filter.matches(&json!({})));
    }

    #[test]
    fn test_numeric_comparisons() {
        let gt = FilterClause::new("total", FilterOperator::Gt, FilterValue::Integer(100));

        assert!(gt.matches(&json!({"total": 150})));
        assert!(!gt.matches(&json!({"total": 100})));
        assert!(gt.matches(&json!({"total": 100.5})));

        let lte = FilterClause::new("weight", FilterOperator::Lte, FilterValue::Float(2.5));
        assert!(lte.matches(&json!({"weight": 2.5})));
        assert!(!lte.matches(&json!({"weight": 2.51})));
    }

    #[test]
    fn test_neq_skips_null() {
        let filter = FilterClause::new("active", FilterOperator::Neq, FilterValue::Boolean(true));

        assert!(filter.matches(&json!({"active": false})));
        assert!(!filter.matches(&json!({"active": true})));
        assert!(!filter.matches(&json!({"active": null})));
    }

    #[test]
    fn test_timestamp_comparison() {
        let cutoff = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap();
        let filter = FilterClause::new(
            "created_at",
            FilterOperator::Gte,
            FilterValue::Timestamp(cutoff),
        );

        assert!(filter.matches(&json!({"created_at": "2024-03-01T10:00:00+07:00"})));
        assert!(!filter.matches(&json!({"created_at": "2023-12-31T23:59:59Z"})));
    }

    #[test]
    fn test_in_filter() {
        let filter = FilterClause::new(
            "status",
            FilterOperator::In,
            FilterValue::List(vec![
                FilterValue::Text("active".into()),
                FilterValue::Text("pending".into()),
            ]),
        );

        assert!(filter.matches(&json!({"status": "active"})));
        assert!(filter.matches(&json!({"status": "pending"})));
        assert!(!filter.matches(&json!({"status": "inactive"})));
    }

    #[test]
    fn test_like_patterns() {
        assert!(like_match("Johnson", "%son"));
        assert!(like_match("Wilson", "%son"));
        assert!(!like_match("Smith", "%son"));
        assert!(like_match("abc", "a_c"));
        assert!(like_match("abc", "%"));
        assert!(like_match("", "%"));
        assert!(!like_match("abc", "ab"));
        assert!(like_match("order-1234-vn", "order-%-vn"));
    }

    #[test]
    fn test_backend_literals() {
        let list = FilterValue::List(vec![
            FilterValue::Text("a".into()),
            FilterValue::Text("b,c".into()),
        ]);
        assert_eq!(list.to_backend_literal(), "(a,\"b,c\")");

        let ts = DateTime::parse_from_rfc3339("2024-05-01T08:30:00+07:00").unwrap();
        assert_eq!(
            FilterValue::Timestamp(ts).to_backend_literal(),
            "2024-05-01T08:30:00+07:00"
        );
        assert_eq!(FilterValue::Boolean(false).to_backend_literal(), "false");
    }

    #[test]
    fn test_operator_type_matrix() {
        assert!(FilterOperator::Like.applies_to(ColumnType::Text));
        assert!(!FilterOperator::Like.applies_to(ColumnType::Boolean));
        assert!(!FilterOperator::Like.applies_to(ColumnType::Integer));
        assert!(!FilterOperator::Gt.applies_to(ColumnType::Boolean));
        assert!(FilterOperator::In.applies_to(ColumnType::Boolean));
        assert!(!FilterOperator::In.applies_to(ColumnType::Json));
        assert!(FilterOperator::Gte.applies_to(ColumnType::Timestamp));
    }

    #[test]
    fn test_operator_tokens() {
        for op in FilterOperator::ALL {
            assert_eq!(FilterOperator::from_token(op.as_str()), Some(op));
        }
        assert_eq!(FilterOperator::from_token("ilike"), None);
        assert_eq!(FilterOperator::from_token("EQ"), None);
    }
}
