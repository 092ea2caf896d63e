//! Table schema definitions
//!
//! Supported column types:
//! - text: anything the backend does not report as one of the others
//! - integer: 64-bit signed integer
//! - float: 64-bit floating point
//! - boolean
//! - timestamp: RFC 3339 date-time
//! - json: opaque document, compared as text

use std::fmt;

use serde::{Deserialize, Serialize};

/// Declared column type, a closed set used for filter validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    Integer,
    Float,
    Boolean,
    Timestamp,
    Json,
}

impl ColumnType {
    /// Returns the type name used in responses and error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Boolean => "boolean",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Json => "json",
        }
    }

    /// Map a backend type name (Postgres type or OpenAPI format) onto the closed set.
    ///
    /// Unrecognised names fall back to `Text`.
    pub fn from_backend_type(name: &str) -> Self {
        let name = name.trim().to_ascii_lowercase();
        let base = name.split('(').next().unwrap_or("").trim();

        match base {
            "smallint" | "integer" | "bigint" | "int" | "int2" | "int4" | "int8" | "serial"
            | "bigserial" | "smallserial" => ColumnType::Integer,
            "real" | "double precision" | "numeric" | "decimal" | "float4" | "float8"
            | "number" => ColumnType::Float,
            "boolean" | "bool" => ColumnType::Boolean,
            "json" | "jsonb" => ColumnType::Json,
            b if b.starts_with("timestamp") || b.starts_with("time") || b == "date" => {
                ColumnType::Timestamp
            }
            _ => ColumnType::Text,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A single column of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// Introspected schema of one backend table.
///
/// Column order is the backend's ordinal order. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub table: String,
    pub columns: Vec<ColumnDescriptor>,
}

impl TableSchema {
    pub fn new(table: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            table: table.into(),
            columns,
        }
    }

    /// Look up a column by exact name
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_type_mapping() {
        assert_eq!(ColumnType::from_backend_type("bigint"), ColumnType::Integer);
        assert_eq!(ColumnType::from_backend_type("INT4"), ColumnType::Integer);
        assert_eq!(
            ColumnType::from_backend_type("double precision"),
            ColumnType::Float
        );
        assert_eq!(ColumnType::from_backend_type("numeric(10,2)"), ColumnType::Float);
        assert_eq!(ColumnType::from_backend_type("boolean"), ColumnType::Boolean);
        assert_eq!(
            ColumnType::from_backend_type("timestamp with time zone"),
            ColumnType::Timestamp
        );
        assert_eq!(ColumnType::from_backend_type("date"), ColumnType::Timestamp);
        assert_eq!(ColumnType::from_backend_type("jsonb"), ColumnType::Json);
        assert_eq!(
            ColumnType::from_backend_type("character varying"),
            ColumnType::Text
        );
        assert_eq!(ColumnType::from_backend_type("uuid"), ColumnType::Text);
    }

    #[test]
    fn test_column_lookup() {
        let schema = TableSchema::new(
            "orders",
            vec![
                ColumnDescriptor::new("id", ColumnType::Integer).not_null(),
                ColumnDescriptor::new("status", ColumnType::Text),
            ],
        );

        assert!(schema.column("id").is_some());
        assert!(schema.column("ID").is_none());
        assert_eq!(
            schema.column("status").map(|c| c.column_type),
            Some(ColumnType::Text)
        );
    }

    #[test]
    fn test_column_serialization() {
        let column = ColumnDescriptor::new("created_at", ColumnType::Timestamp).not_null();
        let json = serde_json::to_value(&column).unwrap();

        assert_eq!(json["name"], "created_at");
        assert_eq!(json["type"], "timestamp");
        assert_eq!(json["nullable"], false);
    }
}
