//! Schema resolution for tablegate
//!
//! Table names and column layouts come from backend introspection and are
//! cached for a bounded time. Nothing about a table is hard-coded.

mod errors;
mod resolver;
mod types;

pub use errors::{SchemaError, SchemaResult};
pub use resolver::{
    is_valid_identifier, ResolverConfig, SchemaResolver, DEFAULT_CACHE_TTL, DEFAULT_CALL_TIMEOUT,
};
pub use types::{ColumnDescriptor, ColumnType, TableSchema};
