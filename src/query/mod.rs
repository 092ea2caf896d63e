//! # Query Parameter Translation
//!
//! Pure translation of an HTTP query string into a structured, schema-checked
//! read request. Nothing in here touches the network.

pub mod errors;
pub mod filter;
pub mod request;
pub mod translator;

pub use errors::{QueryError, TranslateResult};
pub use filter::{FilterClause, FilterOperator, FilterValue};
pub use request::{
    CountMode, Pagination, PaginationLimits, QueryRequest, SortSpec, DEFAULT_LIMIT, MAX_LIMIT,
};
pub use translator::translate;
