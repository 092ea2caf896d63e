//! tablegate - read-only, API-key-gated HTTP access to a managed database's tables
//!
//! One schema-driven endpoint serves every table: the table name is checked
//! against live introspection, query-string parameters are translated into a
//! validated structured query, and rows come back in a uniform envelope.

pub mod api;
pub mod backend;
pub mod cli;
pub mod config;
pub mod http_server;
pub mod observability;
pub mod query;
pub mod schema;
