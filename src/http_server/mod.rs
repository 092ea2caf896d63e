//! # tablegate HTTP Server Module
//!
//! # Endpoints
//!
//! - `/health` - Health check, no key required
//! - `/api/meta/tables` - Queryable tables
//! - `/api/meta/schema/{table}` - Column layout of one table
//! - `/api/{table}` - Filtered, paginated rows

pub mod config;
pub mod observability_routes;
pub mod server;
pub mod table_routes;

pub use config::HttpServerConfig;
pub use server::{build_router, HttpServer};
