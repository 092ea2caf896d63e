//! Observable events for tablegate
//!
//! Every log line carries an `event` field naming one of these.
//! Events are explicit and typed.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Boot & Lifecycle
    /// Startup begins
    BootStart,
    /// Configuration loaded and validated
    ConfigLoaded,
    /// Configuration rejected, startup aborted
    ConfigInvalid,
    /// Listener bound, ready for requests
    Serving,
    /// Shutdown signal received
    ShutdownStart,
    /// Listener closed
    ShutdownComplete,

    // Auth
    /// Request refused by the API key gate
    AuthRejected,

    // Schema
    /// Table list fetched from the backend
    TablesResolved,
    /// Table schema fetched from the backend
    SchemaResolved,
    /// Cache cleared and refetched on request
    SchemaRefreshed,
    /// Introspection call failed
    IntrospectionFailed,

    // Query
    /// Table query received
    QueryReceived,
    /// Query parameters rejected by the translator
    QueryRejected,
    /// Query executed and envelope produced
    QueryExecuted,
    /// Backend execution failed
    QueryFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            // Boot & Lifecycle
            Event::BootStart => "TABLEGATE_STARTUP_BEGIN",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ConfigInvalid => "CONFIG_INVALID",
            Event::Serving => "TABLEGATE_SERVING",
            Event::ShutdownStart => "SHUTDOWN_START",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",

            // Auth
            Event::AuthRejected => "AUTH_REJECTED",

            // Schema
            Event::TablesResolved => "TABLES_RESOLVED",
            Event::SchemaResolved => "SCHEMA_RESOLVED",
            Event::SchemaRefreshed => "SCHEMA_REFRESHED",
            Event::IntrospectionFailed => "INTROSPECTION_FAILED",

            // Query
            Event::QueryReceived => "QUERY_BEGIN",
            Event::QueryRejected => "QUERY_REJECTED",
            Event::QueryExecuted => "QUERY_COMPLETE",
            Event::QueryFailed => "QUERY_FAILED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
