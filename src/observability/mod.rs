//! Observability subsystem for tablegate
//!
//! Structured logs through `tracing`. Every event is tagged with a typed
//! [`Event`] name so log lines stay greppable across releases.
//!
//! # Usage
//!
//! ```ignore
//! use tablegate::observability::{self, Event, LogFormat};
//!
//! observability::init(LogFormat::Json);
//! tracing::info!(event = %Event::QueryExecuted, table = "orders", rows = 10);
//! ```

mod events;

pub use events::Event;

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, EnvFilter};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,tower_http=info";

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Human-readable, for local runs
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(format!("unknown log format '{}', expected json or pretty", other)),
        }
    }
}

/// Install the global subscriber.
///
/// Safe to call more than once; later calls are ignored.
pub fn init(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = fmt().with_env_filter(filter).with_target(false);
    let _ = match format {
        LogFormat::Json => builder.json().flatten_event(true).try_init(),
        LogFormat::Pretty => builder.try_init(),
    };
}
