//! Subscriber installation
//!
//! Kept in its own test binary: `init` installs the process-global
//! subscriber, which would otherwise leak log output into unrelated tests.

use tablegate::observability::{self, Event, LogFormat};

#[test]
fn init_is_idempotent() {
    observability::init(LogFormat::Pretty);
    observability::init(LogFormat::Json);

    tracing::info!(event = %Event::BootStart, "subscriber installed once");
}
