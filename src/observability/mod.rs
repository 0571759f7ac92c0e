//! Observability for chartstep
//!
//! - Structured JSON logging with a process-wide minimum severity
//! - Typed lifecycle events
//! - Begin/complete scopes around each stage
//!
//! Observability is read-only: nothing here changes what an operation or
//! stage produces.
//!
//! ```ignore
//! use chartstep::observability::{log_event, Event, ObservationScope};
//!
//! log_event(Event::NoMatch, &[("op", "retrieveValue"), ("target", "2030")]);
//!
//! let scope = ObservationScope::with_fields("STAGE", &[("stage", "s1")]);
//! scope.complete();
//! ```

mod events;
mod logger;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use scope::{ObservationScope, Timer};

/// Log a lifecycle event at its own severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
