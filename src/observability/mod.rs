//! Observability
//!
//! Structured JSON logging, typed lifecycle events and operation counters.
//! Observability is read-only: nothing here can change the outcome of an
//! operation, and a failed log write is swallowed.
//!
//! ```ignore
//! use snipreg::observability::{log_event_with_fields, Event, Logger};
//!
//! Logger::info("RECORD_CREATED", &[("record_id", "1")]);
//! log_event_with_fields(Event::OracleFallback, &[("voter", "alice")]);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Log a lifecycle event at its own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
