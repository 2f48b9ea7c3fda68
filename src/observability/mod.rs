//! Observability for scans and sorts
//!
//! - Structured logging (JSON lines, deterministic key order)
//! - Atomic counters
//! - Begin/complete scopes around sort phases
//!
//! Observability is read-only: it never changes what a scan or sort returns.
//!
//! ```ignore
//! use aeroscan::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::SortSpill, &[("run", "3"), ("bytes", "41943040")]);
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::ObservationScope;

/// Log an event at its own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log an event with fields at its own severity
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
