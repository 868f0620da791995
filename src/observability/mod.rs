//! Observability for the sync engine
//!
//! - Structured logging (JSON lines)
//! - Typed lifecycle events
//! - Monotonic counters
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on indexing or propagation
//! 3. No background threads
//!
//! # Usage
//!
//! ```ignore
//! use ghostnodes::observability::{Event, Logger, Severity};
//!
//! let logger = Logger::new(Severity::Info);
//! logger.info(Event::GhostPropagated.as_str(), &[("siblings", "2")]);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{EngineMetrics, MetricsSnapshot};

/// Log a lifecycle event with fields, FATAL for fatal events
pub fn log_event(logger: &Logger, event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_fatal() {
        Severity::Fatal
    } else {
        Severity::Info
    };
    logger.log(severity, event.as_str(), fields);
}
