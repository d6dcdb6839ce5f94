//! Observability for sturgeon
//!
//! Lifecycle events and timed scopes, emitted through `tracing`. The
//! subscriber is installed once by the CLI; library code only emits.
//!
//! ```ignore
//! use sturgeon::observability::{log_event_with_fields, Event, ObservationScope};
//!
//! log_event_with_fields(Event::CollectionSkipped, &[("collection", "logs")]);
//!
//! let scope = ObservationScope::new("SCHEMA_BUILD");
//! // ... do work ...
//! scope.complete();
//! ```

mod events;
mod scope;

pub use events::Event;
pub use scope::{ObservationScope, Timer};

use tracing_subscriber::EnvFilter;

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let rendered = fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ");

    if event.is_fatal() {
        tracing::error!(event = %event, fields = %rendered);
    } else if event.is_failure() {
        tracing::warn!(event = %event, fields = %rendered);
    } else if event.is_verbose() {
        tracing::debug!(event = %event, fields = %rendered);
    } else {
        tracing::info!(event = %event, fields = %rendered);
    }
}

/// Install the global fmt subscriber, filtered by `RUST_LOG` (default `info`)
///
/// Calling it twice is harmless; the second call is ignored.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
