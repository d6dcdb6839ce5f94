//! ObservationScope for automatic begin/complete logging
//!
//! - Logs `{name}_BEGIN` on creation
//! - Logs `{name}_COMPLETE` with the elapsed time on `complete()`
//! - Logs `{name}_FAILED` on `fail()`
//! - Logs `{name}_INCOMPLETE` on drop if neither was called

use std::time::Instant;

/// A scope that logs its own start, end and duration
///
/// ```ignore
/// let scope = ObservationScope::with_fields("DOCUMENT_TYPE", &[("collection", "sensors")]);
/// // ... build ...
/// scope.complete(); // DOCUMENT_TYPE_COMPLETE collection=sensors elapsed_ms=3
/// ```
pub struct ObservationScope<'a> {
    name: &'a str,
    completed: bool,
    fields: Vec<(&'a str, String)>,
    timer: Timer,
}

impl<'a> ObservationScope<'a> {
    /// Create a new observation scope, logging `{name}_BEGIN` at debug level
    pub fn new(name: &'a str) -> Self {
        Self::with_fields(name, &[])
    }

    /// Create a new observation scope with fields repeated on every line
    pub fn with_fields(name: &'a str, fields: &[(&'a str, &str)]) -> Self {
        let fields: Vec<(&'a str, String)> =
            fields.iter().map(|(k, v)| (*k, v.to_string())).collect();
        tracing::debug!(event = %format!("{}_BEGIN", name), fields = %render(&fields, &[]));

        Self {
            name,
            completed: false,
            fields,
            timer: Timer::new(),
        }
    }

    /// Mark the scope as successfully completed
    pub fn complete(self) {
        self.complete_with_fields(&[]);
    }

    /// Mark the scope as successfully completed with additional fields
    pub fn complete_with_fields(mut self, extra_fields: &[(&str, &str)]) {
        self.completed = true;
        tracing::info!(
            event = %format!("{}_COMPLETE", self.name),
            elapsed_ms = self.timer.elapsed_ms(),
            fields = %render(&self.fields, extra_fields),
        );
    }

    /// Mark the scope as failed with a reason
    pub fn fail(mut self, reason: &str) {
        self.completed = true;
        tracing::error!(
            event = %format!("{}_FAILED", self.name),
            elapsed_ms = self.timer.elapsed_ms(),
            reason = %reason,
            fields = %render(&self.fields, &[]),
        );
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }
}

impl Drop for ObservationScope<'_> {
    fn drop(&mut self) {
        if !self.completed {
            tracing::warn!(
                event = %format!("{}_INCOMPLETE", self.name),
                reason = "scope dropped without completion",
                fields = %render(&self.fields, &[]),
            );
        }
    }
}

fn render(fields: &[(&str, String)], extra: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| (*k, v.as_str()))
        .chain(extra.iter().copied())
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}

/// A simple duration timer for logging elapsed time
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed whole milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
