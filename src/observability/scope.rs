//! ObservationScope for begin/complete logging around a unit of work
//!
//! - Logs `{name}_BEGIN` on creation
//! - Logs `{name}_COMPLETE` on `complete()`
//! - Logs `{name}_FAILED` on `fail()`
//! - Logs `{name}_INCOMPLETE` if dropped without either

use std::time::Instant;

use super::logger::{Logger, Severity};

/// A scope that logs begin and end events
///
/// ```ignore
/// let scope = ObservationScope::with_fields("SORT_LOAD", &[("session", &id)]);
/// // ... load rows ...
/// scope.complete_with_fields(&[("rows", "42")]);
/// ```
pub struct ObservationScope {
    name: &'static str,
    completed: bool,
    fields: Vec<(&'static str, String)>,
    started: Instant,
}

impl ObservationScope {
    /// Create a new observation scope; logs `{name}_BEGIN`
    pub fn new(name: &'static str) -> Self {
        Self::with_fields(name, &[])
    }

    /// Create a scope whose fields are repeated on every event it logs
    pub fn with_fields(name: &'static str, fields: &[(&'static str, &str)]) -> Self {
        Logger::log(Severity::Info, &format!("{}_BEGIN", name), fields);
        Self {
            name,
            completed: false,
            fields: fields.iter().map(|(k, v)| (*k, v.to_string())).collect(),
            started: Instant::now(),
        }
    }

    fn emit(&self, severity: Severity, suffix: &str, extra: &[(&str, &str)]) {
        let elapsed = self.started.elapsed().as_millis().to_string();
        let mut all: Vec<(&str, &str)> =
            self.fields.iter().map(|(k, v)| (*k, v.as_str())).collect();
        all.push(("elapsed_ms", elapsed.as_str()));
        all.extend(extra.iter().copied());
        Logger::log(severity, &format!("{}_{}", self.name, suffix), &all);
    }

    /// Mark the scope as successfully completed
    pub fn complete(self) {
        self.complete_with_fields(&[]);
    }

    /// Mark the scope as completed with additional fields
    pub fn complete_with_fields(mut self, extra: &[(&str, &str)]) {
        self.completed = true;
        self.emit(Severity::Info, "COMPLETE", extra);
    }

    /// Mark the scope as failed; cancellations log at WARN
    pub fn fail(mut self, reason: &str, canceled: bool) {
        self.completed = true;
        let severity = if canceled { Severity::Warn } else { Severity::Error };
        self.emit(severity, "FAILED", &[("reason", reason)]);
    }

    /// Check if the scope has been completed
    pub fn is_completed(&self) -> bool {
        self.completed
    }
}

impl Drop for ObservationScope {
    fn drop(&mut self) {
        if !self.completed {
            self.emit(
                Severity::Warn,
                "INCOMPLETE",
                &[("reason", "scope dropped without completion")],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_lifecycle() {
        let scope = ObservationScope::with_fields("TEST", &[("key", "value")]);
        assert!(!scope.is_completed());
        scope.complete_with_fields(&[("rows", "1")]);
    }

    #[test]
    fn test_scope_fail_and_drop() {
        ObservationScope::new("TEST").fail("boom", false);
        ObservationScope::new("TEST").fail("canceled", true);
        drop(ObservationScope::new("TEST"));
    }
}
