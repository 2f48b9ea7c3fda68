//! JSON-lines logger for scan and sort events
//!
//! Each line is one JSON object: the event fields plus `event` and
//! `severity`, keys sorted. Lines below the engine's `log_level` are
//! dropped. ERROR and FATAL lines go to stderr.

use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Log severity levels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Per-scan detail
    Trace = 0,
    /// Sort progress
    #[default]
    Info = 1,
    /// Cancellations and cleanup problems
    Warn = 2,
    /// Failed scans and sorts
    Error = 3,
    /// Spilled data failed validation
    Fatal = 4,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

static MIN_SEVERITY: AtomicU8 = AtomicU8::new(Severity::Info as u8);

/// Process-wide event log
pub struct Logger;

impl Logger {
    /// Drop lines below `level` from now on
    pub fn set_min_severity(level: Severity) {
        MIN_SEVERITY.store(level as u8, Ordering::Relaxed);
    }

    pub fn enabled(severity: Severity) -> bool {
        severity as u8 >= MIN_SEVERITY.load(Ordering::Relaxed)
    }

    /// Write one event line if `severity` passes the level
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if !Self::enabled(severity) {
            return;
        }
        let line = Self::format_line(severity, event, fields);
        // A lost log line never fails a scan or sort.
        let _ = if severity >= Severity::Error {
            io::stderr().lock().write_all(line.as_bytes())
        } else {
            io::stdout().lock().write_all(line.as_bytes())
        };
    }

    /// Render one log line, newline included. `event` and `severity` win
    /// over fields of the same name.
    pub fn format_line(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
        let mut object = Map::new();
        for (key, value) in fields {
            object.insert((*key).to_string(), Value::from(*value));
        }
        object.insert("event".to_string(), Value::from(event));
        object.insert("severity".to_string(), Value::from(severity.as_str()));
        let mut line = Value::Object(object).to_string();
        line.push('\n');
        line
    }
}
