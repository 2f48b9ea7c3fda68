//! Observable scan and sort events
//!
//! Events are explicit and typed. Per-row activity is counted in
//! `MetricsRegistry`, never logged.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Engine configuration accepted
    ConfigLoaded,

    // Scans
    /// Ordered scan opened
    ScanOpen,
    /// Scan could not be opened
    ScanOpenFailed,
    /// Scan failed while stepping
    ScanFailed,
    /// Box decomposed into z-intervals
    SpatialDecompose,

    // Sorts
    /// Sort load phase begins
    SortBegin,
    /// In-memory run written to a spill file
    SortSpill,
    /// Intermediate merge pass written
    SortMergePass,
    /// Sort output ready
    SortComplete,
    /// Sort failed
    SortFailed,
    /// Spill run failed validation
    SortRunCorruption,

    // Lifecycle
    /// Query canceled by the caller
    QueryCanceled,
    /// Temp file could not be removed
    TempFileCleanupFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::ScanOpen => "SCAN_OPEN",
            Event::ScanOpenFailed => "SCAN_OPEN_FAILED",
            Event::ScanFailed => "SCAN_FAILED",
            Event::SpatialDecompose => "SPATIAL_DECOMPOSE",

            Event::SortBegin => "SORT_BEGIN",
            Event::SortSpill => "SORT_SPILL",
            Event::SortMergePass => "SORT_MERGE_PASS",
            Event::SortComplete => "SORT_COMPLETE",
            Event::SortFailed => "SORT_FAILED",
            Event::SortRunCorruption => "SORT_RUN_CORRUPTION",

            Event::QueryCanceled => "QUERY_CANCELED",
            Event::TempFileCleanupFailed => "TEMP_FILE_CLEANUP_FAILED",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::SortRunCorruption)
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::SortRunCorruption => Severity::Fatal,
            Event::ScanOpenFailed | Event::ScanFailed | Event::SortFailed => Severity::Error,
            Event::TempFileCleanupFailed => Severity::Warn,
            Event::ScanOpen | Event::SpatialDecompose => Severity::Trace,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_events_have_string_representation() {
        let events = [
            Event::ConfigLoaded,
            Event::ScanOpen,
            Event::ScanOpenFailed,
            Event::ScanFailed,
            Event::SpatialDecompose,
            Event::SortBegin,
            Event::SortSpill,
            Event::SortMergePass,
            Event::SortComplete,
            Event::SortFailed,
            Event::SortRunCorruption,
            Event::QueryCanceled,
            Event::TempFileCleanupFailed,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_severities() {
        assert!(Event::SortRunCorruption.is_fatal());
        assert_eq!(Event::SortRunCorruption.severity(), Severity::Fatal);
        assert_eq!(Event::SortFailed.severity(), Severity::Error);
        assert_eq!(Event::SortSpill.severity(), Severity::Info);
        assert!(!Event::QueryCanceled.is_fatal());
    }
}
