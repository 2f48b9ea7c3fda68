//! Metrics registry for scans and sorts
//!
//! - Counters only
//! - Monotonic increase
//! - Thread-safe, Relaxed ordering

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters shared through the query context
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    scans_opened: AtomicU64,
    rows_scanned: AtomicU64,
    sorts_executed: AtomicU64,
    rows_sorted: AtomicU64,
    spill_files: AtomicU64,
    spill_bytes: AtomicU64,
    merge_passes: AtomicU64,
    duplicates_suppressed: AtomicU64,
    cancellations: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Count an opened scan
    pub fn increment_scans_opened(&self) {
        self.scans_opened.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a row produced by a scan
    pub fn increment_rows_scanned(&self) {
        self.rows_scanned.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a started sort
    pub fn increment_sorts(&self) {
        self.sorts_executed.fetch_add(1, Ordering::Relaxed);
    }

    /// Count rows loaded into a sort
    pub fn add_rows_sorted(&self, rows: u64) {
        self.rows_sorted.fetch_add(rows, Ordering::Relaxed);
    }

    /// Count a spill file and its size
    pub fn record_spill(&self, bytes: u64) {
        self.spill_files.fetch_add(1, Ordering::Relaxed);
        self.spill_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Count an intermediate merge pass
    pub fn increment_merge_passes(&self) {
        self.merge_passes.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a dropped duplicate
    pub fn increment_duplicates_suppressed(&self) {
        self.duplicates_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    /// Count an observed cancellation
    pub fn increment_cancellations(&self) {
        self.cancellations.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            scans_opened: self.scans_opened.load(Ordering::Relaxed),
            rows_scanned: self.rows_scanned.load(Ordering::Relaxed),
            sorts_executed: self.sorts_executed.load(Ordering::Relaxed),
            rows_sorted: self.rows_sorted.load(Ordering::Relaxed),
            spill_files: self.spill_files.load(Ordering::Relaxed),
            spill_bytes: self.spill_bytes.load(Ordering::Relaxed),
            merge_passes: self.merge_passes.load(Ordering::Relaxed),
            duplicates_suppressed: self.duplicates_suppressed.load(Ordering::Relaxed),
            cancellations: self.cancellations.load(Ordering::Relaxed),
        }
    }

    /// Current values as a JSON object
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub scans_opened: u64,
    pub rows_scanned: u64,
    pub sorts_executed: u64,
    pub rows_sorted: u64,
    pub spill_files: u64,
    pub spill_bytes: u64,
    pub merge_passes: u64,
    pub duplicates_suppressed: u64,
    pub cancellations: u64,
}
