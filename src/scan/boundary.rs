//! Materialized first/last-row checks for unique index scans
//!
//! A unique index keys only its leading columns and carries the rest in the
//! entry value, so segment states cannot enforce bounds on those trailing
//! columns. Boundaries compare whole rows in scan order instead. The check
//! against the start boundary is monotonic: once a row passes it, every later
//! row does too.

use std::cmp::Ordering;

use super::range::KeyRange;
use crate::codec::key::segment_to_vec;
use crate::codec::Collation;
use crate::types::{Row, RowSource, Value};

/// Per-column encoding and direction of a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOrder {
    collations: Vec<Collation>,
    ascending: Vec<bool>,
}

impl ScanOrder {
    pub fn new(collations: Vec<Collation>, ascending: Vec<bool>) -> Self {
        Self {
            collations,
            ascending,
        }
    }

    pub fn collation(&self, field: usize) -> Collation {
        self.collations.get(field).copied().unwrap_or_default()
    }

    /// Columns outside the ordering scan ascending
    pub fn ascending(&self, field: usize) -> bool {
        self.ascending.get(field).copied().unwrap_or(true)
    }

    pub fn encode(&self, field: usize, value: &Value) -> Vec<u8> {
        segment_to_vec(value, self.collation(field))
    }
}

/// A bound row in encoded form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary {
    segments: Vec<Vec<u8>>,
    inclusive: bool,
}

impl Boundary {
    /// Encode `values` as a boundary over the leading columns
    pub fn new(values: &[Value], inclusive: bool, order: &ScanOrder) -> Self {
        Self {
            segments: values.iter().enumerate().map(|(i, v)| order.encode(i, v)).collect(),
            inclusive,
        }
    }

    /// Number of columns compared
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Position of `row` relative to the boundary in scan order
    fn compare(&self, row: &Row, order: &ScanOrder) -> Ordering {
        for (field, segment) in self.segments.iter().enumerate() {
            if field >= row.field_count() {
                break;
            }
            let ord = order.encode(field, row.value(field)).cmp(segment);
            let ord = if order.ascending(field) { ord } else { ord.reverse() };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// True if `row` comes before a start boundary
    pub fn is_before_start(&self, row: &Row, order: &ScanOrder) -> bool {
        match self.compare(row, order) {
            Ordering::Less => true,
            Ordering::Equal => !self.inclusive,
            Ordering::Greater => false,
        }
    }

    /// True if `row` comes after an end boundary
    pub fn is_past_end(&self, row: &Row, order: &ScanOrder) -> bool {
        match self.compare(row, order) {
            Ordering::Greater => true,
            Ordering::Equal => !self.inclusive,
            Ordering::Less => false,
        }
    }
}

/// Start and end boundaries of `range` in scan order.
///
/// A bound shorter than the range is open on the last column, so only its
/// prefix is compared and it always admits equality. When the last bound
/// column scans descending the high bound is met first.
pub fn range_boundaries(
    range: &KeyRange,
    order: &ScanOrder,
) -> (Option<Boundary>, Option<Boundary>) {
    let bound_columns = range.bound_columns();
    if bound_columns == 0 {
        return (None, None);
    }
    let side = |values: &[Value], inclusive: bool| {
        if values.is_empty() {
            None
        } else {
            Some(Boundary::new(values, inclusive || values.len() < bound_columns, order))
        }
    };
    let lo = side(range.lo(), range.lo_inclusive());
    let hi = side(range.hi(), range.hi_inclusive());
    if order.ascending(bound_columns - 1) {
        (lo, hi)
    } else {
        (hi, lo)
    }
}
