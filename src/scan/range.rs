//! Key ranges over composite index keys

use crate::codec::key::segment_to_vec;
use crate::executor::{ExecutionError, ExecutionResult};
use crate::index::IndexDef;
use crate::types::Value;

/// A range over the leading columns of an index.
///
/// `bound_columns` is the longer of the two bounds. The first
/// `bound_columns - 1` columns form the equality prefix and must agree
/// between `lo` and `hi`. The last bound column carries the inequality; a
/// bound one column shorter leaves that side open.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyRange {
    lo: Vec<Value>,
    hi: Vec<Value>,
    lo_inclusive: bool,
    hi_inclusive: bool,
}

impl Default for KeyRange {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl KeyRange {
    /// The whole key space
    pub fn unbounded() -> Self {
        Self {
            lo: Vec::new(),
            hi: Vec::new(),
            lo_inclusive: true,
            hi_inclusive: true,
        }
    }

    /// Range between two bound rows.
    ///
    /// Bounds whose lengths differ by more than one column are rejected with
    /// `AERO_SCAN_INVALID_BOUNDS`.
    pub fn new(
        lo: Vec<Value>,
        lo_inclusive: bool,
        hi: Vec<Value>,
        hi_inclusive: bool,
    ) -> ExecutionResult<Self> {
        if lo.len().abs_diff(hi.len()) > 1 {
            return Err(ExecutionError::invalid_bounds(format!(
                "bounds differ by more than one column ({} vs {})",
                lo.len(),
                hi.len()
            )));
        }
        Ok(Self {
            lo,
            hi,
            lo_inclusive,
            hi_inclusive,
        })
    }

    /// Every key equal to `values` on its leading columns
    pub fn point(values: Vec<Value>) -> Self {
        Self {
            lo: values.clone(),
            hi: values,
            lo_inclusive: true,
            hi_inclusive: true,
        }
    }

    /// Equality on `prefix` followed by an optional inequality on the next
    /// column. Each side is `(value, inclusive)`.
    pub fn with_prefix(
        prefix: Vec<Value>,
        lo: Option<(Value, bool)>,
        hi: Option<(Value, bool)>,
    ) -> Self {
        let mut range = Self::point(prefix);
        if let Some((value, inclusive)) = lo {
            range.lo.push(value);
            range.lo_inclusive = inclusive;
        }
        if let Some((value, inclusive)) = hi {
            range.hi.push(value);
            range.hi_inclusive = inclusive;
        }
        range
    }

    /// Keys whose first column is at or above (or strictly above) `value`
    pub fn at_least(value: Value, inclusive: bool) -> Self {
        Self::with_prefix(Vec::new(), Some((value, inclusive)), None)
    }

    /// Keys whose first column is at or below (or strictly below) `value`
    pub fn at_most(value: Value, inclusive: bool) -> Self {
        Self::with_prefix(Vec::new(), None, Some((value, inclusive)))
    }

    /// Number of leading columns constrained by the range
    pub fn bound_columns(&self) -> usize {
        self.lo.len().max(self.hi.len())
    }

    /// Returns true if neither side constrains anything
    pub fn is_unbounded(&self) -> bool {
        self.bound_columns() == 0
    }

    pub fn lo(&self) -> &[Value] {
        &self.lo
    }

    pub fn hi(&self) -> &[Value] {
        &self.hi
    }

    pub fn lo_inclusive(&self) -> bool {
        self.lo_inclusive
    }

    pub fn hi_inclusive(&self) -> bool {
        self.hi_inclusive
    }

    /// Check the range against an index
    pub fn validate(&self, index: &IndexDef) -> ExecutionResult<()> {
        let bound_columns = self.bound_columns();
        if bound_columns > index.column_count() {
            return Err(ExecutionError::invalid_bounds(format!(
                "range binds {} columns, index {} has {}",
                bound_columns,
                index.name,
                index.column_count()
            )));
        }
        if self.lo.len().abs_diff(self.hi.len()) > 1 {
            return Err(ExecutionError::invalid_bounds("bounds differ by more than one column"));
        }
        for (i, column) in index.columns.iter().enumerate().take(bound_columns.saturating_sub(1)) {
            let lo = segment_to_vec(&self.lo[i], column.collation);
            let hi = segment_to_vec(&self.hi[i], column.collation);
            if lo != hi {
                return Err(ExecutionError::invalid_bounds(format!(
                    "equality column {} has low bound {} and high bound {}",
                    column.name, self.lo[i], self.hi[i]
                )));
            }
        }
        Ok(())
    }
}
