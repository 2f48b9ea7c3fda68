//! Per-segment scan states
//!
//! A `SegmentScanState` drives one key segment (column) of a composite scan.
//! Each state remembers the key bytes up to and including its own segment
//! (`current`) and how much of that is its parent's prefix. Probes are built
//! from those bytes:
//!
//! ```text
//! first key in subtree P        seek >= P
//! first key after subtree P     seek >= P ++ [FF]
//! last key in subtree P         seek <  P ++ [FF]
//! last key before subtree P     seek <  P
//! ```

use std::cmp::Ordering;

use crate::codec::key;
use crate::executor::ExecutionResult;
use crate::storage::{OrderedStore, SeekMode, TreeCursor};

/// One side of a range on a single segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentBound {
    /// Encoded segment
    pub bytes: Vec<u8>,
    pub inclusive: bool,
}

impl SegmentBound {
    pub fn new(bytes: Vec<u8>, inclusive: bool) -> Self {
        Self { bytes, inclusive }
    }

    fn admits_above(&self, segment: &[u8]) -> bool {
        match segment.cmp(&self.bytes) {
            Ordering::Greater => true,
            Ordering::Equal => self.inclusive,
            Ordering::Less => false,
        }
    }

    fn admits_below(&self, segment: &[u8]) -> bool {
        match segment.cmp(&self.bytes) {
            Ordering::Less => true,
            Ordering::Equal => self.inclusive,
            Ordering::Greater => false,
        }
    }
}

/// Result of repositioning a state at a target value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpOutcome {
    /// Positioned on the target itself
    Exact,
    /// Positioned on the first qualifying value after the target
    Beyond,
    /// Nothing at or after the target within this segment's parent
    Exhausted,
}

/// Variant-specific data of a scan state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanKind {
    /// Constrained to exactly one value (equality prefix)
    SingleValue { ascending: bool, value: Vec<u8> },
    /// Carries the one inequality, or no bound at all for ordered columns
    RangeBounded {
        ascending: bool,
        lo: Option<SegmentBound>,
        hi: Option<SegmentBound>,
    },
    /// Every remaining segment, traversed ascending as a unit
    UnboundedSubtree,
}

/// Traversal state for one segment of a composite key
#[derive(Debug, Clone)]
pub struct SegmentScanState {
    field: usize,
    kind: ScanKind,
    prefix_len: usize,
    current: Vec<u8>,
}

impl SegmentScanState {
    fn with_kind(field: usize, kind: ScanKind) -> Self {
        Self {
            field,
            kind,
            prefix_len: 0,
            current: Vec::new(),
        }
    }

    /// State pinned to one encoded value
    pub fn single_value(field: usize, ascending: bool, value: Vec<u8>) -> Self {
        Self::with_kind(field, ScanKind::SingleValue { ascending, value })
    }

    /// State constrained to a range of encoded values
    pub fn range(
        field: usize,
        ascending: bool,
        lo: Option<SegmentBound>,
        hi: Option<SegmentBound>,
    ) -> Self {
        Self::with_kind(field, ScanKind::RangeBounded { ascending, lo, hi })
    }

    /// State visiting every value of an ordered column
    pub fn unbounded(field: usize, ascending: bool) -> Self {
        Self::range(field, ascending, None, None)
    }

    /// Catch-all state for every segment from `field` on
    pub fn remaining(field: usize) -> Self {
        Self::with_kind(field, ScanKind::UnboundedSubtree)
    }

    /// Index column this state drives
    pub fn field(&self) -> usize {
        self.field
    }

    /// Variant data
    pub fn kind(&self) -> &ScanKind {
        &self.kind
    }

    /// True for the remaining-segments state
    pub fn is_remaining(&self) -> bool {
        matches!(self.kind, ScanKind::UnboundedSubtree)
    }

    /// Key bytes through this state's segment at its last position
    pub fn current(&self) -> &[u8] {
        &self.current
    }

    fn ascending(&self) -> bool {
        match self.kind {
            ScanKind::SingleValue { ascending, .. } | ScanKind::RangeBounded { ascending, .. } => {
                ascending
            }
            ScanKind::UnboundedSubtree => true,
        }
    }

    fn within_bounds(&self, segment: &[u8]) -> bool {
        match &self.kind {
            ScanKind::SingleValue { value, .. } => segment == value.as_slice(),
            ScanKind::RangeBounded { lo, hi, .. } => {
                lo.as_ref().map_or(true, |b| b.admits_above(segment))
                    && hi.as_ref().map_or(true, |b| b.admits_below(segment))
            }
            ScanKind::UnboundedSubtree => true,
        }
    }

    /// Take the traversal's position if it lies under `parent` and within
    /// bounds
    fn accept<S: OrderedStore>(
        &mut self,
        traversal: &TreeCursor<S>,
        parent: &[u8],
    ) -> ExecutionResult<bool> {
        let key_bytes = match traversal.key() {
            Some(k) => k,
            None => return Ok(false),
        };
        if !key_bytes.starts_with(parent) {
            return Ok(false);
        }
        // The remaining state may find nothing past its parent on keys
        // without a row suffix.
        let end = match self.kind {
            ScanKind::UnboundedSubtree => key_bytes.len(),
            _ if key_bytes.len() == parent.len() => return Ok(false),
            _ => parent.len() + key::segment_len(key_bytes, parent.len())?,
        };
        if !self.within_bounds(&key_bytes[parent.len()..end]) {
            return Ok(false);
        }
        self.prefix_len = parent.len();
        self.current.clear();
        self.current.extend_from_slice(&key_bytes[..end]);
        Ok(true)
    }

    fn concat(parent: &[u8], tail: &[u8]) -> Vec<u8> {
        let mut seek_key = Vec::with_capacity(parent.len() + tail.len() + 1);
        seek_key.extend_from_slice(parent);
        seek_key.extend_from_slice(tail);
        seek_key
    }

    /// Position on the first qualifying value under `parent`, in this
    /// state's direction. Returns false if there is none.
    pub fn start_scan<S: OrderedStore>(
        &mut self,
        traversal: &mut TreeCursor<S>,
        parent: &[u8],
    ) -> ExecutionResult<bool> {
        let (seek_key, mode) = match &self.kind {
            ScanKind::SingleValue { value, .. } => (Self::concat(parent, value), SeekMode::Gte),
            ScanKind::RangeBounded {
                ascending: true,
                lo,
                ..
            } => match lo {
                None => (parent.to_vec(), SeekMode::Gte),
                Some(b) if b.inclusive => (Self::concat(parent, &b.bytes), SeekMode::Gte),
                Some(b) => (key::after_prefix(&Self::concat(parent, &b.bytes)), SeekMode::Gte),
            },
            ScanKind::RangeBounded {
                ascending: false,
                hi,
                ..
            } => match hi {
                None => (key::after_prefix(parent), SeekMode::Lt),
                Some(b) if b.inclusive => {
                    (key::after_prefix(&Self::concat(parent, &b.bytes)), SeekMode::Lt)
                }
                Some(b) => (Self::concat(parent, &b.bytes), SeekMode::Lt),
            },
            ScanKind::UnboundedSubtree => (parent.to_vec(), SeekMode::Gte),
        };
        traversal.seek(&seek_key, mode)?;
        self.accept(traversal, parent)
    }

    /// Step to the next qualifying value under the same parent. Returns
    /// false once the step leaves the parent or the range.
    pub fn advance<S: OrderedStore>(
        &mut self,
        traversal: &mut TreeCursor<S>,
    ) -> ExecutionResult<bool> {
        let parent = self.current[..self.prefix_len].to_vec();
        match self.kind {
            ScanKind::SingleValue { .. } => return Ok(false),
            ScanKind::RangeBounded { ascending: true, .. } => {
                traversal.seek(&key::after_prefix(&self.current), SeekMode::Gte)?;
            }
            ScanKind::RangeBounded { ascending: false, .. } => {
                traversal.seek(&self.current, SeekMode::Lt)?;
            }
            ScanKind::UnboundedSubtree => {
                traversal.seek(&self.current, SeekMode::Gt)?;
            }
        }
        self.accept(traversal, &parent)
    }

    /// Position at `target` (encoded segments for this state) under `parent`,
    /// or at the first qualifying value past it
    pub fn jump<S: OrderedStore>(
        &mut self,
        traversal: &mut TreeCursor<S>,
        parent: &[u8],
        target: &[u8],
    ) -> ExecutionResult<JumpOutcome> {
        let ascending = self.ascending();
        // Order of target relative to v in scan direction
        let directed = |v: &[u8]| {
            let ord = target.cmp(v);
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        };

        let restart = match &self.kind {
            ScanKind::SingleValue { value, .. } => match directed(value) {
                Ordering::Equal => {
                    return Ok(if self.start_scan(traversal, parent)? {
                        JumpOutcome::Exact
                    } else {
                        JumpOutcome::Exhausted
                    })
                }
                Ordering::Less => true,
                Ordering::Greater => return Ok(JumpOutcome::Exhausted),
            },
            ScanKind::RangeBounded { lo, hi, .. } => {
                // Target ahead of the first bound in scan direction
                let first = if ascending { lo } else { hi };
                match first {
                    Some(b) => match directed(&b.bytes) {
                        Ordering::Less => true,
                        Ordering::Equal => !b.inclusive,
                        Ordering::Greater => false,
                    },
                    None => false,
                }
            }
            ScanKind::UnboundedSubtree => false,
        };
        if restart {
            return Ok(if self.start_scan(traversal, parent)? {
                JumpOutcome::Beyond
            } else {
                JumpOutcome::Exhausted
            });
        }

        let seek_key = Self::concat(parent, target);
        if ascending {
            traversal.seek(&seek_key, SeekMode::Gte)?;
        } else {
            traversal.seek(&key::after_prefix(&seek_key), SeekMode::Lt)?;
        }
        if !self.accept(traversal, parent)? {
            return Ok(JumpOutcome::Exhausted);
        }
        let exact = match self.kind {
            ScanKind::UnboundedSubtree => {
                traversal.key().map_or(false, |k| k.starts_with(&seek_key))
            }
            _ => self.current == seek_key,
        };
        Ok(if exact {
            JumpOutcome::Exact
        } else {
            JumpOutcome::Beyond
        })
    }
}
