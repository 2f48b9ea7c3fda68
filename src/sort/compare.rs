//! Direction-grouped key comparison
//!
//! Consecutive segments with the same direction form a group. Groups compare
//! byte-lexicographically over their segments (segments are prefix-free, so
//! this equals comparing the concatenated bytes), reversed for descending
//! groups. The first unequal group decides.

use std::cmp::Ordering;
use std::ops::Range;

use super::key::SortKey;

/// Compares sort keys under per-segment directions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyComparator {
    groups: Vec<(Range<usize>, bool)>,
}

impl KeyComparator {
    pub fn new(directions: &[bool]) -> Self {
        let mut groups: Vec<(Range<usize>, bool)> = Vec::new();
        for (i, ascending) in directions.iter().enumerate() {
            match groups.last_mut() {
                Some((range, dir)) if *dir == *ascending => range.end = i + 1,
                _ => groups.push((i..i + 1, *ascending)),
            }
        }
        Self { groups }
    }

    /// Number of direction groups
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn compare_segments(&self, a: &[Vec<u8>], b: &[Vec<u8>]) -> Ordering {
        for (range, ascending) in &self.groups {
            let end = range.end.min(a.len()).min(b.len());
            let start = range.start.min(end);
            let ord = a[start..end].cmp(&b[start..end]);
            let ord = if *ascending { ord } else { ord.reverse() };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    pub fn compare(&self, a: &SortKey, b: &SortKey) -> Ordering {
        self.compare_segments(a.segments(), b.segments())
    }

    /// Returns true if the keys compare equal
    pub fn same_key(&self, a: &SortKey, b: &SortKey) -> bool {
        self.compare(a, b) == Ordering::Equal
    }
}
