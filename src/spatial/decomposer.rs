//! Box decomposition into z-intervals
//!
//! The z-order trie is walked breadth first from the root cell. Cells
//! outside the query box are dropped, cells inside it are kept whole, and
//! cells that overlap it are split while the interval budget allows. The
//! result over-approximates the box; callers still filter rows exactly.

use std::collections::VecDeque;

use super::errors::{SpatialError, SpatialResult};
use super::space::{BoxRegion, Space, ZCell, ZInterval};
use crate::observability::{log_event_with_fields, Event};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Overlap {
    Outside,
    Inside,
    Partial,
}

/// Splits query boxes into at most `max_z` ordered z-intervals
#[derive(Debug, Clone)]
pub struct SpatialRangeDecomposer {
    space: Space,
    max_z: usize,
}

impl SpatialRangeDecomposer {
    pub fn new(space: Space, max_z: usize) -> SpatialResult<Self> {
        if max_z == 0 {
            return Err(SpatialError::InvalidMaxZ);
        }
        Ok(Self { space, max_z })
    }

    pub fn space(&self) -> &Space {
        &self.space
    }

    pub fn max_z(&self) -> usize {
        self.max_z
    }

    /// Disjoint intervals in increasing z order covering every point of `region`
    pub fn decompose(&self, region: &BoxRegion) -> SpatialResult<Vec<ZInterval>> {
        self.space.check_box(region)?;

        let mut done: Vec<ZCell> = Vec::new();
        let mut queue = VecDeque::from([ZCell::root()]);
        while let Some(cell) = queue.pop_front() {
            match self.classify(cell, region) {
                Overlap::Outside => {}
                Overlap::Inside => done.push(cell),
                Overlap::Partial => {
                    let splittable = cell.level < self.space.z_bits();
                    if splittable && done.len() + queue.len() + 2 <= self.max_z {
                        queue.extend(cell.children());
                    } else {
                        done.push(cell);
                    }
                }
            }
        }

        let mut intervals: Vec<ZInterval> =
            done.into_iter().map(|c| self.space.interval(c)).collect();
        intervals.sort();
        let intervals = coalesce(intervals);

        log_event_with_fields(
            Event::SpatialDecompose,
            &[
                ("intervals", &intervals.len().to_string()),
                ("max_z", &self.max_z.to_string()),
            ],
        );
        Ok(intervals)
    }

    fn classify(&self, cell: ZCell, region: &BoxRegion) -> Overlap {
        let mut inside = true;
        for (d, (lo, hi)) in self.space.cell_region(cell).into_iter().enumerate() {
            let box_lo = region.lo[d] as i128;
            let box_hi = region.hi[d] as i128;
            if hi < box_lo || lo > box_hi {
                return Overlap::Outside;
            }
            if lo < box_lo || hi > box_hi {
                inside = false;
            }
        }
        if inside {
            Overlap::Inside
        } else {
            Overlap::Partial
        }
    }
}

/// Merge sorted intervals that touch
fn coalesce(intervals: Vec<ZInterval>) -> Vec<ZInterval> {
    let mut merged: Vec<ZInterval> = Vec::with_capacity(intervals.len());
    for interval in intervals {
        match merged.last_mut() {
            Some(last) if last.hi.checked_add(1) == Some(interval.lo) => last.hi = interval.hi,
            _ => merged.push(interval),
        }
    }
    merged
}
