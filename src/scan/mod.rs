//! Ordered index scans
//!
//! - `KeyRange`: equality prefix plus one inequality over leading columns
//! - `SegmentScanState`: traversal of one key segment
//! - `MixedOrderCursor`: composite scan with per-column directions
//!
//! ```ignore
//! let range = KeyRange::with_prefix(vec![Value::Int(1)], Some((Value::Int(3), false)), None);
//! let mut cursor = MixedOrderCursor::new(store, index, range, vec![true, false], context);
//! cursor.open()?;
//! while let Some(row) = cursor.next()? { /* ... */ }
//! ```

mod boundary;
mod mixed;
mod range;
mod segment;

pub use boundary::{range_boundaries, Boundary, ScanOrder};
pub use mixed::MixedOrderCursor;
pub use range::KeyRange;
pub use segment::{JumpOutcome, ScanKind, SegmentBound, SegmentScanState};
