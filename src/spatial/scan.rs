//! Spatial scans over a z-ordered index
//!
//! The index keys an optional equality prefix, then the z-value of each
//! row's point as an `Int`, then any further columns. A box query becomes
//! one `MixedOrderCursor` per z-interval, concatenated in z order.

use std::sync::Arc;

use super::decomposer::SpatialRangeDecomposer;
use super::errors::{SpatialError, SpatialResult};
use super::space::{BoxRegion, Space, ZInterval};
use crate::context::QueryContext;
use crate::executor::{Cursor, ExecutionError, ExecutionResult, MultiCursor};
use crate::index::IndexDef;
use crate::scan::{KeyRange, MixedOrderCursor};
use crate::storage::OrderedStore;
use crate::types::Value;

/// Value stored in the z column for `point`
pub fn z_value(space: &Space, point: &[i64]) -> SpatialResult<Value> {
    Ok(Value::Int(space.shuffle(point)? as i64))
}

/// Point stored in a z column value, for exact filtering of scan output
pub fn point_of(space: &Space, z: &Value) -> SpatialResult<Vec<i64>> {
    match z {
        Value::Int(z) if *z >= 0 => space.unshuffle(*z as u64),
        Value::Int(z) => Err(SpatialError::InvalidZ(*z as i128)),
        other => Err(SpatialError::NotAZValue(other.type_name())),
    }
}

/// Key range selecting `interval` under the equality `prefix`
pub fn interval_range(prefix: &[Value], interval: ZInterval) -> KeyRange {
    KeyRange::with_prefix(
        prefix.to_vec(),
        Some((Value::Int(interval.lo as i64), true)),
        Some((Value::Int(interval.hi as i64), true)),
    )
}

/// Ordered scan of every index entry whose z-value falls in an interval
/// covering `region`.
///
/// Rows arrive in z order. The cover is approximate, so rows outside the
/// box may be returned.
pub fn spatial_scan<S: OrderedStore + 'static>(
    store: Arc<S>,
    index: &IndexDef,
    prefix: &[Value],
    decomposer: &SpatialRangeDecomposer,
    region: &BoxRegion,
    eager: bool,
    context: &QueryContext,
) -> ExecutionResult<MultiCursor> {
    if prefix.len() >= index.key_columns {
        return Err(ExecutionError::invalid_argument(format!(
            "index {} has no z column after a {}-column prefix",
            index.name,
            prefix.len()
        )));
    }
    let intervals = decomposer.decompose(region)?;

    let children: Vec<Box<dyn Cursor>> = intervals
        .into_iter()
        .map(|interval| {
            Box::new(MixedOrderCursor::new(
                Arc::clone(&store),
                index.clone(),
                interval_range(prefix, interval),
                Vec::new(),
                context.clone(),
            )) as Box<dyn Cursor>
        })
        .collect();

    let cursor = MultiCursor::new(children);
    Ok(if eager { cursor.eager() } else { cursor })
}
