//! Spatial range queries over z-order curves
//!
//! - `Space`: bounded integer space and its z-order mapping
//! - `SpatialRangeDecomposer`: box to covering z-intervals
//! - `spatial_scan`: one ordered index scan per interval

mod decomposer;
mod errors;
mod scan;
mod space;

pub use decomposer::SpatialRangeDecomposer;
pub use errors::{SpatialError, SpatialResult};
pub use scan::{interval_range, point_of, spatial_scan, z_value};
pub use space::{BoxRegion, Space, ZCell, ZInterval, MAX_DIMENSIONS, MAX_Z_BITS};
