//! # Spatial Errors

use thiserror::Error;

/// Result type for spatial operations
pub type SpatialResult<T> = Result<T, SpatialError>;

/// Space definition and decomposition errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpatialError {
    // Space definition
    #[error("Space must have 1 to 6 dimensions, got {0}")]
    InvalidDimensions(usize),

    #[error("Invalid bounds for dimension {dimension}: lo = {lo}, hi = {hi}")]
    InvalidBounds { dimension: usize, lo: i64, hi: i64 },

    #[error("Invalid interleave: {0}")]
    InvalidInterleave(String),

    #[error("Space needs {0} z bits (max: 57)")]
    TooManyBits(u32),

    // Queries
    #[error("Expected {expected} coordinates, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Coordinate {value} outside dimension {dimension}")]
    OutOfBounds { dimension: usize, value: i64 },

    #[error("Z-value {0} does not map to a point in the space")]
    InvalidZ(i128),

    #[error("Z column holds a {0} value, expected int")]
    NotAZValue(&'static str),

    #[error("Maximum interval count must be at least 1")]
    InvalidMaxZ,
}
