//! Ordered storage primitives
//!
//! The scan engine reads through `OrderedStore`, a byte-keyed ordered map
//! with seek-based traversal. The underlying storage engine is external;
//! `MemoryTree` provides an in-memory implementation.

mod errors;
mod traversal;
mod tree;

pub use errors::{StoreError, StoreErrorCode, StoreResult};
pub use traversal::TreeCursor;
pub use tree::{Entry, MemoryTree, OrderedStore, SeekMode};
