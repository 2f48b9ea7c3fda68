//! aeroscan - Ordered index scans and external sorts for the aerodb query layer
//!
//! - `scan`: mixed-direction composite index scans
//! - `spatial`: box queries decomposed into z-order interval scans
//! - `sort`: merge, tree and limited sorts behind the cursor contract
//! - `executor`: cursor contract, errors and the `Executor` facade
//!
//! Storage is consumed through `storage::OrderedStore`; values and rows come
//! from `types`, key encodings from `codec`.

pub mod codec;
pub mod config;
pub mod context;
pub mod executor;
pub mod index;
pub mod observability;
pub mod scan;
pub mod sort;
pub mod spatial;
pub mod storage;
pub mod types;

pub use config::{ConfigError, EngineConfig};
pub use context::{Bindings, CancellationToken, QueryContext};
pub use executor::{Cursor, CursorState, ExecutionError, ExecutionResult, Executor, SortStrategy};
pub use types::{OrderingSpec, Row, Value};
