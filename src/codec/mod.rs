//! Key and row encodings
//!
//! - `key`: byte-comparable, prefix-free key segments
//! - `row`: canonical row payloads
//! - `buffer`: bounded writers with doubling retry
//! - `collation`: string collations used by key encoding

pub mod buffer;
mod collation;
mod errors;
pub mod key;
pub mod row;

pub use buffer::{BoundedWriter, GrowableBuffer};
pub use collation::Collation;
pub use errors::{CodecError, CodecResult};
