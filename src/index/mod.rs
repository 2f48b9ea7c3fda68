//! Index definitions and maintenance
//!
//! An index is an `OrderedStore` whose keys are the byte-comparable encoding
//! of its key columns and whose values carry the full index row.

mod definition;
mod errors;
mod writer;

pub use definition::{IndexColumn, IndexDef};
pub use errors::{IndexError, IndexErrorCode, IndexResult};
pub use writer::{encode_entry, IndexWriter};
