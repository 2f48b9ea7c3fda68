//! Value model shared by scans, sorts and index maintenance
//!
//! - `Value`: typed, nullable field value
//! - `Row` / `RowSource`: field-by-index row access
//! - `Expression`: evaluation seam for ordering columns
//! - `OrderingSpec`: non-empty list of ordered expressions

mod expression;
mod ordering;
mod row;
mod value;

pub use expression::{ColumnRef, Expression, Literal, Parameter};
pub use ordering::{OrderingColumn, OrderingSpec};
pub use row::{Row, RowSource};
pub use value::Value;
