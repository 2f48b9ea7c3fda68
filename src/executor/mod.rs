//! Cursor contract, execution errors and the executor facade
//!
//! Every scan and sort is a pull-based `Cursor`. Cursors are single-owner:
//! no two threads drive the same cursor, and no locks are taken inside one.

mod cursor;
mod errors;
mod executor;
mod multi;

pub use cursor::{collect_rows, ColumnSelector, Cursor, CursorState, Lifecycle, RowsCursor};
pub use errors::{ExecutionError, ExecutionErrorCode, ExecutionPhase, ExecutionResult, Severity};
pub use executor::{Executor, SortStrategy};
pub use multi::MultiCursor;
