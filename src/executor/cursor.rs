//! Cursor contract shared by scans and sorts
//!
//! ```text
//! Idle --open--> Active --next()==None / close--> Idle
//!   \                \
//!    +----destroy-----+--> Destroyed (terminal)
//! ```
//!
//! `open` is valid only from Idle and `next` only from Active. A cursor that
//! runs out of rows, or fails, closes itself. `close` is idempotent.

use super::errors::{ExecutionError, ExecutionResult};
use crate::types::Row;

/// Lifecycle state of a cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Not positioned; may be opened
    Idle,
    /// Open and producing rows
    Active,
    /// Resources released; no further use
    Destroyed,
}

impl CursorState {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            CursorState::Idle => "idle",
            CursorState::Active => "active",
            CursorState::Destroyed => "destroyed",
        }
    }
}

/// Which fields of a row `jump` should honor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelector {
    /// The first `n` fields
    Leading(usize),
    /// An explicit set of fields
    Columns(Vec<usize>),
}

impl ColumnSelector {
    /// Returns true if `field` is selected
    pub fn includes(&self, field: usize) -> bool {
        match self {
            ColumnSelector::Leading(n) => field < *n,
            ColumnSelector::Columns(fields) => fields.contains(&field),
        }
    }
}

/// Pull-based row iterator
pub trait Cursor {
    /// Position before the first row
    fn open(&mut self) -> ExecutionResult<()>;

    /// Next row, or `None` when exhausted (the cursor is then idle)
    fn next(&mut self) -> ExecutionResult<Option<Row>>;

    /// Reposition so the next row is the first one at or after `row` on
    /// the selected columns
    fn jump(&mut self, row: &Row, selector: &ColumnSelector) -> ExecutionResult<()>;

    /// Return to idle, keeping resources for a later `open`
    fn close(&mut self);

    /// Release every resource; terminal
    fn destroy(&mut self);

    /// Current lifecycle state
    fn state(&self) -> CursorState;
}

impl<C: Cursor + ?Sized> Cursor for Box<C> {
    fn open(&mut self) -> ExecutionResult<()> {
        (**self).open()
    }

    fn next(&mut self) -> ExecutionResult<Option<Row>> {
        (**self).next()
    }

    fn jump(&mut self, row: &Row, selector: &ColumnSelector) -> ExecutionResult<()> {
        (**self).jump(row, selector)
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn destroy(&mut self) {
        (**self).destroy()
    }

    fn state(&self) -> CursorState {
        (**self).state()
    }
}

/// State tracking with the transition checks every cursor shares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifecycle {
    state: CursorState,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            state: CursorState::Idle,
        }
    }
}

impl Lifecycle {
    /// Start idle
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Idle -> Active
    pub fn open(&mut self) -> ExecutionResult<()> {
        match self.state {
            CursorState::Idle => {
                self.state = CursorState::Active;
                Ok(())
            }
            other => Err(ExecutionError::cursor_state(format!(
                "open requires an idle cursor, cursor is {}",
                other.as_str()
            ))),
        }
    }

    /// Fail unless Active
    pub fn require_active(&self, operation: &str) -> ExecutionResult<()> {
        match self.state {
            CursorState::Active => Ok(()),
            other => Err(ExecutionError::cursor_state(format!(
                "{} requires an active cursor, cursor is {}",
                operation,
                other.as_str()
            ))),
        }
    }

    /// Fail if Destroyed
    pub fn require_usable(&self, operation: &str) -> ExecutionResult<()> {
        if self.state == CursorState::Destroyed {
            return Err(ExecutionError::cursor_state(format!(
                "{} on a destroyed cursor",
                operation
            )));
        }
        Ok(())
    }

    /// Force Active after a reposition
    pub fn activate(&mut self) {
        if self.state != CursorState::Destroyed {
            self.state = CursorState::Active;
        }
    }

    /// Active -> Idle; no-op otherwise
    pub fn close(&mut self) {
        if self.state == CursorState::Active {
            self.state = CursorState::Idle;
        }
    }

    /// Any -> Destroyed
    pub fn destroy(&mut self) {
        self.state = CursorState::Destroyed;
    }

    /// Returns true if Active
    pub fn is_active(&self) -> bool {
        self.state == CursorState::Active
    }
}

/// Cursor over rows already in memory, in the order given
#[derive(Debug, Clone)]
pub struct RowsCursor {
    rows: Vec<Row>,
    position: usize,
    lifecycle: Lifecycle,
}

impl RowsCursor {
    /// Cursor over `rows`
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows,
            position: 0,
            lifecycle: Lifecycle::new(),
        }
    }
}

impl Cursor for RowsCursor {
    fn open(&mut self) -> ExecutionResult<()> {
        self.lifecycle.open()?;
        self.position = 0;
        Ok(())
    }

    fn next(&mut self) -> ExecutionResult<Option<Row>> {
        self.lifecycle.require_active("next")?;
        match self.rows.get(self.position) {
            Some(row) => {
                self.position += 1;
                Ok(Some(row.clone()))
            }
            None => {
                self.close();
                Ok(None)
            }
        }
    }

    fn jump(&mut self, _row: &Row, _selector: &ColumnSelector) -> ExecutionResult<()> {
        Err(ExecutionError::unsupported("jump is not supported on an in-memory row cursor"))
    }

    fn close(&mut self) {
        self.lifecycle.close();
    }

    fn destroy(&mut self) {
        self.lifecycle.destroy();
        self.rows.clear();
    }

    fn state(&self) -> CursorState {
        self.lifecycle.state()
    }
}

/// Open `cursor` if idle and drain it
pub fn collect_rows<C: Cursor + ?Sized>(cursor: &mut C) -> ExecutionResult<Vec<Row>> {
    if cursor.state() == CursorState::Idle {
        cursor.open()?;
    }
    let mut rows = Vec::new();
    while let Some(row) = cursor.next()? {
        rows.push(row);
    }
    Ok(rows)
}
