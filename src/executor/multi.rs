//! Sequential concatenation of child cursors

use super::cursor::{ColumnSelector, Cursor, CursorState, Lifecycle};
use super::errors::{ExecutionError, ExecutionResult};
use crate::types::Row;

/// Emits every row of each child in registration order.
///
/// Children are opened when reached, or all at `open` when `eager` is set.
pub struct MultiCursor {
    children: Vec<Box<dyn Cursor>>,
    eager: bool,
    current: usize,
    lifecycle: Lifecycle,
}

impl MultiCursor {
    /// Lazily-opening cursor over `children`
    pub fn new(children: Vec<Box<dyn Cursor>>) -> Self {
        Self {
            children,
            eager: false,
            current: 0,
            lifecycle: Lifecycle::new(),
        }
    }

    /// Open every child up front
    pub fn eager(mut self) -> Self {
        self.eager = true;
        self
    }

    /// Register another child
    pub fn push(&mut self, child: Box<dyn Cursor>) {
        self.children.push(child);
    }

    /// Number of children
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn open_children(&mut self) -> ExecutionResult<()> {
        for child in self.children.iter_mut() {
            if child.state() == CursorState::Idle {
                child.open()?;
            }
        }
        Ok(())
    }

    fn fetch(&mut self) -> ExecutionResult<Option<Row>> {
        while let Some(child) = self.children.get_mut(self.current) {
            if child.state() == CursorState::Idle && !self.eager {
                child.open()?;
            }
            if child.state() == CursorState::Active {
                if let Some(row) = child.next()? {
                    return Ok(Some(row));
                }
            }
            self.current += 1;
        }
        Ok(None)
    }

    fn close_children(&mut self) {
        for child in self.children.iter_mut() {
            child.close();
        }
    }
}

impl Cursor for MultiCursor {
    fn open(&mut self) -> ExecutionResult<()> {
        self.lifecycle.open()?;
        self.current = 0;
        if self.eager {
            if let Err(e) = self.open_children() {
                self.close();
                return Err(e);
            }
        }
        Ok(())
    }

    fn next(&mut self) -> ExecutionResult<Option<Row>> {
        self.lifecycle.require_active("next")?;
        match self.fetch() {
            Ok(Some(row)) => Ok(Some(row)),
            Ok(None) => {
                self.close();
                Ok(None)
            }
            Err(e) => {
                self.close();
                Err(e)
            }
        }
    }

    fn jump(&mut self, _row: &Row, _selector: &ColumnSelector) -> ExecutionResult<()> {
        Err(ExecutionError::unsupported("jump is not supported across concatenated cursors"))
    }

    fn close(&mut self) {
        self.lifecycle.close();
        self.close_children();
    }

    fn destroy(&mut self) {
        self.lifecycle.destroy();
        for child in self.children.iter_mut() {
            child.destroy();
        }
        self.children.clear();
    }

    fn state(&self) -> CursorState {
        self.lifecycle.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{collect_rows, RowsCursor};
    use crate::row;

    fn children() -> Vec<Box<dyn Cursor>> {
        vec![
            Box::new(RowsCursor::new(vec![row![1], row![2]])),
            Box::new(RowsCursor::new(vec![])),
            Box::new(RowsCursor::new(vec![row![3]])),
        ]
    }

    #[test]
    fn test_concatenates_in_order() {
        let mut lazy = MultiCursor::new(children());
        assert_eq!(collect_rows(&mut lazy).unwrap(), vec![row![1], row![2], row![3]]);
        assert_eq!(lazy.state(), CursorState::Idle);

        let mut eager = MultiCursor::new(children()).eager();
        eager.open().unwrap();
        assert_eq!(collect_rows(&mut eager).unwrap(), vec![row![1], row![2], row![3]]);
    }

    #[test]
    fn test_reopen_and_destroy() {
        let mut cursor = MultiCursor::new(children());
        assert_eq!(collect_rows(&mut cursor).unwrap().len(), 3);
        assert_eq!(collect_rows(&mut cursor).unwrap().len(), 3);
        cursor.destroy();
        assert!(cursor.is_empty());
        assert_eq!(cursor.next().unwrap_err().code().code(), "AERO_CURSOR_STATE");
    }

    #[test]
    fn test_jump_unsupported() {
        let mut cursor = MultiCursor::new(children());
        let err = cursor.jump(&row![1], &ColumnSelector::Leading(1)).unwrap_err();
        assert_eq!(err.code().code(), "AERO_CURSOR_UNSUPPORTED");
    }
}
