//! Expression evaluation seam
//!
//! Ordering columns are expressions evaluated against the current row and
//! query bindings. The full expression system lives outside this crate; the
//! implementations here cover column references, parameters and literals.

use std::fmt;

use super::row::{Row, RowSource};
use super::value::Value;
use crate::codec::Collation;
use crate::context::{Bindings, QueryContext};
use crate::executor::{ExecutionError, ExecutionResult};

/// An evaluatable expression producing a key-encodable value.
pub trait Expression: fmt::Debug + Send + Sync {
    /// Evaluate against a row and the current bindings
    fn evaluate(
        &self,
        row: &Row,
        bindings: &Bindings,
        context: &QueryContext,
    ) -> ExecutionResult<Value>;

    /// Collation applied when the result is key-encoded
    fn collation(&self) -> Collation {
        Collation::Binary
    }
}

/// Reference to a row field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRef {
    field: usize,
    collation: Collation,
}

impl ColumnRef {
    /// Reference a field with binary collation
    pub fn new(field: usize) -> Self {
        Self {
            field,
            collation: Collation::Binary,
        }
    }

    /// Reference a field with the given collation
    pub fn collated(field: usize, collation: Collation) -> Self {
        Self { field, collation }
    }

    /// Returns the referenced field
    pub fn field(&self) -> usize {
        self.field
    }
}

impl Expression for ColumnRef {
    fn evaluate(
        &self,
        row: &Row,
        _bindings: &Bindings,
        _context: &QueryContext,
    ) -> ExecutionResult<Value> {
        if self.field >= row.field_count() {
            return Err(ExecutionError::invalid_argument(format!(
                "column {} out of range for row with {} fields",
                self.field,
                row.field_count()
            )));
        }
        Ok(row.value(self.field).clone())
    }

    fn collation(&self) -> Collation {
        self.collation
    }
}

/// Query parameter taken from the bindings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameter {
    position: usize,
}

impl Parameter {
    /// Reference the parameter at `position`
    pub fn new(position: usize) -> Self {
        Self { position }
    }
}

impl Expression for Parameter {
    fn evaluate(
        &self,
        _row: &Row,
        bindings: &Bindings,
        _context: &QueryContext,
    ) -> ExecutionResult<Value> {
        bindings.get(self.position).cloned().ok_or_else(|| {
            ExecutionError::invalid_argument(format!("unbound parameter ${}", self.position))
        })
    }
}

/// Constant value
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    value: Value,
}

impl Literal {
    /// Wrap a constant
    pub fn new(value: impl Into<Value>) -> Self {
        Self { value: value.into() }
    }
}

impl Expression for Literal {
    fn evaluate(
        &self,
        _row: &Row,
        _bindings: &Bindings,
        _context: &QueryContext,
    ) -> ExecutionResult<Value> {
        Ok(self.value.clone())
    }
}
