//! Ordering specifications

use std::sync::Arc;

use super::expression::{ColumnRef, Expression};
use crate::executor::{ExecutionError, ExecutionResult};

/// One ordered column: an expression plus its direction.
#[derive(Debug, Clone)]
pub struct OrderingColumn {
    expression: Arc<dyn Expression>,
    ascending: bool,
}

impl OrderingColumn {
    /// Create an ordering column
    pub fn new(expression: Arc<dyn Expression>, ascending: bool) -> Self {
        Self {
            expression,
            ascending,
        }
    }

    /// Returns the ordering expression
    pub fn expression(&self) -> &Arc<dyn Expression> {
        &self.expression
    }

    /// Returns true for ascending order
    pub fn ascending(&self) -> bool {
        self.ascending
    }
}

/// Ordered sequence of `(expression, ascending)` pairs. Never empty.
#[derive(Debug, Clone)]
pub struct OrderingSpec {
    columns: Vec<OrderingColumn>,
}

impl OrderingSpec {
    /// Create an ordering from its columns.
    ///
    /// An empty column list is rejected with `AERO_INVALID_ARGUMENT`.
    pub fn new(columns: Vec<OrderingColumn>) -> ExecutionResult<Self> {
        if columns.is_empty() {
            return Err(ExecutionError::invalid_argument(
                "ordering must contain at least one column",
            ));
        }
        Ok(Self { columns })
    }

    /// Order by leading row fields `0..directions.len()` with the given directions
    pub fn by_fields(directions: &[bool]) -> ExecutionResult<Self> {
        Self::new(
            directions
                .iter()
                .enumerate()
                .map(|(field, asc)| OrderingColumn::new(Arc::new(ColumnRef::new(field)), *asc))
                .collect(),
        )
    }

    /// Order by the listed `(field, ascending)` pairs
    pub fn by_columns(columns: &[(usize, bool)]) -> ExecutionResult<Self> {
        Self::new(
            columns
                .iter()
                .map(|(field, asc)| OrderingColumn::new(Arc::new(ColumnRef::new(*field)), *asc))
                .collect(),
        )
    }

    /// Returns the ordered columns
    pub fn columns(&self) -> &[OrderingColumn] {
        &self.columns
    }

    /// Number of ordered columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Per-column directions, `true` meaning ascending
    pub fn directions(&self) -> Vec<bool> {
        self.columns.iter().map(|c| c.ascending).collect()
    }

    /// Returns true if every column has the same direction
    pub fn all_same_direction(&self) -> bool {
        self.columns
            .windows(2)
            .all(|w| w[0].ascending == w[1].ascending)
    }
}
