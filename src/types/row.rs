//! Rows and field access

use super::value::Value;

/// Field-by-index access to a row.
pub trait RowSource {
    /// Number of fields
    fn field_count(&self) -> usize;

    /// Value of the given field
    fn value(&self, field: usize) -> &Value;
}

/// An owned row of values.
///
/// Rows handed out by cursors are always copies; downstream operators may
/// keep them for as long as they like.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    /// Create a row from its field values
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Returns the field values
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Consumes the row, returning its values
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Projects the row onto its first `n` fields
    pub fn prefix(&self, n: usize) -> Row {
        Row::new(self.values.iter().take(n).cloned().collect())
    }
}

impl RowSource for Row {
    fn field_count(&self) -> usize {
        self.values.len()
    }

    fn value(&self, field: usize) -> &Value {
        &self.values[field]
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Row::new(values)
    }
}

/// Build a row from a list of values convertible into `Value`.
///
/// ```ignore
/// let row = row![1, "x", Value::Null];
/// ```
#[macro_export]
macro_rules! row {
    ($($v:expr),* $(,)?) => {
        $crate::types::Row::new(vec![$($crate::types::Value::from($v)),*])
    };
}
