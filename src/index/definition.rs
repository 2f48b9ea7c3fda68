//! Index definitions

use serde::{Deserialize, Serialize};

use super::errors::{IndexError, IndexResult};
use crate::codec::Collation;

/// One indexed column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexColumn {
    pub name: String,
    #[serde(default)]
    pub collation: Collation,
}

impl IndexColumn {
    /// Column with binary collation
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collation: Collation::Binary,
        }
    }

    /// Column with an explicit collation
    pub fn collated(name: impl Into<String>, collation: Collation) -> Self {
        Self {
            name: name.into(),
            collation,
        }
    }
}

/// A composite index over ordered columns.
///
/// Non-unique indexes store every column in the key. Unique indexes store
/// only the first `key_columns` columns in the key; the remaining columns
/// live in the entry value alongside the full row.
///
/// Keys may end in a row suffix after the key columns, see
/// [`IndexDef::suffixes_keys`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDef {
    pub name: String,
    pub columns: Vec<IndexColumn>,
    pub key_columns: usize,
    #[serde(default)]
    pub unique: bool,
}

impl IndexDef {
    /// Non-unique index keyed on every column
    pub fn new(name: impl Into<String>, columns: Vec<IndexColumn>) -> Self {
        let key_columns = columns.len();
        Self {
            name: name.into(),
            columns,
            key_columns,
            unique: false,
        }
    }

    /// Unique index keyed on the first `key_columns` columns
    pub fn unique(name: impl Into<String>, columns: Vec<IndexColumn>, key_columns: usize) -> Self {
        Self {
            name: name.into(),
            columns,
            key_columns,
            unique: true,
        }
    }

    /// Binary-collated index over the named columns
    pub fn over(name: impl Into<String>, columns: &[&str]) -> Self {
        Self::new(name, columns.iter().map(|c| IndexColumn::new(*c)).collect())
    }

    /// Check internal consistency
    pub fn validate(&self) -> IndexResult<()> {
        if self.columns.is_empty() {
            return Err(
                IndexError::invalid_definition("index has no columns").for_index(&self.name)
            );
        }
        if self.key_columns == 0 || self.key_columns > self.columns.len() {
            return Err(IndexError::invalid_definition(format!(
                "key_columns {} outside 1..={}",
                self.key_columns,
                self.columns.len()
            ))
            .for_index(&self.name));
        }
        if !self.unique && self.key_columns != self.columns.len() {
            return Err(IndexError::invalid_definition(
                "non-unique index must key every column",
            )
            .for_index(&self.name));
        }
        Ok(())
    }

    /// Number of indexed columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// True when entry keys may carry a row suffix past the key columns.
    ///
    /// A non-unique index with a collating column suffixes every key, so
    /// rows whose columns only collate equal stay distinct. A unique index
    /// suffixes the keys of rows with a NULL key column, since NULL never
    /// equals NULL.
    pub fn suffixes_keys(&self) -> bool {
        self.unique || self.columns.iter().any(|c| c.collation.is_collating())
    }

    /// Collation of each column
    pub fn collations(&self) -> Vec<Collation> {
        self.columns.iter().map(|c| c.collation).collect()
    }
}
