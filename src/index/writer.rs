//! Index maintenance
//!
//! Entries are `(key, value)` pairs. The key concatenates the key-column
//! segments; the value is the canonical payload of the full index row, which
//! is what scans hand back.
//!
//! When the key columns alone cannot tell two rows apart, the key ends in
//! one more segment: the row payload as a binary value. Scans walk it with
//! the trailing remaining-segments state and never decode it.

use super::definition::IndexDef;
use super::errors::{IndexError, IndexResult};
use crate::codec::{key, row, BoundedWriter, CodecError, Collation};
use crate::storage::OrderedStore;
use crate::types::{Row, RowSource, Value};

/// Encode the index entry for `row`
pub fn encode_entry(def: &IndexDef, row: &Row) -> IndexResult<(Vec<u8>, Vec<u8>)> {
    if row.field_count() != def.column_count() {
        return Err(IndexError::row_mismatch(def.column_count(), row.field_count())
            .for_index(&def.name));
    }
    let value = row::row_to_vec(row.values()).map_err(codec_error)?;
    let mut key_bytes = Vec::new();
    {
        let mut w = BoundedWriter::unbounded(&mut key_bytes);
        for (i, column) in def.columns.iter().take(def.key_columns).enumerate() {
            key::encode_segment(row.value(i), column.collation, &mut w).map_err(codec_error)?;
        }
        if needs_suffix(def, row) {
            let suffix = Value::Bytes(value.clone());
            key::encode_segment(&suffix, Collation::Binary, &mut w).map_err(codec_error)?;
        }
    }
    Ok((key_bytes, value))
}

fn needs_suffix(def: &IndexDef, row: &Row) -> bool {
    if def.unique {
        row.values().iter().take(def.key_columns).any(Value::is_null)
    } else {
        def.suffixes_keys()
    }
}

fn codec_error(e: CodecError) -> IndexError {
    IndexError::key_size_exceeded(e.to_string())
}

/// Writes rows into an index store
pub struct IndexWriter<'a, S: OrderedStore> {
    def: &'a IndexDef,
    store: &'a mut S,
}

impl<'a, S: OrderedStore> IndexWriter<'a, S> {
    /// Create a writer, validating the definition
    pub fn new(def: &'a IndexDef, store: &'a mut S) -> IndexResult<Self> {
        def.validate()?;
        Ok(Self { def, store })
    }

    /// Insert one row. Returns false if an identical row is already indexed.
    ///
    /// On a unique index a second row with the same non-NULL key is
    /// `AERO_INDEX_DUPLICATE_KEY`.
    pub fn insert(&mut self, row: &Row) -> IndexResult<bool> {
        let (key_bytes, value) = encode_entry(self.def, row)?;
        let inserted = self
            .store
            .insert(key_bytes, value)
            .map_err(|e| IndexError::write_failed(e.to_string()).for_index(&self.def.name))?;
        if !inserted && self.def.unique && !needs_suffix(self.def, row) {
            let shown = row
                .values()
                .iter()
                .take(self.def.key_columns)
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(IndexError::duplicate_key(format!("({})", shown)).for_index(&self.def.name));
        }
        Ok(inserted)
    }

    /// Insert every row, stopping at the first failure. Returns the number
    /// of rows added.
    pub fn insert_all<'r>(
        &mut self,
        rows: impl IntoIterator<Item = &'r Row>,
    ) -> IndexResult<usize> {
        let mut count = 0;
        for row in rows {
            if self.insert(row)? {
                count += 1;
            }
        }
        Ok(count)
    }
}
