//! Traversal handles over an ordered store

use std::sync::Arc;

use super::errors::StoreResult;
use super::tree::{Entry, OrderedStore, SeekMode};

/// A positioned traversal over an `OrderedStore`.
///
/// Holds a copy of the current entry; stepping re-seeks relative to the
/// current key, so the handle stays valid across store changes.
#[derive(Debug)]
pub struct TreeCursor<S: OrderedStore> {
    store: Arc<S>,
    current: Option<Entry>,
}

impl<S: OrderedStore> TreeCursor<S> {
    /// Create an unpositioned traversal
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            current: None,
        }
    }

    /// Returns the underlying store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Position relative to `seek_key`. Returns true if an entry was found.
    pub fn seek(&mut self, seek_key: &[u8], mode: SeekMode) -> StoreResult<bool> {
        self.current = self.store.seek(seek_key, mode)?;
        Ok(self.current.is_some())
    }

    /// Step to the next larger key
    pub fn next(&mut self) -> StoreResult<bool> {
        self.step(SeekMode::Gt)
    }

    /// Step to the next smaller key
    pub fn prev(&mut self) -> StoreResult<bool> {
        self.step(SeekMode::Lt)
    }

    fn step(&mut self, mode: SeekMode) -> StoreResult<bool> {
        match self.current.take() {
            Some(entry) => self.seek(&entry.key, mode),
            None => Ok(false),
        }
    }

    /// Returns true if positioned on an entry
    pub fn is_positioned(&self) -> bool {
        self.current.is_some()
    }

    /// Current key, if positioned
    pub fn key(&self) -> Option<&[u8]> {
        self.current.as_ref().map(|e| e.key.as_slice())
    }

    /// Current value, if positioned
    pub fn value(&self) -> Option<&[u8]> {
        self.current.as_ref().map(|e| e.value.as_slice())
    }

    /// Drop the current position
    pub fn reset(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryTree;

    #[test]
    fn test_step_both_ways() {
        let mut tree = MemoryTree::new("t");
        for k in 1u8..=3 {
            tree.insert(vec![k], vec![]).unwrap();
        }
        let mut cursor = TreeCursor::new(Arc::new(tree));
        assert!(cursor.seek(&[2], SeekMode::Gte).unwrap());
        assert!(cursor.next().unwrap());
        assert_eq!(cursor.key(), Some(&[3u8][..]));
        assert!(!cursor.next().unwrap());
        assert!(!cursor.is_positioned());
        assert!(!cursor.prev().unwrap());

        assert!(cursor.seek(&[9], SeekMode::Lte).unwrap());
        assert!(cursor.prev().unwrap());
        assert_eq!(cursor.key(), Some(&[2u8][..]));
        cursor.reset();
        assert_eq!(cursor.value(), None);
    }
}
