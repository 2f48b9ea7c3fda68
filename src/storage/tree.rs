//! Ordered byte-keyed stores
//!
//! `OrderedStore` is the traversal primitive scans are written against.
//! `MemoryTree` is a BTreeMap-backed implementation used for index data in
//! tests and for the temporary trees built by the tree sorter.

use std::collections::BTreeMap;
use std::ops::Bound;

use super::errors::StoreResult;

/// How `seek` positions relative to the seek key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekMode {
    /// First key >= the seek key
    Gte,
    /// First key > the seek key
    Gt,
    /// Last key <= the seek key
    Lte,
    /// Last key < the seek key
    Lt,
}

/// A key/value pair copied out of a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// An ordered map from byte keys to byte values.
///
/// Keys compare by unsigned lexicographic byte order. Entries returned by
/// `seek` are copies; the store may change after they are handed out.
pub trait OrderedStore: Send + Sync {
    /// Store name used in logs and errors
    fn name(&self) -> &str;

    /// Find the entry nearest to `seek_key` in the direction given by `mode`
    fn seek(&self, seek_key: &[u8], mode: SeekMode) -> StoreResult<Option<Entry>>;

    /// Insert an entry. Returns false and leaves the store unchanged if the
    /// key already exists.
    fn insert(&mut self, key: Vec<u8>, value: Vec<u8>) -> StoreResult<bool>;

    /// Number of entries
    fn entry_count(&self) -> usize;
}

/// In-memory ordered store
#[derive(Debug, Default)]
pub struct MemoryTree {
    name: String,
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryTree {
    /// Create an empty tree
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl OrderedStore for MemoryTree {
    fn name(&self) -> &str {
        &self.name
    }

    fn seek(&self, seek_key: &[u8], mode: SeekMode) -> StoreResult<Option<Entry>> {
        let found = match mode {
            SeekMode::Gte => self
                .entries
                .range::<[u8], _>((Bound::Included(seek_key), Bound::Unbounded))
                .next(),
            SeekMode::Gt => self
                .entries
                .range::<[u8], _>((Bound::Excluded(seek_key), Bound::Unbounded))
                .next(),
            SeekMode::Lte => self
                .entries
                .range::<[u8], _>((Bound::Unbounded, Bound::Included(seek_key)))
                .next_back(),
            SeekMode::Lt => self
                .entries
                .range::<[u8], _>((Bound::Unbounded, Bound::Excluded(seek_key)))
                .next_back(),
        };
        Ok(found.map(|(k, v)| Entry {
            key: k.clone(),
            value: v.clone(),
        }))
    }

    fn insert(&mut self, key: Vec<u8>, value: Vec<u8>) -> StoreResult<bool> {
        if self.entries.contains_key(&key) {
            return Ok(false);
        }
        self.entries.insert(key, value);
        Ok(true)
    }

    fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> MemoryTree {
        let mut t = MemoryTree::new("t");
        for k in [[2u8], [4], [6]] {
            assert!(t.insert(k.to_vec(), vec![k[0] * 10]).unwrap());
        }
        t
    }

    fn key(e: Option<Entry>) -> Option<u8> {
        e.map(|e| e.key[0])
    }

    #[test]
    fn test_seek_modes() {
        let t = tree();
        assert_eq!(key(t.seek(&[4], SeekMode::Gte).unwrap()), Some(4));
        assert_eq!(key(t.seek(&[4], SeekMode::Gt).unwrap()), Some(6));
        assert_eq!(key(t.seek(&[4], SeekMode::Lte).unwrap()), Some(4));
        assert_eq!(key(t.seek(&[4], SeekMode::Lt).unwrap()), Some(2));
        assert_eq!(key(t.seek(&[7], SeekMode::Gte).unwrap()), None);
        assert_eq!(key(t.seek(&[1], SeekMode::Lt).unwrap()), None);
        assert_eq!(key(t.seek(&[], SeekMode::Gte).unwrap()), Some(2));
    }

    #[test]
    fn test_insert_rejects_existing_key() {
        let mut t = tree();
        assert!(!t.insert(vec![4], vec![0]).unwrap());
        assert_eq!(t.seek(&[4], SeekMode::Gte).unwrap().unwrap().value, vec![40]);
        assert_eq!(t.entry_count(), 3);
        t.clear();
        assert_eq!(t.entry_count(), 0);
    }
}
