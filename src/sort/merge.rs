//! K-way merge of sorted runs

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

use super::compare::KeyComparator;
use super::key::SortKey;
use super::spill::RunReader;
use crate::executor::ExecutionResult;

/// One sorted input of a merge
pub enum RunSource {
    /// A spill run on disk
    Disk(RunReader),
    /// Keys held in memory
    Memory { keys: Arc<Vec<SortKey>>, position: usize },
}

impl RunSource {
    /// Source over in-memory keys from the start
    pub fn memory(keys: Arc<Vec<SortKey>>) -> Self {
        RunSource::Memory { keys, position: 0 }
    }

    pub fn next_key(&mut self) -> ExecutionResult<Option<SortKey>> {
        match self {
            RunSource::Disk(reader) => reader.next_key(),
            RunSource::Memory { keys, position } => {
                let key = keys.get(*position).cloned();
                if key.is_some() {
                    *position += 1;
                }
                Ok(key)
            }
        }
    }
}

struct HeapEntry {
    key: SortKey,
    source: usize,
    comparator: Arc<KeyComparator>,
}

impl Ord for HeapEntry {
    // Reversed: BinaryHeap pops the greatest, the merge wants the smallest
    // key, earliest source first.
    fn cmp(&self, other: &Self) -> Ordering {
        self.comparator
            .compare(&other.key, &self.key)
            .then_with(|| other.source.cmp(&self.source))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

/// Merges sorted sources into one sorted stream.
///
/// Equal keys come out in source order, so merging consecutive runs of a
/// stable sort stays stable.
pub struct KWayMerge {
    sources: Vec<RunSource>,
    heap: BinaryHeap<HeapEntry>,
    comparator: Arc<KeyComparator>,
}

impl KWayMerge {
    pub fn new(
        mut sources: Vec<RunSource>,
        comparator: Arc<KeyComparator>,
    ) -> ExecutionResult<Self> {
        let mut heap = BinaryHeap::with_capacity(sources.len());
        for (source, run) in sources.iter_mut().enumerate() {
            if let Some(key) = run.next_key()? {
                heap.push(HeapEntry {
                    key,
                    source,
                    comparator: Arc::clone(&comparator),
                });
            }
        }
        Ok(Self {
            sources,
            heap,
            comparator,
        })
    }

    /// Number of sources merged
    pub fn fan_in(&self) -> usize {
        self.sources.len()
    }

    pub fn next_key(&mut self) -> ExecutionResult<Option<SortKey>> {
        let entry = match self.heap.pop() {
            Some(entry) => entry,
            None => return Ok(None),
        };
        if let Some(key) = self.sources[entry.source].next_key()? {
            self.heap.push(HeapEntry {
                key,
                source: entry.source,
                comparator: Arc::clone(&self.comparator),
            });
        }
        Ok(Some(entry.key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(values: &[(u8, u8)]) -> Arc<Vec<SortKey>> {
        Arc::new(values.iter().map(|(k, v)| SortKey::new(vec![vec![*k]], vec![*v])).collect())
    }

    fn drain(merge: &mut KWayMerge) -> Vec<(u8, u8)> {
        let mut out = Vec::new();
        while let Some(key) = merge.next_key().unwrap() {
            out.push((key.segments()[0][0], key.value()[0]));
        }
        out
    }

    #[test]
    fn test_merge_is_stable_across_sources() {
        let comparator = Arc::new(KeyComparator::new(&[true]));
        let sources = vec![
            RunSource::memory(keys(&[(1, 0), (3, 0), (5, 0)])),
            RunSource::memory(keys(&[(1, 1), (2, 1), (5, 1)])),
            RunSource::memory(keys(&[])),
        ];
        let mut merge = KWayMerge::new(sources, comparator).unwrap();
        assert_eq!(merge.fan_in(), 3);
        assert_eq!(drain(&mut merge), vec![(1, 0), (1, 1), (2, 1), (3, 0), (5, 0), (5, 1)]);
    }

    #[test]
    fn test_merge_descending() {
        let comparator = Arc::new(KeyComparator::new(&[false]));
        let sources = vec![
            RunSource::memory(keys(&[(9, 0), (4, 0)])),
            RunSource::memory(keys(&[(7, 1), (4, 1), (1, 1)])),
        ];
        let mut merge = KWayMerge::new(sources, comparator).unwrap();
        assert_eq!(drain(&mut merge), vec![(9, 0), (7, 1), (4, 0), (4, 1), (1, 1)]);
    }
}
