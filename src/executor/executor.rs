//! Executor facade
//!
//! Builds opened scan and sort cursors over a shared `QueryContext`. Sort
//! temp files are named from the context's session id and a sequence shared
//! by every sort this executor starts.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::cursor::Cursor;
use super::errors::ExecutionResult;
use super::multi::MultiCursor;
use crate::context::QueryContext;
use crate::index::IndexDef;
use crate::observability::Logger;
use crate::scan::{KeyRange, MixedOrderCursor};
use crate::sort::{
    DirTempFileProvider, DuplicatePolicy, LimitedSorter, MergeSorter, SequenceGenerator,
    TempFileProvider, TreeSorter,
};
use crate::spatial::{spatial_scan, BoxRegion, SpatialRangeDecomposer};
use crate::storage::OrderedStore;
use crate::types::{OrderingSpec, Value};

/// How a full sort is carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortStrategy {
    /// Bounded memory with spill runs and k-way merge
    #[default]
    Merge,
    /// Insertion into a temporary ordered store
    Tree,
}

impl SortStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortStrategy::Merge => "merge",
            SortStrategy::Tree => "tree",
        }
    }
}

/// Entry point for scans and sorts within one query
pub struct Executor {
    context: QueryContext,
    sequence: Arc<SequenceGenerator>,
    temp_files: Arc<dyn TempFileProvider>,
}

impl Executor {
    /// Executor spilling into the configured temp directory. Applies the
    /// configured log level process-wide.
    pub fn new(context: QueryContext) -> Self {
        Logger::set_min_severity(context.config().log_level);
        let sequence = Arc::new(SequenceGenerator::new());
        let temp_files = Arc::new(DirTempFileProvider::new(
            context.config().spill_dir(),
            context.session_id(),
            Arc::clone(&sequence),
        ));
        Self {
            context,
            sequence,
            temp_files,
        }
    }

    /// Replace the spill file provider
    pub fn with_temp_files(mut self, temp_files: Arc<dyn TempFileProvider>) -> Self {
        self.temp_files = temp_files;
        self
    }

    pub fn context(&self) -> &QueryContext {
        &self.context
    }

    /// Open an ordered scan of `range` over `index`
    pub fn open_scan<S: OrderedStore>(
        &self,
        store: Arc<S>,
        index: IndexDef,
        range: KeyRange,
        ascending: Vec<bool>,
    ) -> ExecutionResult<MixedOrderCursor<S>> {
        let mut cursor =
            MixedOrderCursor::new(store, index, range, ascending, self.context.clone());
        cursor.open()?;
        Ok(cursor)
    }

    /// Open a z-ordered scan of every entry whose point may lie in `region`
    pub fn open_spatial_scan<S: OrderedStore + 'static>(
        &self,
        store: Arc<S>,
        index: &IndexDef,
        prefix: &[Value],
        decomposer: &SpatialRangeDecomposer,
        region: &BoxRegion,
        eager: bool,
    ) -> ExecutionResult<MultiCursor> {
        let mut cursor =
            spatial_scan(store, index, prefix, decomposer, region, eager, &self.context)?;
        cursor.open()?;
        Ok(cursor)
    }

    /// Sort `input`. The input is fully consumed before this returns.
    pub fn sort(
        &self,
        input: Box<dyn Cursor>,
        ordering: OrderingSpec,
        policy: DuplicatePolicy,
        strategy: SortStrategy,
    ) -> ExecutionResult<Box<dyn Cursor>> {
        let mut cursor: Box<dyn Cursor> = match strategy {
            SortStrategy::Merge => Box::new(MergeSorter::new(
                input,
                ordering,
                policy,
                self.context.clone(),
                Arc::clone(&self.temp_files),
            )),
            SortStrategy::Tree => Box::new(TreeSorter::new(
                input,
                ordering,
                policy,
                self.context.clone(),
                Arc::clone(&self.sequence),
            )),
        };
        cursor.open()?;
        Ok(cursor)
    }

    /// Keep only the first `limit` rows of `input` in sorted order
    pub fn sort_limited(
        &self,
        input: Box<dyn Cursor>,
        ordering: OrderingSpec,
        policy: DuplicatePolicy,
        limit: usize,
    ) -> ExecutionResult<LimitedSorter> {
        let mut cursor = LimitedSorter::new(input, ordering, policy, limit, self.context.clone());
        cursor.open()?;
        Ok(cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::executor::{collect_rows, RowsCursor};
    use crate::index::IndexWriter;
    use crate::observability::MetricsRegistry;
    use crate::row;
    use crate::storage::MemoryTree;
    use crate::types::Row;
    use tempfile::TempDir;

    fn executor(dir: &TempDir, memory: usize) -> Executor {
        let config = EngineConfig::default().with_sort_memory(memory).with_tmp_dir(dir.path());
        Executor::new(QueryContext::new(Arc::new(config), Arc::new(MetricsRegistry::new())))
    }

    fn input() -> Vec<Row> {
        (0..30).map(|i| row![(i * 11) % 7, i]).collect()
    }

    #[test]
    fn test_strategies_agree() {
        let dir = TempDir::new().unwrap();
        let exec = executor(&dir, 96);
        let ordering = || OrderingSpec::by_fields(&[true, false]).unwrap();

        let sort = |strategy| {
            let input = Box::new(RowsCursor::new(input()));
            exec.sort(input, ordering(), DuplicatePolicy::Default, strategy).unwrap()
        };
        let mut merge = sort(SortStrategy::Merge);
        let mut tree = sort(SortStrategy::Tree);
        let merged = collect_rows(&mut merge).unwrap();
        assert_eq!(merged.len(), 30);
        assert_eq!(collect_rows(&mut tree).unwrap(), merged);
        assert!(exec.context().metrics().snapshot().spill_files > 0);
    }

    #[test]
    fn test_spill_files_land_in_tmp_dir() {
        let dir = TempDir::new().unwrap();
        let exec = executor(&dir, 64);
        let ordering = OrderingSpec::by_fields(&[true]).unwrap();
        let mut sorted = exec
            .sort(
                Box::new(RowsCursor::new(input())),
                ordering,
                DuplicatePolicy::Preserve,
                SortStrategy::Merge,
            )
            .unwrap();
        let session = exec.context().session_id().to_string();
        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(!names.is_empty());
        let prefix = format!("sort-{}-", session);
        assert!(names.iter().all(|n| n.starts_with(&prefix) && n.ends_with(".tmp")));

        sorted.destroy();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_open_scan_and_limited_sort() {
        let dir = TempDir::new().unwrap();
        let exec = executor(&dir, 1 << 20);
        let index = IndexDef::over("t", &["a", "b"]);
        let mut tree = MemoryTree::new("t");
        IndexWriter::new(&index, &mut tree).unwrap().insert_all(&input()).unwrap();

        let mut scan = exec
            .open_scan(
                Arc::new(tree),
                index,
                KeyRange::point(vec![Value::Int(3)]),
                vec![true, false],
            )
            .unwrap();
        let rows = collect_rows(&mut scan).unwrap();
        assert!(!rows.is_empty());
        assert!(rows
            .windows(2)
            .all(|w| w[0].values()[1].as_int() > w[1].values()[1].as_int()));

        let mut top = exec
            .sort_limited(
                Box::new(RowsCursor::new(input())),
                OrderingSpec::by_fields(&[false]).unwrap(),
                DuplicatePolicy::Suppress,
                3,
            )
            .unwrap();
        let firsts: Vec<Option<i64>> = collect_rows(&mut top)
            .unwrap()
            .iter()
            .map(|r| r.values()[0].as_int())
            .collect();
        assert_eq!(firsts, vec![Some(6), Some(5), Some(4)]);
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(SortStrategy::default(), SortStrategy::Merge);
        assert_eq!(SortStrategy::Tree.as_str(), "tree");
        let parsed: SortStrategy = serde_json::from_str("\"tree\"").unwrap();
        assert_eq!(parsed, SortStrategy::Tree);
    }
}
