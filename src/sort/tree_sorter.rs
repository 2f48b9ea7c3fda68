//! Sort by insertion into a temporary ordered store
//!
//! Each row is inserted into a `MemoryTree` keyed by its sort key. The
//! output is a `MixedOrderCursor` over the whole tree with one scan segment
//! per key segment, so per-column directions come from the scan itself.
//! Keys must be unique in the tree: unless duplicates are suppressed, every
//! key carries an ordinal. Store failures on either side surface as
//! `AERO_SORT_IO_ERROR`.

use std::sync::Arc;

use super::input::drain_input;
use super::key::SortKeyBuilder;
use super::policy::DuplicatePolicy;
use super::temp::SequenceGenerator;
use crate::context::QueryContext;
use crate::executor::{
    ColumnSelector, Cursor, CursorState, ExecutionError, ExecutionErrorCode, ExecutionPhase,
    ExecutionResult, Lifecycle,
};
use crate::index::{IndexColumn, IndexDef};
use crate::observability::{log_event_with_fields, Event, ObservationScope};
use crate::scan::{KeyRange, MixedOrderCursor};
use crate::storage::{MemoryTree, OrderedStore};
use crate::types::{OrderingSpec, Row};

/// Creates the temporary store for one load, given its name
pub type StoreFactory<S> = Arc<dyn Fn(String) -> S + Send + Sync>;

/// Sort whose output reads back a temporary ordered store
pub struct TreeSorter<S: OrderedStore + 'static = MemoryTree> {
    input: Box<dyn Cursor>,
    builder: SortKeyBuilder,
    suppress: bool,
    context: QueryContext,
    sequence: Arc<SequenceGenerator>,
    new_store: StoreFactory<S>,
    lifecycle: Lifecycle,
    output: Option<MixedOrderCursor<S>>,
}

impl TreeSorter<MemoryTree> {
    pub fn new(
        input: Box<dyn Cursor>,
        ordering: OrderingSpec,
        policy: DuplicatePolicy,
        context: QueryContext,
        sequence: Arc<SequenceGenerator>,
    ) -> Self {
        let new_store: StoreFactory<MemoryTree> = Arc::new(|name: String| MemoryTree::new(name));
        Self::with_store(input, ordering, policy, context, sequence, new_store)
    }
}

impl<S: OrderedStore + 'static> TreeSorter<S> {
    /// Sorter loading into stores made by `new_store`
    pub fn with_store(
        input: Box<dyn Cursor>,
        ordering: OrderingSpec,
        policy: DuplicatePolicy,
        context: QueryContext,
        sequence: Arc<SequenceGenerator>,
        new_store: StoreFactory<S>,
    ) -> Self {
        let suppress = policy == DuplicatePolicy::Suppress;
        let key_policy = if suppress {
            DuplicatePolicy::Suppress
        } else {
            DuplicatePolicy::Preserve
        };
        let builder = SortKeyBuilder::new(ordering, key_policy, context.config());
        Self {
            input,
            builder,
            suppress,
            context,
            sequence,
            new_store,
            lifecycle: Lifecycle::new(),
            output: None,
        }
    }

    fn load(&mut self) -> ExecutionResult<MixedOrderCursor<S>> {
        let session = self.context.session_id().to_string();
        let name = format!("sort-tree-{}-{}", session, self.sequence.next());
        log_event_with_fields(
            Event::SortBegin,
            &[("session", session.as_str()), ("strategy", "tree"), ("tree", name.as_str())],
        );
        let scope = ObservationScope::with_fields("SORT_LOAD", &[("session", session.as_str())]);

        let mut tree = (self.new_store)(name.clone());
        let context = &self.context;
        let builder = &mut self.builder;
        let suppress = self.suppress;
        let loaded = drain_input(self.input.as_mut(), context, |row| {
            let key = builder.build(&row, context)?;
            let (segments, value) = key.into_parts();
            let inserted = tree
                .insert(segments.concat(), value)
                .map_err(|e| {
                    ExecutionError::sort_failed(format!("temporary tree {}: {}", name, e))
                })?;
            if !inserted {
                if suppress {
                    context.metrics().increment_duplicates_suppressed();
                } else {
                    return Err(ExecutionError::sort_failed(format!(
                        "temporary tree {} rejected a unique key",
                        name
                    )));
                }
            }
            Ok(())
        });
        let rows = match loaded {
            Ok(rows) => rows,
            Err(e) => {
                scope.fail(e.message(), e.is_cancellation());
                return Err(e);
            }
        };

        context.metrics().increment_sorts();
        context.metrics().add_rows_sorted(rows);
        let (rows, entries) = (rows.to_string(), tree.entry_count().to_string());
        scope.complete_with_fields(&[("rows", rows.as_str()), ("entries", entries.as_str())]);

        let directions = builder.directions().to_vec();
        let columns = (0..directions.len()).map(|i| IndexColumn::new(format!("k{}", i))).collect();
        let index = IndexDef::new(name, columns);
        Ok(MixedOrderCursor::new(
            Arc::new(tree),
            index,
            KeyRange::unbounded(),
            directions,
            self.context.clone(),
        ))
    }

    fn start_output(&mut self) -> ExecutionResult<()> {
        if self.output.is_none() {
            self.output = Some(self.load()?);
        }
        match self.output.as_mut() {
            Some(output) => output.open().map_err(|e| sort_error(e, &output.index().name))?,
            None => return Err(ExecutionError::sort_failed("sort output missing after load")),
        }
        log_event_with_fields(Event::SortComplete, &[("strategy", "tree")]);
        Ok(())
    }

    fn fail(&mut self, error: ExecutionError, phase: ExecutionPhase) -> ExecutionError {
        self.close();
        let error = error.in_phase(phase);
        if !error.is_cancellation() {
            log_event_with_fields(
                Event::SortFailed,
                &[("strategy", "tree"), ("code", error.code().code())],
            );
        }
        error
    }
}

/// Store traversal failures read back as sort failures
fn sort_error(error: ExecutionError, tree: &str) -> ExecutionError {
    if error.code() != ExecutionErrorCode::AeroStorageTraversalFailed {
        return error;
    }
    ExecutionError::sort_failed(format!("temporary tree {}: {}", tree, error.message()))
}

impl<S: OrderedStore + 'static> Cursor for TreeSorter<S> {
    fn open(&mut self) -> ExecutionResult<()> {
        self.lifecycle.open()?;
        self.start_output().map_err(|e| self.fail(e, ExecutionPhase::Load))
    }

    fn next(&mut self) -> ExecutionResult<Option<Row>> {
        self.lifecycle.require_active("next")?;
        let fetched = match self.output.as_mut() {
            Some(output) => output.next(),
            None => Ok(None),
        };
        match fetched {
            Ok(Some(row)) => Ok(Some(row)),
            Ok(None) => {
                self.close();
                Ok(None)
            }
            Err(e) => {
                let e = sort_error(e, self.output.as_ref().map_or("", |o| o.index().name.as_str()));
                Err(self.fail(e, ExecutionPhase::Output))
            }
        }
    }

    fn jump(&mut self, _row: &Row, _selector: &ColumnSelector) -> ExecutionResult<()> {
        Err(ExecutionError::unsupported("jump is not supported on sort output"))
    }

    fn close(&mut self) {
        self.lifecycle.close();
        if let Some(output) = self.output.as_mut() {
            output.close();
        }
    }

    fn destroy(&mut self) {
        self.close();
        self.lifecycle.destroy();
        if let Some(mut output) = self.output.take() {
            output.destroy();
        }
        self.input.destroy();
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

    fn sorter(rows: Vec<Row>, directions: &[bool], policy: DuplicatePolicy) -> TreeSorter {
        TreeSorter::new(
            Box::new(RowsCursor::new(rows)),
            OrderingSpec::by_fields(directions).unwrap(),
            policy,
            QueryContext::default(),
            Arc::new(SequenceGenerator::new()),
        )
    }

    #[test]
    fn test_mixed_direction_sort() {
        let rows = vec![row![1, 1, "a"], row![2, 5, "b"], row![1, 9, "c"], row![2, 5, "d"]];
        let mut sort = sorter(rows, &[true, false], DuplicatePolicy::Default);
        let out = collect_rows(&mut sort).unwrap();
        assert_eq!(out.len(), 4);
        assert_eq!(out[0], row![1, 9, "c"]);
        assert_eq!(out[1], row![1, 1, "a"]);
        assert_eq!(out[2].values()[..2], row![2, 5].values()[..]);
        assert_eq!(out[3].values()[..2], row![2, 5].values()[..]);
    }

    #[test]
    fn test_suppress_first_wins() {
        let rows = vec![row![3, "x"], row![1, "y"], row![3, "z"]];
        let mut sort = sorter(rows, &[true], DuplicatePolicy::Suppress);
        assert_eq!(collect_rows(&mut sort).unwrap(), vec![row![1, "y"], row![3, "x"]]);
    }

    #[test]
    fn test_reopen_and_jump() {
        let mut sort = sorter(vec![row![2], row![1]], &[true], DuplicatePolicy::Default);
        assert_eq!(collect_rows(&mut sort).unwrap(), vec![row![1], row![2]]);
        assert_eq!(collect_rows(&mut sort).unwrap(), vec![row![1], row![2]]);
        assert!(sort.jump(&row![1], &ColumnSelector::Leading(1)).is_err());
        sort.destroy();
        assert_eq!(sort.state(), CursorState::Destroyed);
    }
}
