//! Top-N sort with a bounded buffer
//!
//! Only the first `limit` rows in sorted order are kept. Each row is placed
//! by binary search after any equal keys, so ties keep arrival order; under
//! `DuplicatePolicy::Suppress` a row equal to one already kept is dropped.

use std::cmp::Ordering;

use super::compare::KeyComparator;
use super::input::drain_input;
use super::key::{SortKey, SortKeyBuilder};
use super::policy::DuplicatePolicy;
use crate::context::QueryContext;
use crate::executor::{
    ColumnSelector, Cursor, CursorState, ExecutionError, ExecutionPhase, ExecutionResult, Lifecycle,
};
use crate::observability::{log_event_with_fields, Event};
use crate::types::{OrderingSpec, Row};

/// Sort keeping at most `limit` rows
pub struct LimitedSorter {
    input: Box<dyn Cursor>,
    builder: SortKeyBuilder,
    comparator: KeyComparator,
    suppress: bool,
    limit: usize,
    context: QueryContext,
    lifecycle: Lifecycle,
    kept: Option<Vec<SortKey>>,
    position: usize,
}

impl LimitedSorter {
    pub fn new(
        input: Box<dyn Cursor>,
        ordering: OrderingSpec,
        policy: DuplicatePolicy,
        limit: usize,
        context: QueryContext,
    ) -> Self {
        let suppress = policy == DuplicatePolicy::Suppress;
        // Insertion after equal keys already keeps ties in arrival order
        let builder = SortKeyBuilder::new(ordering, DuplicatePolicy::Default, context.config());
        let comparator = KeyComparator::new(builder.directions());
        Self {
            input,
            builder,
            comparator,
            suppress,
            limit,
            context,
            lifecycle: Lifecycle::new(),
            kept: None,
            position: 0,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    fn load(&mut self) -> ExecutionResult<Vec<SortKey>> {
        let mut kept: Vec<SortKey> = Vec::with_capacity(self.limit.min(1024));
        if self.limit == 0 {
            return Ok(kept);
        }
        let limit = self.limit;
        let suppress = self.suppress;
        let context = &self.context;
        let comparator = &self.comparator;
        let builder = &mut self.builder;
        let rows = drain_input(self.input.as_mut(), context, |row| {
            let key = builder.build(&row, context)?;
            let at = kept.partition_point(|k| comparator.compare(k, &key) != Ordering::Greater);
            if suppress && at > 0 && comparator.same_key(&kept[at - 1], &key) {
                context.metrics().increment_duplicates_suppressed();
                return Ok(());
            }
            if at < limit {
                kept.insert(at, key);
                kept.truncate(limit);
            }
            Ok(())
        })?;
        context.metrics().increment_sorts();
        context.metrics().add_rows_sorted(rows);
        Ok(kept)
    }
}

impl Cursor for LimitedSorter {
    fn open(&mut self) -> ExecutionResult<()> {
        self.lifecycle.open()?;
        if self.kept.is_none() {
            match self.load() {
                Ok(kept) => self.kept = Some(kept),
                Err(e) => {
                    self.close();
                    if !e.is_cancellation() {
                        log_event_with_fields(
                            Event::SortFailed,
                            &[("strategy", "limited"), ("code", e.code().code())],
                        );
                    }
                    return Err(e);
                }
            }
        }
        self.position = 0;
        Ok(())
    }

    fn next(&mut self) -> ExecutionResult<Option<Row>> {
        self.lifecycle.require_active("next")?;
        let key = self.kept.as_ref().and_then(|kept| kept.get(self.position));
        match key.map(|k| k.to_row()) {
            Some(Ok(row)) => {
                self.position += 1;
                Ok(Some(row))
            }
            Some(Err(e)) => {
                self.close();
                Err(e.in_phase(ExecutionPhase::Output))
            }
            None => {
                self.close();
                Ok(None)
            }
        }
    }

    fn jump(&mut self, _row: &Row, _selector: &ColumnSelector) -> ExecutionResult<()> {
        Err(ExecutionError::unsupported("jump is not supported on sort output"))
    }

    fn close(&mut self) {
        self.lifecycle.close();
    }

    fn destroy(&mut self) {
        self.lifecycle.destroy();
        self.kept = None;
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

    /// Input that fails if it is ever opened
    struct Untouchable;

    impl Cursor for Untouchable {
        fn open(&mut self) -> ExecutionResult<()> {
            Err(ExecutionError::invalid_argument("input opened"))
        }
        fn next(&mut self) -> ExecutionResult<Option<Row>> {
            Ok(None)
        }
        fn jump(&mut self, _row: &Row, _selector: &ColumnSelector) -> ExecutionResult<()> {
            Ok(())
        }
        fn close(&mut self) {}
        fn destroy(&mut self) {}
        fn state(&self) -> CursorState {
            CursorState::Idle
        }
    }

    fn limited(
        rows: Vec<Row>,
        directions: &[bool],
        policy: DuplicatePolicy,
        limit: usize,
    ) -> LimitedSorter {
        LimitedSorter::new(
            Box::new(RowsCursor::new(rows)),
            OrderingSpec::by_fields(directions).unwrap(),
            policy,
            limit,
            QueryContext::default(),
        )
    }

    #[test]
    fn test_keeps_first_n() {
        let rows = (0..20).map(|i| row![(i * 11) % 20]).collect();
        let mut sort = limited(rows, &[false], DuplicatePolicy::Default, 3);
        assert_eq!(collect_rows(&mut sort).unwrap(), vec![row![19], row![18], row![17]]);
    }

    #[test]
    fn test_ties_keep_arrival_order() {
        let rows = vec![row![1, "a"], row![0, "b"], row![1, "c"], row![1, "d"]];
        let mut sort = limited(rows, &[true], DuplicatePolicy::Default, 3);
        let expected = vec![row![0, "b"], row![1, "a"], row![1, "c"]];
        assert_eq!(collect_rows(&mut sort).unwrap(), expected);
    }

    #[test]
    fn test_suppress_rejects_equal_keys() {
        let rows = vec![row![2, "a"], row![1, "b"], row![2, "c"], row![3, "d"]];
        let mut sort = limited(rows, &[true], DuplicatePolicy::Suppress, 10);
        let expected = vec![row![1, "b"], row![2, "a"], row![3, "d"]];
        assert_eq!(collect_rows(&mut sort).unwrap(), expected);
    }

    #[test]
    fn test_zero_limit_never_opens_input() {
        let mut sort = LimitedSorter::new(
            Box::new(Untouchable),
            OrderingSpec::by_fields(&[true]).unwrap(),
            DuplicatePolicy::Default,
            0,
            QueryContext::default(),
        );
        assert!(collect_rows(&mut sort).unwrap().is_empty());
    }
}
