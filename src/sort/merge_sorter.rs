//! Bounded-memory sort with spill runs and k-way merge
//!
//! Rows are keyed and staged in memory. Whenever the staged keys exceed
//! `sort_memory_bytes` they are sorted (stably) and written to a spill run.
//! At the end of input the residual stays in memory as the last run. If
//! there are more spill runs than `merge_fan_in`, consecutive groups are
//! merged into new runs until they fit, then the output streams from one
//! final merge. Ties always resolve in arrival order.

use std::sync::Arc;

use super::compare::KeyComparator;
use super::input::drain_input;
use super::key::{SortKey, SortKeyBuilder};
use super::merge::{KWayMerge, RunSource};
use super::policy::DuplicatePolicy;
use super::spill::{RunWriter, SpillRun};
use super::temp::TempFileProvider;
use crate::context::QueryContext;
use crate::executor::{
    ColumnSelector, Cursor, CursorState, ExecutionError, ExecutionPhase, ExecutionResult, Lifecycle,
};
use crate::observability::{log_event_with_fields, Event, ObservationScope};
use crate::types::{OrderingSpec, Row};

/// Sorted runs produced by the load phase
struct SortedRuns {
    spilled: Vec<SpillRun>,
    residual: Arc<Vec<SortKey>>,
}

impl SortedRuns {
    fn sources(&self) -> ExecutionResult<Vec<RunSource>> {
        let mut sources = Vec::with_capacity(self.spilled.len() + 1);
        for run in &self.spilled {
            sources.push(RunSource::Disk(run.reader()?));
        }
        sources.push(RunSource::memory(Arc::clone(&self.residual)));
        Ok(sources)
    }

    fn remove(self) {
        for run in self.spilled {
            run.remove();
        }
    }
}

/// Sorting, spilling and merging of runs
struct RunBuilder {
    comparator: Arc<KeyComparator>,
    suppress: bool,
    context: QueryContext,
    temp_files: Arc<dyn TempFileProvider>,
}

impl RunBuilder {
    /// Stable sort, dropping later duplicates when suppressing
    fn sort(&self, staged: &mut Vec<SortKey>) {
        staged.sort_by(|a, b| self.comparator.compare(a, b));
        if self.suppress {
            let before = staged.len();
            staged.dedup_by(|later, earlier| self.comparator.same_key(earlier, later));
            for _ in staged.len()..before {
                self.context.metrics().increment_duplicates_suppressed();
            }
        }
    }

    fn writer(&self) -> ExecutionResult<RunWriter> {
        let file = self.temp_files.create().map_err(|e| {
            ExecutionError::sort_io("failed to create spill file", e)
                .in_phase(ExecutionPhase::Spill)
        })?;
        Ok(RunWriter::new(file))
    }

    fn spill(&self, staged: &mut Vec<SortKey>) -> ExecutionResult<SpillRun> {
        self.sort(staged);
        let run = self.writer()?.write_all(staged.iter())?;
        staged.clear();
        self.context.metrics().record_spill(run.bytes());
        let (records, bytes) = (run.records().to_string(), run.bytes().to_string());
        log_event_with_fields(
            Event::SortSpill,
            &[("records", records.as_str()), ("bytes", bytes.as_str())],
        );
        Ok(run)
    }

    /// Merge `group` into one new run. Keys stream from the merge into the
    /// writer, so at most one key per input run is held in memory.
    fn merge_group(&self, group: Vec<SpillRun>) -> ExecutionResult<SpillRun> {
        let mut sources = Vec::with_capacity(group.len());
        for run in &group {
            sources.push(RunSource::Disk(run.reader()?));
        }
        let mut merge = KWayMerge::new(sources, Arc::clone(&self.comparator))?;
        let mut writer = self.writer()?;
        while let Some(key) = merge.next_key()? {
            writer.push(&key)?;
        }
        let merged = writer.finish()?;
        for run in group {
            run.remove();
        }
        Ok(merged)
    }

    /// Merge runs in consecutive groups of `merge_fan_in` until few enough
    /// remain for one final merge
    fn reduce(&self, mut runs: Vec<SpillRun>) -> ExecutionResult<Vec<SpillRun>> {
        let fan_in = self.context.config().merge_fan_in.max(2);
        while runs.len() > fan_in {
            let mut merged = Vec::with_capacity(runs.len() / fan_in + 1);
            let mut pending = runs.into_iter().peekable();
            while pending.peek().is_some() {
                let group: Vec<SpillRun> = pending.by_ref().take(fan_in).collect();
                if group.len() == 1 {
                    merged.extend(group);
                } else {
                    merged.push(self.merge_group(group)?);
                }
            }
            runs = merged;
            self.context.metrics().increment_merge_passes();
            let remaining = runs.len().to_string();
            log_event_with_fields(Event::SortMergePass, &[("runs", remaining.as_str())]);
        }
        Ok(runs)
    }
}

/// External merge sort exposed as a cursor over its output
pub struct MergeSorter {
    input: Box<dyn Cursor>,
    builder: SortKeyBuilder,
    runs: RunBuilder,
    lifecycle: Lifecycle,
    sorted: Option<SortedRuns>,
    merge: Option<KWayMerge>,
    last: Option<SortKey>,
}

impl MergeSorter {
    pub fn new(
        input: Box<dyn Cursor>,
        ordering: OrderingSpec,
        policy: DuplicatePolicy,
        context: QueryContext,
        temp_files: Arc<dyn TempFileProvider>,
    ) -> Self {
        let builder = SortKeyBuilder::new(ordering, policy, context.config());
        let runs = RunBuilder {
            comparator: Arc::new(KeyComparator::new(builder.directions())),
            suppress: policy == DuplicatePolicy::Suppress,
            context,
            temp_files,
        };
        Self {
            input,
            builder,
            runs,
            lifecycle: Lifecycle::new(),
            sorted: None,
            merge: None,
            last: None,
        }
    }

    /// Number of spill runs backing the output
    pub fn spilled_runs(&self) -> usize {
        self.sorted.as_ref().map_or(0, |s| s.spilled.len())
    }

    fn load(&mut self) -> ExecutionResult<SortedRuns> {
        let context = &self.runs.context;
        let session = context.session_id().to_string();
        log_event_with_fields(
            Event::SortBegin,
            &[
                ("session", session.as_str()),
                ("strategy", "merge"),
                ("policy", self.builder.policy().as_str()),
            ],
        );
        let scope = ObservationScope::with_fields("SORT_LOAD", &[("session", session.as_str())]);

        let limit = context.config().sort_memory_bytes;
        let mut staged: Vec<SortKey> = Vec::new();
        let mut staged_bytes = 0usize;
        let mut spilled: Vec<SpillRun> = Vec::new();

        let runs = &self.runs;
        let builder = &mut self.builder;
        let loaded = drain_input(self.input.as_mut(), context, |row| {
            let key = builder.build(&row, context)?;
            staged_bytes += key.framed_size();
            staged.push(key);
            if staged_bytes > limit {
                spilled.push(runs.spill(&mut staged)?);
                staged_bytes = 0;
            }
            Ok(())
        });
        let rows = match loaded {
            Ok(rows) => rows,
            Err(e) => {
                scope.fail(e.message(), e.is_cancellation());
                for run in spilled {
                    run.remove();
                }
                return Err(e);
            }
        };

        runs.sort(&mut staged);
        let spilled = match runs.reduce(spilled) {
            Ok(spilled) => spilled,
            Err(e) => {
                scope.fail(e.message(), false);
                return Err(e);
            }
        };

        context.metrics().increment_sorts();
        context.metrics().add_rows_sorted(rows);
        let (rows, run_count) = (rows.to_string(), spilled.len().to_string());
        scope.complete_with_fields(&[("rows", rows.as_str()), ("runs", run_count.as_str())]);
        Ok(SortedRuns {
            spilled,
            residual: Arc::new(staged),
        })
    }

    fn start_output(&mut self) -> ExecutionResult<()> {
        if self.sorted.is_none() {
            self.sorted = Some(self.load()?);
        }
        let sources = match &self.sorted {
            Some(sorted) => sorted.sources()?,
            None => Vec::new(),
        };
        let merge = KWayMerge::new(sources, Arc::clone(&self.runs.comparator))?;
        let fan_in = merge.fan_in().to_string();
        self.merge = Some(merge);
        self.last = None;
        log_event_with_fields(
            Event::SortComplete,
            &[("strategy", "merge"), ("fan_in", fan_in.as_str())],
        );
        Ok(())
    }

    fn fetch(&mut self) -> ExecutionResult<Option<Row>> {
        let merge = match self.merge.as_mut() {
            Some(merge) => merge,
            None => return Ok(None),
        };
        while let Some(key) = merge.next_key()? {
            if self.runs.suppress {
                if let Some(last) = &self.last {
                    if self.runs.comparator.same_key(last, &key) {
                        self.runs.context.metrics().increment_duplicates_suppressed();
                        continue;
                    }
                }
            }
            let row = key.to_row()?;
            if self.runs.suppress {
                self.last = Some(key);
            }
            return Ok(Some(row));
        }
        Ok(None)
    }

    fn fail(&mut self, error: ExecutionError, phase: ExecutionPhase) -> ExecutionError {
        self.close();
        let error = error.in_phase(phase);
        if !error.is_cancellation() {
            log_event_with_fields(
                Event::SortFailed,
                &[("strategy", "merge"), ("code", error.code().code())],
            );
        }
        error
    }
}

impl Cursor for MergeSorter {
    fn open(&mut self) -> ExecutionResult<()> {
        self.lifecycle.open()?;
        self.start_output().map_err(|e| self.fail(e, ExecutionPhase::Merge))
    }

    fn next(&mut self) -> ExecutionResult<Option<Row>> {
        self.lifecycle.require_active("next")?;
        match self.fetch() {
            Ok(Some(row)) => Ok(Some(row)),
            Ok(None) => {
                self.close();
                Ok(None)
            }
            Err(e) => Err(self.fail(e, ExecutionPhase::Output)),
        }
    }

    fn jump(&mut self, _row: &Row, _selector: &ColumnSelector) -> ExecutionResult<()> {
        Err(ExecutionError::unsupported("jump is not supported on sort output"))
    }

    fn close(&mut self) {
        self.lifecycle.close();
        self.merge = None;
        self.last = None;
    }

    fn destroy(&mut self) {
        self.close();
        self.lifecycle.destroy();
        if let Some(sorted) = self.sorted.take() {
            sorted.remove();
        }
        self.input.destroy();
    }

    fn state(&self) -> CursorState {
        self.lifecycle.state()
    }
}

impl Drop for MergeSorter {
    fn drop(&mut self) {
        if let Some(sorted) = self.sorted.take() {
            sorted.remove();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::executor::{collect_rows, RowsCursor};
    use crate::observability::MetricsRegistry;
    use crate::row;
    use crate::sort::{DirTempFileProvider, SequenceGenerator};
    use crate::types::Value;
    use tempfile::TempDir;

    fn context(dir: &TempDir, memory: usize, fan_in: usize) -> QueryContext {
        let config = EngineConfig::default()
            .with_sort_memory(memory)
            .with_tmp_dir(dir.path())
            .with_merge_fan_in(fan_in);
        QueryContext::new(Arc::new(config), Arc::new(MetricsRegistry::new()))
    }

    fn sorter(
        context: QueryContext,
        rows: Vec<Row>,
        directions: &[bool],
        policy: DuplicatePolicy,
    ) -> MergeSorter {
        let provider = DirTempFileProvider::new(
            context.config().spill_dir(),
            context.session_id(),
            Arc::new(SequenceGenerator::new()),
        );
        MergeSorter::new(
            Box::new(RowsCursor::new(rows)),
            OrderingSpec::by_fields(directions).unwrap(),
            policy,
            context,
            Arc::new(provider),
        )
    }

    fn input() -> Vec<Row> {
        (0..40).map(|i| row![(i * 7) % 13, i]).collect()
    }

    #[test]
    fn test_in_memory_sort() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir, 1 << 20, 16);
        let mut sort = sorter(ctx.clone(), input(), &[true], DuplicatePolicy::Default);
        let rows = collect_rows(&mut sort).unwrap();
        assert_eq!(rows.len(), 40);
        assert_eq!(sort.spilled_runs(), 0);
        assert!(rows.windows(2).all(|w| w[0].values()[0].as_int() <= w[1].values()[0].as_int()));
        assert_eq!(ctx.metrics().snapshot().spill_files, 0);
    }

    #[test]
    fn test_spill_matches_in_memory() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir, 1 << 20, 16);
        let mut memory = sorter(ctx, input(), &[false], DuplicatePolicy::Preserve);
        let expected = collect_rows(&mut memory).unwrap();

        let ctx = context(&dir, 64, 3);
        let mut spilling = sorter(ctx.clone(), input(), &[false], DuplicatePolicy::Preserve);
        assert_eq!(collect_rows(&mut spilling).unwrap(), expected);
        let snapshot = ctx.metrics().snapshot();
        assert!(snapshot.spill_files > 3);
        assert!(snapshot.merge_passes >= 1);
        assert!(spilling.spilled_runs() <= 3);

        // Reopening replays the retained runs
        assert_eq!(collect_rows(&mut spilling).unwrap(), expected);
        spilling.destroy();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_merge_group_streams_into_one_run() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir, 1 << 20, 2);
        let sort = sorter(ctx, Vec::new(), &[true], DuplicatePolicy::Preserve);
        let key = |k: i64, tag: i64| {
            let value = crate::codec::row::row_to_vec(row![k, tag].values()).unwrap();
            SortKey::new(vec![vec![k as u8]], value)
        };
        let mut group = Vec::new();
        for run in [vec![key(1, 0), key(4, 0)], vec![key(2, 1), key(4, 1)], vec![key(3, 2)]] {
            group.push(sort.runs.writer().unwrap().write_all(run.iter()).unwrap());
        }
        let inputs: Vec<_> = group.iter().map(|r| r.path().to_path_buf()).collect();

        let merged = sort.runs.merge_group(group).unwrap();
        assert_eq!(merged.records(), 5);
        assert!(inputs.iter().all(|p| !p.exists()));

        let mut reader = merged.reader().unwrap();
        let mut rows = Vec::new();
        while let Some(key) = reader.next_key().unwrap() {
            rows.push(key.to_row().unwrap());
        }
        assert_eq!(rows, vec![row![1, 0], row![2, 1], row![3, 2], row![4, 0], row![4, 1]]);
        merged.remove();
    }

    #[test]
    fn test_suppress_keeps_first() {
        let dir = TempDir::new().unwrap();
        let rows = vec![row![3, "x"], row![1, "y"], row![3, "z"]];
        for memory in [1 << 20, 1] {
            let ctx = context(&dir, memory, 2);
            let mut sort = sorter(ctx, rows.clone(), &[true], DuplicatePolicy::Suppress);
            let out = collect_rows(&mut sort).unwrap();
            assert_eq!(out, vec![row![1, "y"], row![3, "x"]]);
        }
    }

    #[test]
    fn test_empty_input() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir, 1 << 20, 16);
        let mut sort = sorter(ctx, Vec::new(), &[true], DuplicatePolicy::Default);
        assert!(collect_rows(&mut sort).unwrap().is_empty());
    }

    #[test]
    fn test_jump_unsupported_and_state_errors() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir, 1 << 20, 16);
        let mut sort = sorter(ctx, input(), &[true], DuplicatePolicy::Default);
        assert_eq!(sort.next().unwrap_err().code().code(), "AERO_CURSOR_STATE");
        sort.open().unwrap();
        let err = sort.jump(&row![1], &ColumnSelector::Leading(1)).unwrap_err();
        assert_eq!(err.code().code(), "AERO_CURSOR_UNSUPPORTED");
        assert_eq!(sort.next().unwrap().map(|r| r.values()[0].clone()), Some(Value::Int(0)));
    }

    #[test]
    fn test_cancellation_during_load() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir, 64, 16);
        ctx.cancellation().cancel();
        let mut sort = sorter(ctx.clone(), input(), &[true], DuplicatePolicy::Default);
        let err = sort.open().unwrap_err();
        assert!(err.is_cancellation());
        assert_eq!(err.phase(), Some(ExecutionPhase::Load));
        assert_eq!(sort.state(), CursorState::Idle);
        assert_eq!(ctx.metrics().snapshot().cancellations, 1);
    }
}
