//! Mixed-order composite scans
//!
//! `MixedOrderCursor` drives one `SegmentScanState` per ordered key column,
//! like an odometer: the deepest state advances, an exhausted state carries
//! into its parent, and every state below a state that moved is restarted.
//! Each column may scan ascending or descending independently.

use std::sync::Arc;

use super::boundary::{range_boundaries, Boundary, ScanOrder};
use super::range::KeyRange;
use super::segment::{JumpOutcome, SegmentBound, SegmentScanState};
use crate::codec::row::decode_row;
use crate::context::QueryContext;
use crate::executor::{
    ColumnSelector, Cursor, CursorState, ExecutionError, ExecutionPhase, ExecutionResult, Lifecycle,
};
use crate::index::IndexDef;
use crate::observability::{log_event_with_fields, Event};
use crate::storage::{OrderedStore, TreeCursor};
use crate::types::{Row, RowSource, Value};

/// Next odometer move
#[derive(Debug, Clone, Copy)]
enum Step {
    /// Advance the state at this field
    Advance(usize),
    /// Restart the state at this field under its parent
    Start(usize),
}

/// Ordered scan over an index with per-column directions
pub struct MixedOrderCursor<S: OrderedStore> {
    traversal: TreeCursor<S>,
    index: IndexDef,
    range: KeyRange,
    order: ScanOrder,
    context: QueryContext,
    lifecycle: Lifecycle,
    states: Vec<SegmentScanState>,
    range_start: Option<Boundary>,
    jump_start: Option<Boundary>,
    end: Option<Boundary>,
    more: bool,
    just_opened: bool,
    past_start: bool,
}

impl<S: OrderedStore> MixedOrderCursor<S> {
    /// Scan `store` as index `index` within `range`.
    ///
    /// `ascending[i]` gives the direction of key column `i`; columns past the
    /// end of `ascending` scan ascending.
    pub fn new(
        store: Arc<S>,
        index: IndexDef,
        range: KeyRange,
        ascending: Vec<bool>,
        context: QueryContext,
    ) -> Self {
        let order = ScanOrder::new(index.collations(), ascending);
        Self {
            traversal: TreeCursor::new(store),
            index,
            range,
            order,
            context,
            lifecycle: Lifecycle::new(),
            states: Vec::new(),
            range_start: None,
            jump_start: None,
            end: None,
            more: false,
            just_opened: false,
            past_start: true,
        }
    }

    /// Index being scanned
    pub fn index(&self) -> &IndexDef {
        &self.index
    }

    /// Range being scanned
    pub fn range(&self) -> &KeyRange {
        &self.range
    }

    /// Segment states of the open scan, in key order
    pub fn states(&self) -> &[SegmentScanState] {
        &self.states
    }

    /// Build the segment states for the range and directions.
    ///
    /// Bound columns get single-value states for the equality prefix and a
    /// range state for the last one. Unbound columns up to the last
    /// descending one get their own states; the ascending suffix after it is
    /// covered by one remaining-segments state.
    fn build_states(&self) -> Vec<SegmentScanState> {
        let key_columns = self.index.key_columns;
        let bound_columns = self.range.bound_columns();
        let bound_states = bound_columns.min(key_columns);
        let ordered_states = (0..key_columns)
            .rev()
            .find(|f| !self.order.ascending(*f))
            .map_or(0, |f| f + 1)
            .max(bound_states);

        let mut states = Vec::with_capacity(ordered_states + 1);
        for field in 0..bound_states {
            let ascending = self.order.ascending(field);
            if field + 1 < bound_columns {
                let value = self.order.encode(field, &self.range.lo()[field]);
                states.push(SegmentScanState::single_value(field, ascending, value));
            } else {
                let bound = |v: &Value, inclusive| {
                    SegmentBound::new(self.order.encode(field, v), inclusive)
                };
                let lo = self.range.lo().get(field).map(|v| bound(v, self.range.lo_inclusive()));
                let hi = self.range.hi().get(field).map(|v| bound(v, self.range.hi_inclusive()));
                states.push(SegmentScanState::range(field, ascending, lo, hi));
            }
        }
        for field in bound_states..ordered_states {
            states.push(SegmentScanState::unbounded(field, self.order.ascending(field)));
        }
        if ordered_states < key_columns || self.index.suffixes_keys() {
            states.push(SegmentScanState::remaining(ordered_states));
        }
        states
    }

    fn parent_of(&self, position: usize) -> Vec<u8> {
        match position {
            0 => Vec::new(),
            p => self.states[p - 1].current().to_vec(),
        }
    }

    /// Run the odometer from `step` until every state is positioned.
    /// Returns false when the scan is exhausted.
    fn drive(&mut self, mut step: Step) -> ExecutionResult<bool> {
        loop {
            match step {
                Step::Advance(position) => {
                    if self.states[position].advance(&mut self.traversal)? {
                        step = Step::Start(position + 1);
                    } else if position == 0 {
                        return Ok(false);
                    } else {
                        step = Step::Advance(position - 1);
                    }
                }
                Step::Start(position) => {
                    if position == self.states.len() {
                        return Ok(true);
                    }
                    let parent = self.parent_of(position);
                    if self.states[position].start_scan(&mut self.traversal, &parent)? {
                        step = Step::Start(position + 1);
                    } else if position == 0 {
                        return Ok(false);
                    } else {
                        step = Step::Advance(position - 1);
                    }
                }
            }
        }
    }

    fn position_first(&mut self) -> ExecutionResult<()> {
        self.index.validate()?;
        self.range.validate(&self.index)?;
        self.states = self.build_states();
        let (start, end) = if self.index.unique {
            range_boundaries(&self.range, &self.order)
        } else {
            (None, None)
        };
        self.range_start = start;
        self.jump_start = None;
        self.end = end;
        self.past_start = self.range_start.is_none();
        self.traversal.reset();
        self.more = self.drive(Step::Start(0))?;
        self.just_opened = true;
        Ok(())
    }

    fn current_row(&self) -> ExecutionResult<Row> {
        let value = self
            .traversal
            .value()
            .ok_or_else(|| {
                ExecutionError::traversal_failed("traversal is not positioned on an entry")
            })?;
        decode_row(value).map_err(|e| {
            ExecutionError::data_corruption(format!("index {} entry value: {}", self.index.name, e))
        })
    }

    fn before_start(&self, row: &Row) -> bool {
        let check = |b: &Option<Boundary>| {
            b.as_ref().map_or(false, |b| b.is_before_start(row, &self.order))
        };
        check(&self.range_start) || check(&self.jump_start)
    }

    fn fetch(&mut self) -> ExecutionResult<Option<Row>> {
        loop {
            self.context.check_canceled()?;
            if self.just_opened {
                self.just_opened = false;
            } else if self.more {
                let last = self.states.len() - 1;
                self.more = self.drive(Step::Advance(last))?;
            }
            if !self.more {
                return Ok(None);
            }
            let row = self.current_row()?;
            if !self.past_start {
                if self.before_start(&row) {
                    continue;
                }
                self.past_start = true;
            }
            if let Some(end) = &self.end {
                if end.is_past_end(&row, &self.order) {
                    self.more = false;
                    return Ok(None);
                }
            }
            return Ok(Some(row));
        }
    }

    fn jump_to(&mut self, row: &Row, selector: &ColumnSelector) -> ExecutionResult<()> {
        let mut position = 0;
        self.more = loop {
            if position == self.states.len() {
                break true;
            }
            let target = self.jump_target(position, row, selector);
            let parent = self.parent_of(position);
            let outcome = match target {
                Some(target) => self.states[position].jump(&mut self.traversal, &parent, &target)?,
                None => {
                    if self.states[position].start_scan(&mut self.traversal, &parent)? {
                        JumpOutcome::Exact
                    } else {
                        JumpOutcome::Exhausted
                    }
                }
            };
            match outcome {
                JumpOutcome::Exact => position += 1,
                JumpOutcome::Beyond => break self.drive(Step::Start(position + 1))?,
                JumpOutcome::Exhausted if position == 0 => break false,
                JumpOutcome::Exhausted => break self.drive(Step::Advance(position - 1))?,
            }
        };

        self.jump_start = None;
        if self.index.unique {
            let leading = (0..row.field_count())
                .take_while(|f| selector.includes(*f))
                .count();
            if leading > 0 {
                self.jump_start = Some(Boundary::new(&row.values()[..leading], true, &self.order));
            }
        }
        self.past_start = self.range_start.is_none() && self.jump_start.is_none();
        self.just_opened = true;
        Ok(())
    }

    /// Encoded jump target for the state at `position`, or `None` if the
    /// state's columns are not selected
    fn jump_target(
        &self,
        position: usize,
        row: &Row,
        selector: &ColumnSelector,
    ) -> Option<Vec<u8>> {
        let state = &self.states[position];
        let last = if state.is_remaining() {
            self.index.key_columns
        } else {
            state.field() + 1
        };
        let mut target = Vec::new();
        for field in state.field()..last.min(row.field_count()) {
            if !selector.includes(field) {
                break;
            }
            target.extend_from_slice(&self.order.encode(field, row.value(field)));
        }
        if target.is_empty() {
            None
        } else {
            Some(target)
        }
    }

    fn fail(
        &mut self,
        error: ExecutionError,
        event: Event,
        phase: ExecutionPhase,
    ) -> ExecutionError {
        self.close();
        let error = error.in_phase(phase);
        if !error.is_cancellation() {
            log_event_with_fields(
                event,
                &[("index", self.index.name.as_str()), ("code", error.code().code())],
            );
        }
        error
    }
}

impl<S: OrderedStore> Cursor for MixedOrderCursor<S> {
    fn open(&mut self) -> ExecutionResult<()> {
        self.lifecycle.open()?;
        match self.position_first() {
            Ok(()) => {
                self.context.metrics().increment_scans_opened();
                let states = self.states.len().to_string();
                log_event_with_fields(
                    Event::ScanOpen,
                    &[("index", self.index.name.as_str()), ("states", states.as_str())],
                );
                Ok(())
            }
            Err(e) => Err(self.fail(e, Event::ScanOpenFailed, ExecutionPhase::ScanOpen)),
        }
    }

    fn next(&mut self) -> ExecutionResult<Option<Row>> {
        self.lifecycle.require_active("next")?;
        match self.fetch() {
            Ok(Some(row)) => {
                self.context.metrics().increment_rows_scanned();
                Ok(Some(row))
            }
            Ok(None) => {
                self.close();
                Ok(None)
            }
            Err(e) => Err(self.fail(e, Event::ScanFailed, ExecutionPhase::ScanAdvance)),
        }
    }

    fn jump(&mut self, row: &Row, selector: &ColumnSelector) -> ExecutionResult<()> {
        self.lifecycle.require_usable("jump")?;
        if self.lifecycle.state() == CursorState::Idle {
            self.open()?;
        }
        match self.jump_to(row, selector) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(e, Event::ScanFailed, ExecutionPhase::ScanAdvance)),
        }
    }

    fn close(&mut self) {
        self.lifecycle.close();
        self.more = false;
        self.just_opened = false;
        self.traversal.reset();
    }

    fn destroy(&mut self) {
        self.close();
        self.lifecycle.destroy();
        self.states.clear();
        self.range_start = None;
        self.jump_start = None;
        self.end = None;
    }

    fn state(&self) -> CursorState {
        self.lifecycle.state()
    }
}
