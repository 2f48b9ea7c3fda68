//! Load-phase input handling shared by the sorters

use crate::context::QueryContext;
use crate::executor::{Cursor, CursorState, ExecutionPhase, ExecutionResult};
use crate::types::Row;

fn pull_all<F>(input: &mut dyn Cursor, context: &QueryContext, sink: &mut F) -> ExecutionResult<u64>
where
    F: FnMut(Row) -> ExecutionResult<()>,
{
    if input.state() == CursorState::Idle {
        input.open()?;
    }
    let mut rows = 0u64;
    loop {
        context.check_canceled()?;
        match input.next()? {
            Some(row) => {
                sink(row)?;
                rows += 1;
            }
            None => return Ok(rows),
        }
    }
}

/// Drain `input` into `sink`, polling cancellation before every row.
/// Returns the number of rows read. On failure the input is closed.
pub fn drain_input<F>(
    input: &mut dyn Cursor,
    context: &QueryContext,
    mut sink: F,
) -> ExecutionResult<u64>
where
    F: FnMut(Row) -> ExecutionResult<()>,
{
    pull_all(input, context, &mut sink).map_err(|e| {
        input.close();
        e.in_phase(ExecutionPhase::Load)
    })
}
