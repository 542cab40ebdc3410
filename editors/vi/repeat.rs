//! Repeating the last change with `.`.
//!
//! Only the most recent buffer-changing operation is kept. Changes that
//! went through insert mode also keep the text typed before Escape; the
//! replay runs the operation again and types that text into a fresh
//! session, so the count, block and `.` register behave as they did the
//! first time. A change made on a visual selection keeps the size of the
//! selection and is replayed on a selection of that size at the cursor.

use crate::error::{EngineError, Result};
use crate::evaluator::{ResolvedOperation, VisualKind};
use crate::executor::{Executor, Transition};
use crate::grammar::insert::InsertInput;
use crate::surface::{SurfaceExt, TextSurface};
use tracing::debug;

/// The last change, as `.` replays it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub operation: ResolvedOperation,
    /// Text typed in the insert session that completed the change.
    pub inserted: Option<String>,
    /// Size of the visual selection the change was made on.
    pub selection: Option<SelectionExtent>,
}

/// Size of a visual selection, independent of where it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionExtent {
    pub kind: VisualKind,
    /// Lines below the first one.
    pub lines: usize,
    /// Characterwise on one line: characters after the first. Characterwise
    /// over several lines: column of the last character. Blockwise: columns
    /// right of the first, `usize::MAX` when the block runs to line ends.
    pub columns: usize,
}

impl SelectionExtent {
    pub fn measure(s: &dyn TextSurface, anchor: usize, cursor: usize, kind: VisualKind, to_line_end: bool) -> Self {
        let (start, end) = if anchor <= cursor { (anchor, cursor) } else { (cursor, anchor) };
        let lines = s.line_of(end) - s.line_of(start);
        let columns = match kind {
            VisualKind::Char if lines == 0 => end - start,
            VisualKind::Char => s.column_of(end),
            VisualKind::Line => 0,
            VisualKind::Block if to_line_end => usize::MAX,
            VisualKind::Block => s.column_of(anchor).abs_diff(s.column_of(cursor)),
        };
        Self { kind, lines, columns }
    }

    /// Anchor and cursor of a selection of this size starting at `at`,
    /// shrunk to fit the buffer.
    pub fn place(&self, s: &dyn TextSurface, at: usize) -> (usize, usize) {
        let line = s.line_of(at);
        let last = (line + self.lines).min(s.last_line());
        let end = match self.kind {
            VisualKind::Line => s.line_start(last),
            VisualKind::Char if self.lines == 0 => (at + self.columns).min(s.last_char_of(line)).max(at),
            VisualKind::Char => s.offset_at(last, self.columns).min(s.last_char_of(last)),
            VisualKind::Block => {
                let column = s.column_of(at).saturating_add(self.columns);
                s.offset_at(last, column).min(s.last_char_of(last))
            }
        };
        (at, end)
    }

    pub fn to_line_end(&self) -> bool {
        self.kind == VisualKind::Block && self.columns == usize::MAX
    }
}

impl Executor<'_> {
    /// Re-run the last change at the cursor. A count replaces the recorded
    /// one.
    pub fn repeat_last_change(&mut self, count: Option<usize>) -> Result<Transition> {
        let record = self
            .state
            .last_change
            .clone()
            .ok_or(EngineError::NoPreviousChange)?;
        let mut operation = record.operation;
        if count.is_some() {
            operation.count = count;
        }
        debug!(%operation, "repeat last change");

        self.surface.begin_undo_group();
        let result = self.replay(&operation, record.inserted.as_deref(), record.selection);
        self.surface.end_undo_group();
        result?;

        self.state.last_change = Some(ChangeRecord {
            operation,
            inserted: record.inserted,
            selection: record.selection,
        });
        Ok(Transition::Stay)
    }

    fn replay(
        &mut self,
        operation: &ResolvedOperation,
        inserted: Option<&str>,
        selection: Option<SelectionExtent>,
    ) -> Result<()> {
        self.visual = None;
        if let Some(extent) = selection {
            let (anchor, cursor) = extent.place(&*self.surface, self.surface.cursor());
            debug!(?extent, anchor, cursor, "replay on selection");
            self.surface.set_cursor(cursor);
            self.state.curswant = extent.to_line_end().then_some(usize::MAX);
            self.visual = Some((anchor, extent.kind));
        }
        let executed = self.execute(operation);
        self.visual = None;
        let Transition::Insert(mut session) = executed? else {
            return Ok(());
        };
        let mut typed = Ok(());
        for c in inserted.unwrap_or_default().chars() {
            let input = if c == '\n' {
                InsertInput::Newline
            } else {
                InsertInput::Text(c)
            };
            typed = self.insert_input(&mut session, input);
            if typed.is_err() {
                break;
            }
        }
        let finished = self.finish_insert(session);
        typed.and(finished)
    }
}
