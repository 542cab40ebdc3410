//! Insert and replace sessions.
//!
//! A session lives in the evaluator's insert root from the key that
//! entered insert mode until Escape. It keeps the text typed so far so the
//! count can replay it, a visual block can copy it to the other lines and
//! `.` can repeat it.

use super::Executor;
use crate::command::operator::BlockInsert;
use crate::command::text_object;
use crate::error::Result;
use crate::evaluator::{InsertAt, ResolvedOperation};
use crate::grammar::insert::{CursorMove, InsertInput};
use crate::marks::{CHANGE_END, CHANGE_START, LAST_CHANGE};
use crate::repeat::{ChangeRecord, SelectionExtent};
use crate::surface::{SurfaceExt, TextRange, TextSurface};
use tracing::debug;

/// State of insert mode between entering and Escape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertSession {
    pub entry: InsertAt,
    /// Times the typed text is inserted in total.
    pub count: usize,
    /// Net text typed so far.
    pub typed: String,
    /// Offset where typing started.
    pub start: usize,
    /// Characters overwritten in replace mode; `None` where a character
    /// was appended instead.
    replaced: Vec<Option<char>>,
    pub block: Option<BlockInsert>,
    /// Pad short block lines with spaces (`A` on a block).
    block_pad: bool,
    /// The command that opened the session, remembered for `.`.
    pub operation: Option<ResolvedOperation>,
    /// Selection the opening command changed, for `.` after visual `c`.
    pub selection: Option<SelectionExtent>,
    /// The cursor was moved with a key; the count no longer applies.
    restarted: bool,
}

impl InsertSession {
    pub fn new(entry: InsertAt, count: usize, start: usize, operation: Option<ResolvedOperation>) -> Self {
        Self {
            entry,
            count: count.max(1),
            typed: String::new(),
            start,
            replaced: Vec::new(),
            block: None,
            block_pad: false,
            operation,
            selection: None,
            restarted: false,
        }
    }

    /// Copy typed text to the other lines of a block when the session ends.
    pub fn with_block(mut self, block: BlockInsert, pad: bool) -> Self {
        self.block = Some(block);
        self.block_pad = pad;
        self
    }

    pub fn is_replace(&self) -> bool {
        self.entry == InsertAt::Replace
    }

    /// Forget what was typed, as if insert mode was entered at `offset`.
    fn restart(&mut self, offset: usize) {
        self.typed.clear();
        self.replaced.clear();
        self.start = offset;
        self.block = None;
        self.count = 1;
        self.restarted = true;
    }
}

impl Executor<'_> {
    /// Position the cursor for `at` and open a session. Opens the undo
    /// group the session closes.
    pub fn start_insert(
        &mut self,
        at: InsertAt,
        count: usize,
        operation: Option<ResolvedOperation>,
    ) -> Result<InsertSession> {
        self.surface.begin_undo_group();
        match self.insert_position(at) {
            Ok(pos) => {
                self.surface.set_cursor(pos);
                debug!(?at, count, pos, "insert session");
                Ok(InsertSession::new(at, count, pos, operation))
            }
            Err(e) => {
                self.surface.end_undo_group();
                Err(e)
            }
        }
    }

    fn insert_position(&mut self, at: InsertAt) -> Result<usize> {
        let cursor = self.surface.cursor();
        let line = self.surface.line_of(cursor);
        let s = &*self.surface;
        let pos = match at {
            InsertAt::Before | InsertAt::Replace => cursor,
            InsertAt::After => {
                if s.line_is_empty(line) {
                    cursor
                } else {
                    (cursor + 1).min(s.line_end(line))
                }
            }
            InsertAt::FirstNonBlank => {
                let range = s.line_range(line);
                let mut pos = range.start;
                while pos < range.end && matches!(s.char_at(pos), Some(' ' | '\t')) {
                    pos += 1;
                }
                pos
            }
            InsertAt::LineEnd => s.line_end(line),
            InsertAt::ColumnZero => s.line_start(line),
            InsertAt::OpenBelow => {
                let end = s.line_end(line);
                self.edit().insert(end, "\n")?;
                end + 1
            }
            InsertAt::OpenAbove => {
                let start = s.line_start(line);
                self.edit().insert(start, "\n")?;
                start
            }
        };
        Ok(pos)
    }

    /// Apply one insert-mode edit to the session.
    pub fn insert_input(&mut self, session: &mut InsertSession, input: InsertInput) -> Result<()> {
        match input {
            InsertInput::Text(c) => self.type_text(session, &c.to_string()),
            InsertInput::Newline => {
                let cursor = self.surface.cursor();
                self.edit().insert(cursor, "\n")?;
                session.typed.push('\n');
                session.replaced.push(None);
                Ok(())
            }
            InsertInput::Tab => {
                let text = if self.options.expandtab {
                    let ts = self.options.tabstop.max(1);
                    let column = self.surface.column_of(self.surface.cursor());
                    " ".repeat(ts - column % ts)
                } else {
                    "\t".to_string()
                };
                self.type_text(session, &text)
            }
            InsertInput::Backspace => self.backspace(session),
            InsertInput::DeleteForward => {
                let cursor = self.surface.cursor();
                if cursor < self.surface.len_chars() {
                    self.edit().delete(TextRange::new(cursor, cursor + 1))?;
                    self.surface.set_cursor(cursor);
                }
                Ok(())
            }
            InsertInput::DeleteWord => {
                let cursor = self.surface.cursor();
                let from = word_start_before(&*self.surface, cursor);
                self.erase_before(session, from)
            }
            InsertInput::DeleteToLineStart => {
                let cursor = self.surface.cursor();
                let line_start = self.surface.line_start(self.surface.line_of(cursor));
                // stop at the insert start first
                let from = if session.start > line_start && session.start < cursor {
                    session.start
                } else {
                    line_start
                };
                self.erase_before(session, from)
            }
            InsertInput::Move(direction) => {
                let target = self.insert_move_target(direction);
                self.relocate_insert(session, target);
                Ok(())
            }
            InsertInput::Register(name) => {
                let content = self.registers.require(name)?.content.clone();
                self.type_text(session, &content)
            }
            // Escape is handled by `finish_insert`.
            InsertInput::Exit => Ok(()),
        }
    }

    /// Insert (or in replace mode overwrite with) `text` at the cursor.
    fn type_text(&mut self, session: &mut InsertSession, text: &str) -> Result<()> {
        for c in text.chars() {
            let cursor = self.surface.cursor();
            let overwritten = match self.surface.char_at(cursor) {
                Some(old) if session.is_replace() && old != '\n' && c != '\n' => Some(old),
                _ => None,
            };
            let end = if overwritten.is_some() { cursor + 1 } else { cursor };
            let after = self.edit().replace(TextRange::new(cursor, end), &c.to_string())?;
            self.surface.set_cursor(after);
            session.replaced.push(overwritten);
            session.typed.push(c);
        }
        Ok(())
    }

    fn backspace(&mut self, session: &mut InsertSession) -> Result<()> {
        let cursor = self.surface.cursor();
        if cursor == 0 {
            return Ok(());
        }
        if session.is_replace() {
            match session.replaced.pop() {
                Some(Some(old)) => {
                    self.edit().replace(TextRange::new(cursor - 1, cursor), &old.to_string())?;
                }
                Some(None) => {
                    self.edit().delete(TextRange::new(cursor - 1, cursor))?;
                }
                // Before the replaced text backspace only moves.
                None => {}
            }
            session.typed.pop();
            self.surface.set_cursor(cursor - 1);
            return Ok(());
        }
        self.edit().delete(TextRange::new(cursor - 1, cursor))?;
        self.surface.set_cursor(cursor - 1);
        session.typed.pop();
        session.replaced.pop();
        if cursor - 1 < session.start {
            session.start = cursor - 1;
        }
        Ok(())
    }

    /// Erase from `from` to the cursor.
    fn erase_before(&mut self, session: &mut InsertSession, from: usize) -> Result<()> {
        let cursor = self.surface.cursor();
        if from >= cursor {
            return Ok(());
        }
        if session.is_replace() {
            for _ in from..cursor {
                self.backspace(session)?;
            }
            return Ok(());
        }
        self.edit().delete(TextRange::new(from, cursor))?;
        self.surface.set_cursor(from);
        for _ in from..cursor {
            session.typed.pop();
            session.replaced.pop();
        }
        session.start = session.start.min(from);
        Ok(())
    }

    /// Move the cursor inside insert mode; typing starts over from there
    /// and the edits so far become their own undo step.
    pub fn relocate_insert(&mut self, session: &mut InsertSession, offset: usize) {
        self.surface.set_cursor(offset);
        let cursor = self.surface.cursor();
        self.surface.end_undo_group();
        self.surface.begin_undo_group();
        session.restart(cursor);
    }

    fn insert_move_target(&self, direction: CursorMove) -> usize {
        let s = &*self.surface;
        let cursor = s.cursor();
        let line = s.line_of(cursor);
        let column = s.column_of(cursor);
        match direction {
            CursorMove::Left => {
                if cursor > s.line_start(line) {
                    cursor - 1
                } else {
                    cursor
                }
            }
            CursorMove::Right => (cursor + 1).min(s.line_end(line)),
            CursorMove::Up if line > 0 => s.offset_at(line - 1, column),
            CursorMove::Down if line < s.last_line() => s.offset_at(line + 1, column),
            CursorMove::Up | CursorMove::Down => cursor,
            CursorMove::Home => s.line_start(line),
            CursorMove::End => s.line_end(line),
        }
    }

    /// Escape: replay the count, fill the block, remember the change and
    /// close the undo group.
    pub fn finish_insert(&mut self, mut session: InsertSession) -> Result<()> {
        let result = self.replay_typed(&mut session);
        let cursor = self.surface.cursor();

        if !session.typed.is_empty() {
            self.registers.set_read_only('.', &session.typed);
            self.state.modified = true;
        }
        if session.start <= cursor {
            self.state.marks.set_internal(CHANGE_START, session.start);
            self.state.marks.set_internal(CHANGE_END, cursor);
        }
        if !session.typed.is_empty() || session.operation.is_some() {
            self.state.marks.set_internal(LAST_CHANGE, cursor);
        }

        let line_start = self.surface.line_start(self.surface.line_of(cursor));
        let rest = if cursor > line_start { cursor - 1 } else { cursor };
        self.surface.set_cursor(self.surface.clamp_normal(rest));
        self.surface.end_undo_group();

        if let Some(mut operation) = session.operation.take() {
            if !session.restarted || !session.typed.is_empty() {
                operation.count = (session.count > 1).then_some(session.count).or(operation.count);
                self.state.last_change = Some(ChangeRecord {
                    operation,
                    inserted: Some(session.typed.clone()),
                    selection: session.selection,
                });
            }
        }
        result
    }

    fn replay_typed(&mut self, session: &mut InsertSession) -> Result<()> {
        if session.typed.is_empty() {
            return Ok(());
        }
        let typed = session.typed.clone();
        if !session.restarted {
            for _ in 1..session.count {
                if session.entry.opens_line() {
                    let line = self.surface.line_of(self.surface.cursor());
                    let end = self.surface.line_end(line);
                    let after = self.edit().insert(end, &format!("\n{}", typed))?;
                    self.surface.set_cursor(after);
                } else {
                    self.type_text(session, &typed)?;
                }
            }
        }
        session.typed = typed;

        if let Some(block) = session.block {
            if !session.typed.contains('\n') {
                self.fill_block(block, session.block_pad, &session.typed)?;
            }
        }
        Ok(())
    }

    /// Insert `text` on the block lines below the first one.
    fn fill_block(&mut self, block: BlockInsert, pad: bool, text: &str) -> Result<()> {
        let cursor = self.surface.cursor();
        for line in block.first + 1..=block.last.min(self.surface.last_line()) {
            let range = self.surface.line_range(line);
            let at = if block.column == usize::MAX {
                range.end
            } else if range.len() < block.column {
                if !pad {
                    continue;
                }
                let padding = " ".repeat(block.column - range.len());
                self.edit().insert(range.end, &padding)?;
                range.end + padding.len()
            } else {
                range.start + block.column
            };
            self.edit().insert(at, text)?;
        }
        self.surface.set_cursor(cursor);
        Ok(())
    }
}

/// Start of the word before `cursor` for `Ctrl-W`: blanks first, then one
/// run of the same character class. At a line start it takes the newline.
fn word_start_before(s: &dyn TextSurface, cursor: usize) -> usize {
    let line_start = s.line_start(s.line_of(cursor));
    if cursor == line_start {
        return cursor.saturating_sub(1);
    }
    let mut pos = cursor;
    while pos > line_start && s.char_at(pos - 1).is_some_and(text_object::is_blank) {
        pos -= 1;
    }
    if pos > line_start {
        let class = text_object::char_class(s.char_at(pos - 1), false);
        while pos > line_start && text_object::char_class(s.char_at(pos - 1), false) == class {
            pos -= 1;
        }
    }
    pos
}

