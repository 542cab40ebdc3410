//! Executing resolved operations.
//!
//! The executor turns a [`ResolvedOperation`] into edits on the surface,
//! register writes and state updates, then tells the engine which mode
//! root comes next through a [`Transition`]. It borrows everything it needs
//! from the engine for the duration of one operation.

pub mod ex;
pub mod insert;

pub use insert::InsertSession;

use crate::command::motion::{self, MotionContext, MotionKind, MotionResult};
use crate::command::operator::{self, BlockInsert};
use crate::command::text_object;
use crate::command::{EditContext, FindKind, Motion, Operator, Region, Scope, TextObject};
use crate::error::{EngineError, Result};
use crate::evaluator::{Action, InsertAt, OperationKind, ResolvedOperation, Target, VisualKind};
use crate::ex::{HostRequest, SubstituteFlags};
use crate::feedback::Feedback;
use crate::input::{format_keys, parse_keys, KeyEvent};
use crate::marks::{Marks, CHANGE_END, CHANGE_START, LAST_CHANGE, PREVIOUS_CONTEXT};
use crate::options::Options;
use crate::register::{RegisterEntry, RegisterKind, RegisterStore};
use crate::repeat::{ChangeRecord, SelectionExtent};
use crate::search::{SearchDirection, SearchState};
use crate::surface::{SurfaceExt, TextRange, TextSurface};
use tracing::debug;

/// Macro being recorded with `q`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    pub register: char,
    pub keys: Vec<KeyEvent>,
}

/// Last `:substitute`, for `:&` and `:s` without a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstituteRecord {
    pub pattern: String,
    pub replacement: String,
    pub flags: SubstituteFlags,
}

/// Per-engine state that outlives a single operation.
#[derive(Debug, Clone, Default)]
pub struct EngineState {
    pub marks: Marks,
    pub search: SearchState,
    pub last_find: Option<(FindKind, char)>,
    /// Remembered column for `j`/`k`; `usize::MAX` sticks to the line end.
    pub curswant: Option<usize>,
    pub last_substitute: Option<SubstituteRecord>,
    pub last_change: Option<ChangeRecord>,
    pub recording: Option<Recording>,
    /// Register last played with `@`.
    pub last_macro: Option<char>,
    /// Write and quit requests waiting for the host.
    pub requests: Vec<HostRequest>,
    /// The buffer changed since it was last written.
    pub modified: bool,
}

/// Mode root the engine should switch to after an operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Keep the current root.
    Stay,
    Normal,
    Insert(InsertSession),
    Visual { anchor: usize, kind: VisualKind },
    /// Feed `keys` through the engine `count` times.
    Play { keys: Vec<KeyEvent>, count: usize },
}

pub struct Executor<'a> {
    pub surface: &'a mut dyn TextSurface,
    pub registers: &'a mut RegisterStore,
    pub state: &'a mut EngineState,
    pub options: &'a mut Options,
    pub feedback: &'a mut dyn Feedback,
    /// Selection active when the operation was typed.
    pub visual: Option<(usize, VisualKind)>,
}

fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// End of an inclusive range ending on `pos`, never taking a line break.
fn inclusive_end(s: &dyn TextSurface, pos: usize) -> usize {
    match s.char_at(pos) {
        Some(c) if c != '\n' => pos + 1,
        _ => pos,
    }
}

/// Region of an exclusive motion from `start` to `end`, with the `o_v`
/// adjustments for ends in column 0.
fn exclusive_region(s: &dyn TextSurface, start: usize, end: usize) -> Region {
    let first = s.line_of(start);
    if end > start && s.line_of(end) > first && s.column_of(end) == 0 {
        let last = s.line_of(end) - 1;
        let range = s.line_range(first);
        let mut indent = range.start;
        while indent < range.end && matches!(s.char_at(indent), Some(' ' | '\t')) {
            indent += 1;
        }
        if start <= indent {
            return Region::Lines { first, last };
        }
        return Region::Chars(TextRange::new(start, s.line_end(last)));
    }
    Region::Chars(TextRange::new(start, end))
}

impl<'a> Executor<'a> {
    pub fn execute(&mut self, op: &ResolvedOperation) -> Result<Transition> {
        debug!(%op, visual = ?self.visual, "execute");
        match &op.kind {
            OperationKind::Motion(motion) => self.move_cursor(motion, op.count),
            OperationKind::Operator { operator, target } => self.run_operator(op, *operator, target),
            OperationKind::Action(action) => self.run_action(op, action),
            OperationKind::CommandLine { prefix, text } => self.run_command_line(*prefix, text),
        }
    }

    fn edit(&mut self) -> EditContext<'_> {
        EditContext::new(&mut *self.surface, &mut self.state.marks)
    }

    /// Run `f` inside one undo group.
    fn grouped<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.surface.begin_undo_group();
        let result = f(self);
        self.surface.end_undo_group();
        result
    }

    fn motion_context(&self, operator_pending: bool) -> MotionContext<'_> {
        MotionContext {
            preferred_column: self.state.curswant,
            last_find: self.state.last_find,
            search: &self.state.search,
            options: &*self.options,
            marks: &self.state.marks,
            operator_pending,
        }
    }

    fn status(&mut self, message: &str) {
        self.feedback.report_status(message);
    }

    /// Size of the active selection, kept with a visual change for `.`.
    fn selection_extent(&self) -> Option<SelectionExtent> {
        let (anchor, kind) = self.visual?;
        let to_line_end = self.state.curswant == Some(usize::MAX);
        Some(SelectionExtent::measure(&*self.surface, anchor, self.surface.cursor(), kind, to_line_end))
    }

    fn move_cursor(&mut self, motion: &Motion, count: Option<usize>) -> Result<Transition> {
        let from = self.surface.cursor();
        let result = motion::evaluate(&*self.surface, motion, count, &self.motion_context(false))?;
        self.after_motion(motion, &result, from);
        let target = self.surface.clamp_normal(result.position);
        self.surface.set_cursor(target);
        Ok(Transition::Stay)
    }

    /// Jump mark, `;` memory and the remembered column.
    fn after_motion(&mut self, motion: &Motion, result: &MotionResult, from: usize) {
        if motion.is_jump() {
            self.state.marks.set_internal(PREVIOUS_CONTEXT, from);
        }
        if let Some(find) = motion.find_record() {
            self.state.last_find = Some(find);
        }
        self.state.curswant = if result.to_line_end {
            Some(usize::MAX)
        } else if motion.keeps_column() {
            Some(self.state.curswant.unwrap_or_else(|| self.surface.column_of(from)))
        } else {
            None
        };
    }

    fn region(&mut self, op: &ResolvedOperation, operator: Operator, target: &Target) -> Result<Region> {
        let s = &*self.surface;
        let cursor = s.cursor();
        match target {
            Target::Line => {
                if let Some((anchor, _)) = self.visual {
                    let (start, end) = ordered(anchor, cursor);
                    return Ok(Region::Lines {
                        first: s.line_of(start),
                        last: s.line_of(end),
                    });
                }
                let first = s.line_of(cursor);
                let last = (first + op.count1() - 1).min(s.last_line());
                Ok(Region::Lines { first, last })
            }
            Target::Visual => self.visual_region(),
            Target::TextObject(obj, scope) => {
                let selection = obj.select(s, cursor, op.count1(), *scope)?;
                let range = selection.range;
                Ok(if selection.linewise {
                    Region::Lines {
                        first: s.line_of(range.start),
                        last: s.line_of(range.end.saturating_sub(1).max(range.start)),
                    }
                } else {
                    Region::Chars(range)
                })
            }
            Target::Motion(motion) => self.motion_region(op, operator, motion),
        }
    }

    fn motion_region(&mut self, op: &ResolvedOperation, operator: Operator, motion: &Motion) -> Result<Region> {
        let cursor = self.surface.cursor();
        if let (Operator::Change, Motion::WordForward { big }) = (operator, motion) {
            // cw on a non-blank is ce
            if self.surface.char_at(cursor).is_some_and(|c| !c.is_whitespace()) {
                let end = text_object::end_word(&*self.surface, cursor, op.count1(), *big, true);
                return Ok(Region::Chars(TextRange::new(cursor, inclusive_end(&*self.surface, end))));
            }
        }

        let result = motion::evaluate(&*self.surface, motion, op.count, &self.motion_context(true))?;
        self.after_motion(motion, &result, cursor);
        let s = &*self.surface;
        let (start, end) = ordered(cursor, result.position);
        Ok(match result.kind {
            MotionKind::Linewise => Region::Lines {
                first: s.line_of(start),
                last: s.line_of(end),
            },
            MotionKind::Inclusive => Region::Chars(TextRange::new(start, inclusive_end(s, end))),
            MotionKind::Exclusive => exclusive_region(s, start, end),
        })
    }

    fn visual_region(&self) -> Result<Region> {
        let (anchor, kind) = self
            .visual
            .ok_or_else(|| EngineError::InvalidRange("no visual selection".to_string()))?;
        let s = &*self.surface;
        let cursor = s.cursor();
        let (start, end) = ordered(anchor, cursor);
        Ok(match kind {
            VisualKind::Char => {
                let end = if s.char_at(end).is_some() { end + 1 } else { end };
                Region::Chars(TextRange::new(start, end))
            }
            VisualKind::Line => Region::Lines {
                first: s.line_of(start),
                last: s.line_of(end),
            },
            VisualKind::Block => {
                let (a, b) = ordered(s.column_of(anchor), s.column_of(cursor));
                let right = if self.state.curswant == Some(usize::MAX) {
                    usize::MAX
                } else {
                    b + 1
                };
                Region::Block {
                    first: s.line_of(start),
                    last: s.line_of(end),
                    left: a,
                    right,
                }
            }
        })
    }

    fn run_operator(&mut self, op: &ResolvedOperation, operator: Operator, target: &Target) -> Result<Transition> {
        let selection = self.selection_extent();
        let region = self.region(op, operator, target)?;
        let shift_count = if *target == Target::Visual { op.count1() } else { 1 };
        let span = region.span(&*self.surface);

        // A change leaves the group open for the insert session.
        self.surface.begin_undo_group();
        let applied = {
            let mut ed = EditContext::new(&mut *self.surface, &mut self.state.marks);
            operator::apply(
                operator,
                &mut ed,
                &region,
                &mut *self.registers,
                op.register,
                &*self.options,
                shift_count,
            )
            .map(|result| (result, ed.inserted, ed.changed()))
        };
        let (result, inserted, changed) = match applied {
            Ok(applied) => applied,
            Err(e) => {
                self.surface.end_undo_group();
                return Err(e);
            }
        };

        let len = self.surface.len_chars();
        self.state.marks.set_internal(CHANGE_START, span.start.min(len));
        let change_end = if operator.changes_text() {
            span.start + inserted.saturating_sub(1)
        } else {
            span.end.saturating_sub(1).max(span.start)
        };
        self.state.marks.set_internal(CHANGE_END, change_end.min(len));
        if changed {
            self.state.modified = true;
            self.state.marks.set_internal(LAST_CHANGE, result.cursor.min(len));
        }
        self.surface.set_cursor(result.cursor);
        self.state.curswant = None;
        self.report_lines(operator, &region, shift_count);

        if result.enter_insert {
            let record = op.is_repeatable().then(|| op.clone());
            let mut session = InsertSession::new(InsertAt::Before, 1, result.cursor, record);
            session.selection = selection;
            if let Some(block) = result.block_insert {
                session = session.with_block(block, false);
            }
            return Ok(Transition::Insert(session));
        }
        self.surface.end_undo_group();
        if op.is_repeatable() {
            self.state.last_change = Some(ChangeRecord {
                operation: op.clone(),
                inserted: None,
                selection,
            });
        }
        Ok(if self.visual.is_some() {
            Transition::Normal
        } else {
            Transition::Stay
        })
    }

    /// Line counts worth telling the user about.
    fn report_lines(&mut self, operator: Operator, region: &Region, shift_count: usize) {
        let Region::Lines { first, last } = *region else {
            return;
        };
        let lines = last - first + 1;
        if lines <= 2 {
            return;
        }
        let message = match operator {
            Operator::Delete => format!("{} fewer lines", lines),
            Operator::Yank => format!("{} lines yanked", lines),
            Operator::ShiftRight | Operator::ShiftLeft => {
                let direction = if operator == Operator::ShiftRight { '>' } else { '<' };
                let times = if shift_count == 1 { "time" } else { "times" };
                format!("{} lines {}ed {} {}", lines, direction, shift_count, times)
            }
            _ => return,
        };
        self.status(&message);
    }

    fn run_action(&mut self, op: &ResolvedOperation, action: &Action) -> Result<Transition> {
        let count = op.count1();
        match action {
            Action::Put { after } => self.put(op, *after),
            Action::Undo => self.undo(count),
            Action::Redo => self.redo(count),
            Action::RepeatChange => self.repeat_last_change(op.count),
            Action::ToggleCaseChar => self.toggle_case_chars(op),
            Action::Join { spaces } => self.join(op, *spaces),
            Action::ReplaceChar(c) => self.replace_chars(op, *c),
            Action::Insert(at) => {
                let session = self.start_insert(*at, count, Some(op.clone()))?;
                Ok(Transition::Insert(session))
            }
            Action::EnterVisual(kind) => Ok(self.toggle_visual(*kind)),
            Action::SwapVisualEnds => {
                let Some((anchor, kind)) = self.visual else {
                    return Ok(Transition::Stay);
                };
                let cursor = self.surface.cursor();
                self.surface.set_cursor(anchor);
                Ok(Transition::Visual { anchor: cursor, kind })
            }
            Action::VisualInsert { append } => self.visual_insert(*append),
            Action::SelectObject(obj, scope) => self.select_object(*obj, *scope, count),
            Action::SetMark(name) => {
                let cursor = self.surface.cursor();
                self.state.marks.set(*name, cursor)?;
                Ok(Transition::Stay)
            }
            Action::StartRecording(name) => {
                if !(name.is_ascii_alphanumeric() || *name == '"') {
                    return Err(EngineError::InvalidRegister(*name));
                }
                self.state.recording = Some(Recording {
                    register: *name,
                    keys: Vec::new(),
                });
                self.status(&format!("recording @{}", name));
                Ok(Transition::Stay)
            }
            Action::StopRecording => {
                if let Some(recording) = self.state.recording.take() {
                    let mut keys = recording.keys;
                    // the q that stopped it
                    keys.pop();
                    let text = format_keys(&keys);
                    debug!(register = %recording.register, keys = %text, "recorded macro");
                    self.registers.set(recording.register, &text, RegisterKind::Character)?;
                }
                Ok(Transition::Stay)
            }
            Action::PlayMacro(name) => self.play_macro(*name, count),
            Action::WriteQuit => {
                self.state.requests.push(HostRequest::WriteQuit {
                    file: None,
                    force: false,
                    if_modified: true,
                });
                Ok(Transition::Stay)
            }
            Action::Quit => {
                self.state.requests.push(HostRequest::Quit { force: true });
                Ok(Transition::Stay)
            }
            Action::ShowPosition => {
                let s = &*self.surface;
                let cursor = s.cursor();
                let line = s.line_of(cursor) + 1;
                let total = s.line_count();
                let message = format!(
                    "{}line {} of {} --{}%-- col {}",
                    if self.state.modified { "[Modified] " } else { "" },
                    line,
                    total,
                    line * 100 / total.max(1),
                    s.column_of(cursor) + 1
                );
                self.status(&message);
                Ok(Transition::Stay)
            }
        }
    }

    fn finish_change(&mut self, op: &ResolvedOperation, cursor: usize, selection: Option<SelectionExtent>) -> Transition {
        self.surface.set_cursor(self.surface.clamp_normal(cursor));
        self.state.curswant = None;
        self.state.modified = true;
        let len = self.surface.len_chars();
        self.state.marks.set_internal(LAST_CHANGE, cursor.min(len));
        if op.is_repeatable() {
            self.state.last_change = Some(ChangeRecord {
                operation: op.clone(),
                inserted: None,
                selection,
            });
        }
        if self.visual.is_some() {
            Transition::Normal
        } else {
            Transition::Stay
        }
    }

    fn put(&mut self, op: &ResolvedOperation, after: bool) -> Result<Transition> {
        let entry = self.registers.require(op.register.unwrap_or('"'))?.clone();
        let count = op.count1();
        let selection = self.selection_extent();
        let cursor = self.grouped(|ex| match ex.visual {
            None => operator::put(&mut ex.edit(), &entry, after, count),
            Some(_) => ex.put_over_selection(&entry, count),
        })?;
        Ok(self.finish_change(op, cursor, selection))
    }

    /// `p` in visual mode: the selection is replaced and goes to the
    /// unnamed register.
    fn put_over_selection(&mut self, entry: &RegisterEntry, count: usize) -> Result<usize> {
        let region = self.visual_region()?;
        let (old, kind) = region.text(&*self.surface);
        let content = entry.content.repeat(count);
        let cursor = match region {
            Region::Chars(range) => {
                let mut ed = self.edit();
                if entry.is_linewise() {
                    ed.replace(range, &format!("\n{}", content))?;
                    ed.surface.first_non_blank(ed.surface.line_of(range.start) + 1)
                } else {
                    let end = ed.replace(range, &content)?;
                    end.saturating_sub(1).max(range.start)
                }
            }
            Region::Lines { first, last } => {
                let mut ed = self.edit();
                let range = TextRange::new(ed.surface.line_start(first), ed.surface.line_end(last));
                let body = content.strip_suffix('\n').unwrap_or(&content);
                ed.replace(range, body)?;
                ed.surface.first_non_blank(first)
            }
            Region::Block { .. } => {
                let mut ed = EditContext::new(&mut *self.surface, &mut self.state.marks);
                let deleted = operator::apply(
                    Operator::Delete,
                    &mut ed,
                    &region,
                    &mut *self.registers,
                    Some('_'),
                    &*self.options,
                    1,
                )?;
                ed.surface.set_cursor(deleted.cursor);
                operator::put(&mut ed, entry, false, count)?
            }
        };
        self.registers.record_delete(None, &old, kind)?;
        Ok(cursor)
    }

    pub(crate) fn undo(&mut self, count: usize) -> Result<Transition> {
        let mut restored = None;
        for _ in 0..count {
            match self.surface.undo() {
                Some(cursor) => restored = Some(cursor),
                None => break,
            }
        }
        let cursor = restored.ok_or(EngineError::NothingToUndo)?;
        self.surface.set_cursor(self.surface.clamp_normal(cursor));
        self.state.curswant = None;
        self.state.modified = true;
        Ok(Transition::Stay)
    }

    pub(crate) fn redo(&mut self, count: usize) -> Result<Transition> {
        let mut restored = None;
        for _ in 0..count {
            match self.surface.redo() {
                Some(cursor) => restored = Some(cursor),
                None => break,
            }
        }
        let cursor = restored.ok_or(EngineError::NothingToRedo)?;
        self.surface.set_cursor(self.surface.clamp_normal(cursor));
        self.state.curswant = None;
        self.state.modified = true;
        Ok(Transition::Stay)
    }

    fn toggle_case_chars(&mut self, op: &ResolvedOperation) -> Result<Transition> {
        let cursor = self.surface.cursor();
        let line_end = self.surface.line_end(self.surface.line_of(cursor));
        if cursor >= line_end {
            return Err(EngineError::MotionOutOfBounds);
        }
        let range = TextRange::new(cursor, (cursor + op.count1()).min(line_end));
        self.grouped(|ex| operator::change_case(&mut ex.edit(), &Region::Chars(range), Operator::ToggleCase))?;
        Ok(self.finish_change(op, range.end, None))
    }

    fn join(&mut self, op: &ResolvedOperation, spaces: bool) -> Result<Transition> {
        let selection = self.selection_extent();
        let s = &*self.surface;
        let cursor = s.cursor();
        let (first, lines) = match self.visual {
            Some((anchor, _)) => {
                let (start, end) = ordered(anchor, cursor);
                (s.line_of(start), s.line_of(end) - s.line_of(start) + 1)
            }
            None => (s.line_of(cursor), op.count1()),
        };
        let cursor = self.grouped(|ex| operator::join_lines(&mut ex.edit(), first, lines.max(2), spaces))?;
        Ok(self.finish_change(op, cursor, selection))
    }

    fn replace_chars(&mut self, op: &ResolvedOperation, c: char) -> Result<Transition> {
        let line_break = c == '\r' || c == '\n';
        if self.visual.is_some() {
            let selection = self.selection_extent();
            let region = self.visual_region()?;
            let ranges: Vec<TextRange> = match region {
                Region::Chars(range) => vec![range],
                Region::Lines { .. } => vec![region.span(&*self.surface)],
                Region::Block {
                    first,
                    last,
                    left,
                    right,
                } => (first..=last)
                    .map(|line| {
                        let s = &*self.surface;
                        TextRange::new(s.offset_at(line, left), s.offset_at(line, right))
                    })
                    .collect(),
            };
            let start = ranges.first().map_or(self.surface.cursor(), |r| r.start);
            self.grouped(|ex| {
                for range in ranges.into_iter().rev() {
                    let text: String = ex
                        .surface
                        .slice(range)
                        .chars()
                        .map(|old| if old == '\n' || line_break { old } else { c })
                        .collect();
                    ex.edit().replace(range, &text)?;
                }
                Ok(())
            })?;
            return Ok(self.finish_change(op, start, selection));
        }

        let cursor = self.surface.cursor();
        let line_end = self.surface.line_end(self.surface.line_of(cursor));
        let count = op.count1();
        if cursor + count > line_end {
            return Err(EngineError::MotionOutOfBounds);
        }
        let range = TextRange::new(cursor, cursor + count);
        let cursor = if line_break {
            self.grouped(|ex| ex.edit().replace(range, "\n"))?
        } else {
            let text: String = std::iter::repeat(c).take(count).collect();
            self.grouped(|ex| ex.edit().replace(range, &text))? - 1
        };
        Ok(self.finish_change(op, cursor, None))
    }

    fn toggle_visual(&mut self, kind: VisualKind) -> Transition {
        match self.visual {
            None => Transition::Visual {
                anchor: self.surface.cursor(),
                kind,
            },
            Some((_, current)) if current == kind => Transition::Normal,
            Some((anchor, _)) => Transition::Visual { anchor, kind },
        }
    }

    /// `I` and `A` on a selection.
    fn visual_insert(&mut self, append: bool) -> Result<Transition> {
        let Some((anchor, kind)) = self.visual else {
            return Ok(Transition::Stay);
        };
        let cursor = self.surface.cursor();
        let (start, end) = ordered(anchor, cursor);
        let s = &*self.surface;
        let session = match kind {
            VisualKind::Char => {
                let pos = if append {
                    (end + 1).min(s.line_end(s.line_of(end)))
                } else {
                    start
                };
                self.surface.set_cursor(pos);
                self.start_insert(InsertAt::Before, 1, None)?
            }
            VisualKind::Line => {
                if append {
                    let pos = s.line_end(s.line_of(end));
                    self.surface.set_cursor(pos);
                    self.start_insert(InsertAt::Before, 1, None)?
                } else {
                    self.surface.set_cursor(start);
                    self.start_insert(InsertAt::FirstNonBlank, 1, None)?
                }
            }
            VisualKind::Block => {
                let (first, last) = (s.line_of(start), s.line_of(end));
                let (left, right) = ordered(s.column_of(anchor), s.column_of(cursor));
                let column = match (append, self.state.curswant) {
                    (false, _) => left,
                    (true, Some(usize::MAX)) => usize::MAX,
                    (true, _) => right + 1,
                };
                let first_start = s.line_start(first);
                self.surface.set_cursor(first_start);
                let mut session = self.start_insert(InsertAt::Before, 1, None)?;
                let range = self.surface.line_range(first);
                let pos = if column == usize::MAX {
                    range.end
                } else if range.len() < column {
                    if !append {
                        self.surface.end_undo_group();
                        return Ok(Transition::Normal);
                    }
                    self.edit().insert(range.end, &" ".repeat(column - range.len()))?
                } else {
                    range.start + column
                };
                self.surface.set_cursor(pos);
                session.start = pos;
                session.with_block(BlockInsert { first, last, column }, append)
            }
        };
        Ok(Transition::Insert(session))
    }

    /// `iw`, `a(` and friends in visual mode.
    fn select_object(&mut self, obj: TextObject, scope: Scope, count: usize) -> Result<Transition> {
        let cursor = self.surface.cursor();
        let (anchor, kind) = self.visual.unwrap_or((cursor, VisualKind::Char));
        let selection = obj.select(&*self.surface, cursor, count, scope)?;
        let start = selection.range.start;
        let last = selection.range.end.saturating_sub(1).max(start);
        let kind = if selection.linewise && kind == VisualKind::Char {
            VisualKind::Line
        } else {
            kind
        };
        let anchor = if anchor != cursor { anchor.min(start) } else { start };
        self.surface.set_cursor(last);
        Ok(Transition::Visual { anchor, kind })
    }

    fn play_macro(&mut self, name: char, count: usize) -> Result<Transition> {
        let name = if name == '@' {
            self.state.last_macro.ok_or(EngineError::EmptyRegister('@'))?
        } else {
            name
        };
        if name == ':' {
            let line = self.registers.require(':')?.content.clone();
            self.state.last_macro = Some(':');
            for _ in 0..count {
                self.run_ex(&line)?;
            }
            return Ok(Transition::Stay);
        }
        let content = self.registers.require(name)?.content.clone();
        self.state.last_macro = Some(name);
        Ok(Transition::Play {
            keys: parse_keys(&content),
            count,
        })
    }

    fn run_command_line(&mut self, prefix: char, text: &str) -> Result<Transition> {
        match prefix {
            ':' => {
                if !text.trim().is_empty() {
                    self.registers.set_read_only(':', text);
                }
                self.run_ex(text)
            }
            '/' | '?' => {
                let direction = if prefix == '/' {
                    SearchDirection::Forward
                } else {
                    SearchDirection::Backward
                };
                let pattern = self.state.search.set(strip_delimiter(text, prefix), direction)?;
                self.registers.set_read_only('/', &pattern);
                self.move_cursor(&Motion::Search { pattern, direction }, None)
            }
            _ => Err(EngineError::InvalidCommandLine(format!("{}{}", prefix, text))),
        }
    }
}

/// Pattern of a `/` or `?` line: everything before an unescaped closing
/// delimiter.
fn strip_delimiter(text: &str, delimiter: char) -> &str {
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == delimiter {
            return &text[..i];
        }
    }
    text
}
