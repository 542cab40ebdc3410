//! Motion commands for cursor movement.
//!
//! A motion is evaluated against the surface without changing it; the
//! executor decides whether the result moves the cursor, extends a visual
//! selection or bounds an operator.

use super::text_object::{
    bck_word, bckend_word, end_word, fwd_word, is_word_char, match_backward, match_forward,
    sentence_starts,
};
use crate::error::{EngineError, Result};
use crate::marks::Marks;
use crate::options::Options;
use crate::search::{self, SearchDirection, SearchState};
use crate::surface::{SurfaceExt, TextRange, TextSurface};

/// How an operator treats the text between cursor and motion target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionKind {
    /// The target character is not included.
    Exclusive,
    /// The target character is included.
    Inclusive,
    /// Whole lines from the cursor line to the target line.
    Linewise,
}

/// `f`, `F`, `t` and `T`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindKind {
    Forward,
    Backward,
    TillForward,
    TillBackward,
}

impl FindKind {
    pub fn from_key(c: char) -> Option<Self> {
        match c {
            'f' => Some(FindKind::Forward),
            'F' => Some(FindKind::Backward),
            't' => Some(FindKind::TillForward),
            'T' => Some(FindKind::TillBackward),
            _ => None,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            FindKind::Forward => FindKind::Backward,
            FindKind::Backward => FindKind::Forward,
            FindKind::TillForward => FindKind::TillBackward,
            FindKind::TillBackward => FindKind::TillForward,
        }
    }

    fn forward(self) -> bool {
        matches!(self, FindKind::Forward | FindKind::TillForward)
    }

    fn till(self) -> bool {
        matches!(self, FindKind::TillForward | FindKind::TillBackward)
    }
}

/// Every motion the grammar can produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    /// `0`
    LineStart,
    /// `^`
    FirstNonBlank,
    /// `$`
    LineEnd,
    /// `g_`
    LastNonBlank,
    /// `|`
    Column,
    /// `+` and Enter
    NextLine,
    /// `-`
    PrevLine,
    /// `_`
    CurrentLine,
    WordForward { big: bool },
    WordBackward { big: bool },
    WordEnd { big: bool },
    WordEndBackward { big: bool },
    /// `G`
    GotoLine,
    /// `gg`
    FirstLine,
    Find { kind: FindKind, ch: char },
    /// `;` and `,`
    RepeatFind { reverse: bool },
    /// `%`
    MatchPair,
    SentenceForward,
    SentenceBackward,
    ParagraphForward,
    ParagraphBackward,
    /// `n` and `N`
    SearchNext { reverse: bool },
    /// `*` and `#`
    SearchWord { direction: SearchDirection },
    /// `/pattern` and `?pattern`
    Search { pattern: String, direction: SearchDirection },
    /// `` `x `` and `'x`
    Mark { name: char, linewise: bool },
}

impl Motion {
    /// Kind before any operator adjustment.
    pub fn kind(&self) -> MotionKind {
        match self {
            Motion::Up
            | Motion::Down
            | Motion::NextLine
            | Motion::PrevLine
            | Motion::CurrentLine
            | Motion::GotoLine
            | Motion::FirstLine
            | Motion::Mark { linewise: true, .. } => MotionKind::Linewise,
            Motion::LineEnd
            | Motion::LastNonBlank
            | Motion::WordEnd { .. }
            | Motion::WordEndBackward { .. }
            | Motion::MatchPair => MotionKind::Inclusive,
            Motion::Find { kind, .. } if kind.forward() => MotionKind::Inclusive,
            _ => MotionKind::Exclusive,
        }
    }

    /// Vertical motions keep the remembered column.
    pub fn keeps_column(&self) -> bool {
        matches!(self, Motion::Up | Motion::Down)
    }

    /// Motions that set the previous-context mark.
    pub fn is_jump(&self) -> bool {
        matches!(
            self,
            Motion::GotoLine
                | Motion::FirstLine
                | Motion::MatchPair
                | Motion::SentenceForward
                | Motion::SentenceBackward
                | Motion::ParagraphForward
                | Motion::ParagraphBackward
                | Motion::SearchNext { .. }
                | Motion::SearchWord { .. }
                | Motion::Search { .. }
                | Motion::Mark { .. }
        )
    }

    /// Motions repeated by `;`/`,` record themselves.
    pub fn find_record(&self) -> Option<(FindKind, char)> {
        match self {
            Motion::Find { kind, ch } => Some((*kind, *ch)),
            _ => None,
        }
    }
}

/// Result of a motion command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionResult {
    /// Target offset.
    pub position: usize,
    /// Kind after count-dependent adjustments.
    pub kind: MotionKind,
    /// `$` sticks to the end of the line on later vertical moves.
    pub to_line_end: bool,
}

impl MotionResult {
    fn new(position: usize, kind: MotionKind) -> Self {
        Self {
            position,
            kind,
            to_line_end: false,
        }
    }

    fn sticky_end(mut self) -> Self {
        self.to_line_end = true;
        self
    }
}

/// State a motion may read besides the surface.
pub struct MotionContext<'a> {
    /// Remembered column for vertical motions; `usize::MAX` after `$`.
    pub preferred_column: Option<usize>,
    /// Last `f`/`F`/`t`/`T`.
    pub last_find: Option<(FindKind, char)>,
    pub search: &'a SearchState,
    pub options: &'a Options,
    pub marks: &'a Marks,
    /// An operator is waiting for this motion.
    pub operator_pending: bool,
}

/// Evaluate `motion` from the surface cursor.
///
/// Fails with [`EngineError::MotionOutOfBounds`] when the motion cannot move
/// at all; partial moves are clamped.
pub fn evaluate(
    s: &dyn TextSurface,
    motion: &Motion,
    count: Option<usize>,
    ctx: &MotionContext,
) -> Result<MotionResult> {
    let cursor = s.cursor().min(s.len_chars());
    let n = count.unwrap_or(1).max(1);
    let line = s.line_of(cursor);
    let last = s.last_line();
    let kind = motion.kind();

    let result = match motion {
        Motion::Left => {
            let col = s.column_of(cursor);
            if col == 0 {
                return Err(EngineError::MotionOutOfBounds);
            }
            MotionResult::new(cursor - n.min(col), kind)
        }
        Motion::Right => {
            let limit = if ctx.operator_pending {
                s.line_end(line)
            } else {
                s.last_char_of(line)
            };
            let target = (cursor + n).min(limit);
            if target <= cursor {
                return Err(EngineError::MotionOutOfBounds);
            }
            MotionResult::new(target, kind)
        }
        Motion::Up | Motion::Down => {
            let target = if *motion == Motion::Up {
                if line == 0 {
                    return Err(EngineError::MotionOutOfBounds);
                }
                line.saturating_sub(n)
            } else {
                if line >= last {
                    return Err(EngineError::MotionOutOfBounds);
                }
                (line + n).min(last)
            };
            let column = ctx.preferred_column.unwrap_or_else(|| s.column_of(cursor));
            let offset = s.offset_at(target, column).min(s.last_char_of(target));
            MotionResult::new(offset, kind)
        }
        Motion::LineStart => MotionResult::new(s.line_start(line), kind),
        Motion::FirstNonBlank => MotionResult::new(s.first_non_blank(line), kind),
        Motion::LineEnd => {
            let target = (line + n - 1).min(last);
            let offset = if ctx.operator_pending {
                s.line_end(target).saturating_sub(1).max(s.line_start(target))
            } else {
                s.last_char_of(target)
            };
            MotionResult::new(offset, kind).sticky_end()
        }
        Motion::LastNonBlank => {
            let target = (line + n - 1).min(last);
            let range = s.line_range(target);
            let mut offset = s.last_char_of(target);
            while offset > range.start && s.char_at(offset).is_some_and(|c| c == ' ' || c == '\t') {
                offset -= 1;
            }
            MotionResult::new(offset, kind)
        }
        Motion::Column => {
            let offset = s.offset_at(line, n - 1).min(s.last_char_of(line));
            MotionResult::new(offset, kind)
        }
        Motion::NextLine => {
            if line >= last {
                return Err(EngineError::MotionOutOfBounds);
            }
            MotionResult::new(s.first_non_blank((line + n).min(last)), kind)
        }
        Motion::PrevLine => {
            if line == 0 {
                return Err(EngineError::MotionOutOfBounds);
            }
            MotionResult::new(s.first_non_blank(line.saturating_sub(n)), kind)
        }
        Motion::CurrentLine => MotionResult::new(s.first_non_blank((line + n - 1).min(last)), kind),
        Motion::WordForward { big } => {
            let target = fwd_word(s, cursor, n, *big, ctx.operator_pending);
            let target = if ctx.operator_pending {
                target
            } else {
                s.clamp_normal(target)
            };
            moved(cursor, target, kind)?
        }
        Motion::WordBackward { big } => moved(cursor, bck_word(s, cursor, n, *big), kind)?,
        Motion::WordEnd { big } => {
            let target = s.clamp_normal(end_word(s, cursor, n, *big, false));
            moved(cursor, target, kind)?
        }
        Motion::WordEndBackward { big } => {
            let target = s.clamp_normal(bckend_word(s, cursor, n, *big));
            moved(cursor, target, kind)?
        }
        Motion::GotoLine => {
            let target = count.map(|c| c.saturating_sub(1)).unwrap_or(last).min(last);
            MotionResult::new(s.first_non_blank(target), kind)
        }
        Motion::FirstLine => {
            let target = count.map(|c| c.saturating_sub(1)).unwrap_or(0).min(last);
            MotionResult::new(s.first_non_blank(target), kind)
        }
        Motion::Find { kind: find, ch } => {
            MotionResult::new(find_char(s, cursor, *find, *ch, n, false)?, kind)
        }
        Motion::RepeatFind { reverse } => {
            let (find, ch) = ctx.last_find.ok_or(EngineError::MotionOutOfBounds)?;
            let find = if *reverse { find.reversed() } else { find };
            let kind = Motion::Find { kind: find, ch }.kind();
            MotionResult::new(find_char(s, cursor, find, ch, n, true)?, kind)
        }
        Motion::MatchPair => match count {
            Some(percent) => {
                if percent > 100 {
                    return Err(EngineError::MotionOutOfBounds);
                }
                let total = s.line_count();
                let target = ((percent * total + 99) / 100).saturating_sub(1).min(last);
                MotionResult::new(s.first_non_blank(target), MotionKind::Linewise)
            }
            None => MotionResult::new(match_pair(s, cursor)?, kind),
        },
        Motion::SentenceForward => {
            let starts = sentence_starts(s);
            let mut pos = cursor;
            for _ in 0..n {
                pos = starts
                    .iter()
                    .copied()
                    .find(|&st| st > pos)
                    .unwrap_or(s.len_chars());
            }
            let pos = if ctx.operator_pending {
                pos
            } else {
                s.clamp_normal(pos)
            };
            moved(cursor, pos, kind)?
        }
        Motion::SentenceBackward => {
            let starts = sentence_starts(s);
            let mut pos = cursor;
            for _ in 0..n {
                pos = starts.iter().copied().rev().find(|&st| st < pos).unwrap_or(0);
            }
            moved(cursor, pos, kind)?
        }
        Motion::ParagraphForward => {
            let pos = paragraph_forward(s, line, n);
            let pos = if ctx.operator_pending {
                pos
            } else {
                s.clamp_normal(pos)
            };
            moved(cursor, pos, kind)?
        }
        Motion::ParagraphBackward => moved(cursor, paragraph_backward(s, line, n), kind)?,
        Motion::SearchNext { reverse } => {
            let pattern = ctx.search.pattern()?;
            let direction = if *reverse {
                ctx.search.direction.opposite()
            } else {
                ctx.search.direction
            };
            MotionResult::new(search_from(s, cursor, pattern, direction, n, ctx.options)?, kind)
        }
        Motion::SearchWord { direction } => {
            let pattern = word_pattern(s, cursor)?;
            let start = word_bounds(s, cursor)?.0;
            MotionResult::new(search_from(s, start, &pattern, *direction, n, ctx.options)?, kind)
        }
        Motion::Search { pattern, direction } => {
            MotionResult::new(search_from(s, cursor, pattern, *direction, n, ctx.options)?, kind)
        }
        Motion::Mark { name, linewise } => {
            let offset = ctx.marks.get(*name)?.min(s.len_chars());
            if *linewise {
                MotionResult::new(s.first_non_blank(s.line_of(offset)), kind)
            } else {
                MotionResult::new(offset, kind)
            }
        }
    };

    Ok(result)
}

fn moved(from: usize, to: usize, kind: MotionKind) -> Result<MotionResult> {
    if from == to {
        return Err(EngineError::MotionOutOfBounds);
    }
    Ok(MotionResult::new(to, kind))
}

/// Target of `f`/`F`/`t`/`T` on the cursor line.
///
/// `repeat` makes a till search skip a match right next to the cursor, so
/// `;` after `t` does not stay in place.
fn find_char(
    s: &dyn TextSurface,
    cursor: usize,
    kind: FindKind,
    ch: char,
    count: usize,
    repeat: bool,
) -> Result<usize> {
    let range = s.line_range(s.line_of(cursor));
    let mut pos = cursor;
    let skip_adjacent = repeat && kind.till();

    for i in 0..count {
        loop {
            if kind.forward() {
                if pos + 1 >= range.end {
                    return Err(EngineError::MotionOutOfBounds);
                }
                pos += 1;
            } else {
                if pos <= range.start {
                    return Err(EngineError::MotionOutOfBounds);
                }
                pos -= 1;
            }
            let adjacent = i == 0 && pos.abs_diff(cursor) == 1;
            if s.char_at(pos) == Some(ch) && !(skip_adjacent && adjacent) {
                break;
            }
        }
    }

    Ok(match kind {
        FindKind::Forward | FindKind::Backward => pos,
        FindKind::TillForward => pos - 1,
        FindKind::TillBackward => pos + 1,
    })
}

/// `%` without a count: the partner of the first bracket at or after the
/// cursor on its line.
fn match_pair(s: &dyn TextSurface, cursor: usize) -> Result<usize> {
    let range = s.line_range(s.line_of(cursor));
    let not_found = || EngineError::InvalidTextObjectAtCursor("matching bracket".to_string());

    let (pos, c) = (cursor..range.end)
        .filter_map(|p| s.char_at(p).map(|c| (p, c)))
        .find(|(_, c)| matches!(c, '(' | ')' | '[' | ']' | '{' | '}'))
        .ok_or_else(not_found)?;

    let target = match c {
        '(' => match_forward(s, pos, '(', ')'),
        '[' => match_forward(s, pos, '[', ']'),
        '{' => match_forward(s, pos, '{', '}'),
        ')' => match_backward(s, pos, '(', ')'),
        ']' => match_backward(s, pos, '[', ']'),
        _ => match_backward(s, pos, '{', '}'),
    };
    target.ok_or_else(not_found)
}

fn paragraph_forward(s: &dyn TextSurface, mut line: usize, count: usize) -> usize {
    let last = s.last_line();
    for _ in 0..count {
        while line <= last && s.line_is_empty(line) {
            line += 1;
        }
        while line <= last && !s.line_is_empty(line) {
            line += 1;
        }
        if line > last {
            return s.len_chars();
        }
    }
    s.line_start(line)
}

fn paragraph_backward(s: &dyn TextSurface, mut line: usize, count: usize) -> usize {
    for _ in 0..count {
        while line > 0 && s.line_is_empty(line) {
            line -= 1;
        }
        while line > 0 && !s.line_is_empty(line) {
            line -= 1;
        }
        if line == 0 {
            break;
        }
    }
    s.line_start(line)
}

fn search_from(
    s: &dyn TextSurface,
    from: usize,
    pattern: &str,
    direction: SearchDirection,
    count: usize,
    options: &Options,
) -> Result<usize> {
    let regex = search::compile(pattern, options)?;
    let text = s.slice(TextRange::new(0, s.len_chars()));
    let mut pos = from;
    for _ in 0..count {
        let (start, _) = search::find(&regex, &text, pos, direction, options.wrapscan)
            .ok_or_else(|| EngineError::PatternNotFound(pattern.to_string()))?;
        pos = start;
    }
    Ok(pos)
}

/// Keyword under or after the cursor on its line, as offsets.
fn word_bounds(s: &dyn TextSurface, cursor: usize) -> Result<(usize, usize)> {
    let range = s.line_range(s.line_of(cursor));
    let is_word = |p: usize| s.char_at(p).is_some_and(is_word_char);

    let mut start = (cursor..range.end)
        .find(|&p| is_word(p))
        .ok_or_else(|| EngineError::InvalidTextObjectAtCursor("identifier".to_string()))?;
    while start > range.start && is_word(start - 1) {
        start -= 1;
    }
    let mut end = start;
    while end < range.end && is_word(end) {
        end += 1;
    }
    Ok((start, end))
}

/// Whole-word pattern for `*` and `#`.
pub fn word_pattern(s: &dyn TextSurface, cursor: usize) -> Result<String> {
    let (start, end) = word_bounds(s, cursor)?;
    Ok(format!(r"\<{}\>", s.slice((start..end).into())))
}
