//! Operator commands (d, c, y, >, <, g~, gu, gU) and the other buffer
//! edits shared by normal and visual mode: put and join.
//!
//! Operators work on a [`Region`] computed from a motion, a text object, a
//! doubled operator or a visual selection.

use super::EditContext;
use crate::error::{EngineError, Result};
use crate::options::Options;
use crate::register::{RegisterEntry, RegisterKind, RegisterStore};
use crate::surface::{SurfaceExt, TextRange, TextSurface};

/// The operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Delete,
    Change,
    Yank,
    ShiftRight,
    ShiftLeft,
    ToggleCase,
    Lowercase,
    Uppercase,
}

impl Operator {
    /// Single-key operators.
    pub fn from_key(c: char) -> Option<Self> {
        match c {
            'd' => Some(Operator::Delete),
            'c' => Some(Operator::Change),
            'y' => Some(Operator::Yank),
            '>' => Some(Operator::ShiftRight),
            '<' => Some(Operator::ShiftLeft),
            _ => None,
        }
    }

    /// Operators typed after `g`.
    pub fn from_g_key(c: char) -> Option<Self> {
        match c {
            '~' => Some(Operator::ToggleCase),
            'u' => Some(Operator::Lowercase),
            'U' => Some(Operator::Uppercase),
            _ => None,
        }
    }

    /// Key that, typed again, applies the operator to whole lines.
    pub fn line_key(self) -> char {
        match self {
            Operator::Delete => 'd',
            Operator::Change => 'c',
            Operator::Yank => 'y',
            Operator::ShiftRight => '>',
            Operator::ShiftLeft => '<',
            Operator::ToggleCase => '~',
            Operator::Lowercase => 'u',
            Operator::Uppercase => 'U',
        }
    }

    /// Whether the operator was typed with a `g` prefix.
    pub fn is_g_operator(self) -> bool {
        matches!(self, Operator::ToggleCase | Operator::Lowercase | Operator::Uppercase)
    }

    pub fn changes_text(self) -> bool {
        self != Operator::Yank
    }

    pub fn name(self) -> &'static str {
        match self {
            Operator::Delete => "delete",
            Operator::Change => "change",
            Operator::Yank => "yank",
            Operator::ShiftRight => "shift right",
            Operator::ShiftLeft => "shift left",
            Operator::ToggleCase => "toggle case",
            Operator::Lowercase => "lowercase",
            Operator::Uppercase => "uppercase",
        }
    }
}

/// Text an operator acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Chars(TextRange),
    /// Lines `first..=last`.
    Lines { first: usize, last: usize },
    /// Columns `left..right` of lines `first..=last`; `right` may be
    /// `usize::MAX` for "to the end of each line".
    Block {
        first: usize,
        last: usize,
        left: usize,
        right: usize,
    },
}

impl Region {
    pub fn first_line(&self, s: &dyn TextSurface) -> usize {
        match *self {
            Region::Chars(range) => s.line_of(range.start),
            Region::Lines { first, .. } | Region::Block { first, .. } => first,
        }
    }

    pub fn last_line(&self, s: &dyn TextSurface) -> usize {
        match *self {
            Region::Chars(range) => s.line_of(range.end.saturating_sub(1).max(range.start)),
            Region::Lines { last, .. } | Region::Block { last, .. } => last,
        }
    }

    /// Offsets spanned by the region.
    pub fn span(&self, s: &dyn TextSurface) -> TextRange {
        match *self {
            Region::Chars(range) => range,
            Region::Lines { first, last } => TextRange::new(s.line_start(first), s.line_end(last)),
            Region::Block { first, last, .. } => {
                TextRange::new(s.line_start(first), s.line_end(last))
            }
        }
    }

    /// Region text and the register kind it is stored as.
    pub fn text(&self, s: &dyn TextSurface) -> (String, RegisterKind) {
        match *self {
            Region::Chars(range) => (s.slice(range), RegisterKind::Character),
            Region::Lines { first, last } => {
                let mut text = s.slice(TextRange::new(s.line_start(first), s.line_end(last)));
                text.push('\n');
                (text, RegisterKind::Line)
            }
            Region::Block { .. } => {
                let rows: Vec<String> = block_ranges(s, self).into_iter().map(|r| s.slice(r)).collect();
                (rows.join("\n"), RegisterKind::Block)
            }
        }
    }
}

/// Per-line ranges of a block region, top to bottom.
fn block_ranges(s: &dyn TextSurface, region: &Region) -> Vec<TextRange> {
    let Region::Block {
        first,
        last,
        left,
        right,
    } = *region
    else {
        return Vec::new();
    };
    (first..=last)
        .map(|line| {
            let r = s.line_range(line);
            let lo = r.start.saturating_add(left).min(r.end);
            let hi = r.start.saturating_add(right).min(r.end);
            TextRange::new(lo, hi.max(lo))
        })
        .collect()
}

/// Lines still to receive text typed into the first line of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInsert {
    pub first: usize,
    pub last: usize,
    pub column: usize,
}

/// Result of an operator execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorResult {
    /// New cursor position.
    pub cursor: usize,
    /// Whether to enter insert mode after.
    pub enter_insert: bool,
    pub block_insert: Option<BlockInsert>,
}

impl OperatorResult {
    pub fn cursor(cursor: usize) -> Self {
        Self {
            cursor,
            enter_insert: false,
            block_insert: None,
        }
    }

    fn with_insert(mut self) -> Self {
        self.enter_insert = true;
        self
    }
}

/// Run `op` over `region`.
pub fn apply(
    op: Operator,
    ed: &mut EditContext,
    region: &Region,
    registers: &mut RegisterStore,
    register: Option<char>,
    options: &Options,
    shift_count: usize,
) -> Result<OperatorResult> {
    match op {
        Operator::Yank => yank(ed.surface, region, registers, register),
        Operator::Delete => delete(ed, region, registers, register),
        Operator::Change => change(ed, region, registers, register),
        Operator::ShiftRight | Operator::ShiftLeft => {
            let (first, last) = (region.first_line(ed.surface), region.last_line(ed.surface));
            shift(ed, first, last, op == Operator::ShiftLeft, shift_count.max(1), options)
        }
        Operator::ToggleCase | Operator::Lowercase | Operator::Uppercase => {
            change_case(ed, region, op)
        }
    }
}

/// Yank operator (y).
fn yank(
    s: &dyn TextSurface,
    region: &Region,
    registers: &mut RegisterStore,
    register: Option<char>,
) -> Result<OperatorResult> {
    let (text, kind) = region.text(s);
    registers.record_yank(register, &text, kind)?;

    let cursor = match *region {
        Region::Chars(range) => range.start,
        Region::Lines { first, .. } => {
            if s.line_of(s.cursor()) == first {
                s.cursor()
            } else {
                s.clamp_normal(s.offset_at(first, s.column_of(s.cursor())))
            }
        }
        Region::Block { first, left, .. } => s.clamp_normal(s.offset_at(first, left)),
    };
    Ok(OperatorResult::cursor(cursor))
}

/// Delete operator (d).
fn delete(
    ed: &mut EditContext,
    region: &Region,
    registers: &mut RegisterStore,
    register: Option<char>,
) -> Result<OperatorResult> {
    let (text, kind) = region.text(ed.surface);
    if text.is_empty() {
        return Ok(OperatorResult::cursor(ed.surface.cursor()));
    }
    registers.record_delete(register, &text, kind)?;

    let cursor = match *region {
        Region::Chars(range) => {
            ed.delete(range)?;
            ed.surface.clamp_normal(range.start)
        }
        Region::Lines { first, last } => delete_lines(ed, first, last)?,
        Region::Block { first, left, .. } => {
            for range in block_ranges(ed.surface, region).into_iter().rev() {
                if !range.is_empty() {
                    ed.delete(range)?;
                }
            }
            ed.surface.clamp_normal(ed.surface.offset_at(first, left))
        }
    };
    Ok(OperatorResult::cursor(cursor))
}

/// Remove whole lines, taking the preceding newline when the last line of
/// the buffer goes.
pub(crate) fn delete_lines(ed: &mut EditContext, first: usize, last: usize) -> Result<usize> {
    let s = &*ed.surface;
    let range = if last < s.last_line() {
        TextRange::new(s.line_start(first), s.line_start(last + 1))
    } else if first > 0 {
        TextRange::new(s.line_end(first - 1), s.len_chars())
    } else {
        TextRange::new(0, s.len_chars())
    };
    ed.delete(range)?;
    let line = first.min(ed.surface.last_line());
    Ok(ed.surface.first_non_blank(line))
}

/// Change operator (c).
fn change(
    ed: &mut EditContext,
    region: &Region,
    registers: &mut RegisterStore,
    register: Option<char>,
) -> Result<OperatorResult> {
    let (text, kind) = region.text(ed.surface);
    if !text.is_empty() {
        registers.record_delete(register, &text, kind)?;
    }

    let result = match *region {
        Region::Chars(range) => {
            ed.delete(range)?;
            OperatorResult::cursor(range.start).with_insert()
        }
        Region::Lines { first, last } => {
            // one empty line is left to insert into
            let range = TextRange::new(ed.surface.line_start(first), ed.surface.line_end(last));
            ed.delete(range)?;
            OperatorResult::cursor(range.start).with_insert()
        }
        Region::Block {
            first, last, left, ..
        } => {
            for range in block_ranges(ed.surface, region).into_iter().rev() {
                if !range.is_empty() {
                    ed.delete(range)?;
                }
            }
            let cursor = ed.surface.offset_at(first, left);
            let column = ed.surface.column_of(cursor);
            let mut result = OperatorResult::cursor(cursor).with_insert();
            result.block_insert = Some(BlockInsert { first, last, column });
            result
        }
    };
    Ok(result)
}

/// Display width of leading white space and its length in characters.
fn indent_of(line: &str, tabstop: usize) -> (usize, usize) {
    let mut width = 0;
    let mut len = 0;
    for c in line.chars() {
        match c {
            ' ' => width += 1,
            '\t' => width += tabstop - width % tabstop,
            _ => break,
        }
        len += 1;
    }
    (width, len)
}

/// Indentation string of `width` columns.
pub fn make_indent(width: usize, options: &Options) -> String {
    if options.expandtab {
        " ".repeat(width)
    } else {
        let ts = options.tabstop.max(1);
        format!("{}{}", "\t".repeat(width / ts), " ".repeat(width % ts))
    }
}

/// Shift operators (> and <).
fn shift(
    ed: &mut EditContext,
    first: usize,
    last: usize,
    left: bool,
    amount: usize,
    options: &Options,
) -> Result<OperatorResult> {
    let sw = options.shift_width().max(1);
    for line in first..=last {
        let text = ed.surface.line_text(line);
        if text.is_empty() {
            continue;
        }
        let (width, len) = indent_of(&text, options.tabstop.max(1));
        let new_width = if options.shiftround {
            let mut steps = width / sw;
            if left {
                let amount = if width % sw != 0 { amount - 1 } else { amount };
                steps = steps.saturating_sub(amount);
            } else {
                steps += amount;
            }
            steps * sw
        } else if left {
            width.saturating_sub(sw * amount)
        } else {
            width + sw * amount
        };
        if new_width == width {
            continue;
        }
        let start = ed.surface.line_start(line);
        ed.replace(TextRange::new(start, start + len), &make_indent(new_width, options))?;
    }
    Ok(OperatorResult::cursor(ed.surface.first_non_blank(first)))
}

fn convert_case(text: &str, op: Operator) -> String {
    match op {
        Operator::Lowercase => text.to_lowercase(),
        Operator::Uppercase => text.to_uppercase(),
        _ => text
            .chars()
            .map(|c| {
                if c.is_lowercase() {
                    c.to_uppercase().collect::<String>()
                } else {
                    c.to_lowercase().collect::<String>()
                }
            })
            .collect(),
    }
}

/// Case operators (g~, gu, gU). Also used by `~` in normal mode.
pub fn change_case(ed: &mut EditContext, region: &Region, op: Operator) -> Result<OperatorResult> {
    let ranges = match *region {
        Region::Chars(range) => vec![range],
        Region::Lines { .. } => vec![region.span(ed.surface)],
        Region::Block { .. } => block_ranges(ed.surface, region),
    };
    for range in ranges.into_iter().rev() {
        let text = ed.surface.slice(range);
        let converted = convert_case(&text, op);
        if converted != text {
            ed.replace(range, &converted)?;
        }
    }

    let s = &*ed.surface;
    let cursor = match *region {
        Region::Chars(range) => s.clamp_normal(range.start),
        Region::Lines { first, .. } => {
            s.clamp_normal(s.offset_at(first, s.column_of(s.cursor())))
        }
        Region::Block { first, left, .. } => s.clamp_normal(s.offset_at(first, left)),
    };
    Ok(OperatorResult::cursor(cursor))
}

/// Put register content after (p) or before (P) the cursor, `count` times.
pub fn put(ed: &mut EditContext, entry: &RegisterEntry, after: bool, count: usize) -> Result<usize> {
    let count = count.max(1);
    let cursor = ed.surface.cursor();
    let line = ed.surface.line_of(cursor);

    match entry.kind {
        RegisterKind::Character => {
            let at = if after && !ed.surface.line_is_empty(line) {
                (cursor + 1).min(ed.surface.line_end(line))
            } else {
                cursor
            };
            let text = entry.content.repeat(count);
            let end = ed.insert(at, &text)?;
            if text.contains('\n') {
                Ok(at)
            } else {
                Ok(end.saturating_sub(1).max(at))
            }
        }
        RegisterKind::Line => {
            let mut text = entry.content.clone();
            if !text.ends_with('\n') {
                text.push('\n');
            }
            let text = text.repeat(count);
            let target = if !after {
                ed.insert(ed.surface.line_start(line), &text)?;
                line
            } else if line < ed.surface.last_line() {
                ed.insert(ed.surface.line_start(line + 1), &text)?;
                line + 1
            } else {
                let body = text.strip_suffix('\n').unwrap_or(&text);
                let len = ed.surface.len_chars();
                ed.insert(len, &format!("\n{}", body))?;
                line + 1
            };
            Ok(ed.surface.first_non_blank(target))
        }
        RegisterKind::Block => {
            let column = ed.surface.column_of(cursor)
                + usize::from(after && !ed.surface.line_is_empty(line));
            put_block(ed, &entry.content, line, column, count)
        }
    }
}

fn put_block(ed: &mut EditContext, content: &str, line: usize, column: usize, count: usize) -> Result<usize> {
    let rows: Vec<&str> = content.split('\n').collect();
    let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);

    for (i, row) in rows.iter().enumerate() {
        let target = line + i;
        if target > ed.surface.last_line() {
            let len = ed.surface.len_chars();
            ed.insert(len, "\n")?;
        }
        let range = ed.surface.line_range(target);
        if range.len() < column {
            ed.insert(range.end, &" ".repeat(column - range.len()))?;
        }
        let at = ed.surface.line_start(target) + column;
        let text_follows = at < ed.surface.line_end(target);
        let mut piece = String::new();
        for n in 0..count {
            piece.push_str(row);
            if text_follows || n + 1 < count {
                piece.push_str(&" ".repeat(width - row.chars().count()));
            }
        }
        ed.insert(at, &piece)?;
    }
    Ok(ed.surface.offset_at(line, column))
}

/// Join `lines` lines starting at `first` (J and gJ).
///
/// With `spaces`, leading white space of each joined line is replaced by
/// a single space. Returns the cursor: the last join point.
pub fn join_lines(ed: &mut EditContext, first: usize, lines: usize, spaces: bool) -> Result<usize> {
    let last_line = ed.surface.last_line();
    if first >= last_line {
        return Err(EngineError::InvalidRange("no line to join".to_string()));
    }
    let joins = lines.max(2).saturating_sub(1).min(last_line - first);
    let mut cursor = ed.surface.cursor();

    for _ in 0..joins {
        let s = &*ed.surface;
        let end = s.line_end(first);
        let next = s.line_range(first + 1);
        let mut strip = next.start;
        if spaces {
            while strip < next.end && s.char_at(strip).is_some_and(|c| c == ' ' || c == '\t') {
                strip += 1;
            }
        }
        let separator = if !spaces
            || strip == next.end
            || s.char_at(strip) == Some(')')
            || (end > s.line_start(first) && s.char_at(end - 1).is_some_and(|c| c == ' ' || c == '\t'))
        {
            ""
        } else {
            " "
        };
        ed.replace(TextRange::new(end, strip), separator)?;
        cursor = end;
    }

    Ok(ed.surface.clamp_normal(cursor))
}
