//! Character classes, word scanning and text objects.
//!
//! The word scanners step over the buffer one character at a time, treating
//! each line's `'\n'` as the end-of-line position, so a count is simply the
//! single-step scan repeated.

use crate::error::{EngineError, Result};
use crate::surface::{SurfaceExt, TextRange, TextSurface};

/// Check if a character is a word character (alphanumeric or underscore).
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Check if a character is a blank (space or tab).
pub fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Character class used by word motions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    /// Blanks, line ends and the buffer end.
    Blank,
    Punct,
    Word,
}

/// Classify a character. With `big`, every non-blank is a word character.
pub fn char_class(c: Option<char>, big: bool) -> CharClass {
    match c {
        None | Some('\n') => CharClass::Blank,
        Some(c) if is_blank(c) => CharClass::Blank,
        Some(_) if big => CharClass::Word,
        Some(c) if is_word_char(c) => CharClass::Word,
        Some(_) => CharClass::Punct,
    }
}

fn cls(s: &dyn TextSurface, pos: usize, big: bool) -> CharClass {
    char_class(s.char_at(pos), big)
}

/// How a single step moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Same,
    NextLine,
    OntoLineEnd,
}

/// Step forward one character; `None` at the buffer end.
fn inc(s: &dyn TextSurface, pos: usize) -> Option<(usize, Step)> {
    let len = s.len_chars();
    if pos >= len {
        return None;
    }
    if s.char_at(pos) == Some('\n') {
        return Some((pos + 1, Step::NextLine));
    }
    let next = pos + 1;
    if next >= len || s.char_at(next) == Some('\n') {
        Some((next, Step::OntoLineEnd))
    } else {
        Some((next, Step::Same))
    }
}

/// Step back one character; stepping over a line start lands on the
/// previous line's end. `None` at offset 0.
fn dec(s: &dyn TextSurface, pos: usize) -> Option<(usize, Step)> {
    if pos == 0 {
        return None;
    }
    let prev = pos - 1;
    if s.char_at(prev) == Some('\n') {
        Some((prev, Step::NextLine))
    } else {
        Some((prev, Step::Same))
    }
}

/// True on the (only) position of an empty line.
fn at_empty_line(s: &dyn TextSurface, pos: usize) -> bool {
    matches!(s.char_at(pos), None | Some('\n')) && (pos == 0 || s.char_at(pos - 1) == Some('\n'))
}

/// Start of the `count`th next word (`w`/`W`).
///
/// With `stop_at_eol` (operator pending) the last step stops at the end of
/// the line instead of moving on to the next line's first word.
pub fn fwd_word(s: &dyn TextSurface, mut pos: usize, count: usize, big: bool, stop_at_eol: bool) -> usize {
    let last = s.last_line();
    for n in (0..count).rev() {
        let eol = stop_at_eol && n == 0;
        let sclass = cls(s, pos, big);
        let last_line = s.line_of(pos) == last;

        let Some((next, step)) = inc(s, pos) else {
            return pos;
        };
        pos = next;
        if step != Step::Same && (last_line || eol) {
            return pos;
        }

        if sclass != CharClass::Blank {
            while cls(s, pos, big) == sclass {
                let Some((next, step)) = inc(s, pos) else {
                    return pos;
                };
                pos = next;
                if step != Step::Same && eol {
                    return pos;
                }
            }
        }

        while cls(s, pos, big) == CharClass::Blank {
            if at_empty_line(s, pos) {
                break;
            }
            let Some((next, step)) = inc(s, pos) else {
                return pos;
            };
            pos = next;
            if step != Step::Same && eol {
                return pos;
            }
        }
    }
    pos
}

/// Start of the `count`th previous word (`b`/`B`).
pub fn bck_word(s: &dyn TextSurface, mut pos: usize, count: usize, big: bool) -> usize {
    for _ in 0..count {
        let Some((prev, _)) = dec(s, pos) else {
            return pos;
        };
        pos = prev;

        let mut on_empty_line = false;
        while cls(s, pos, big) == CharClass::Blank {
            if at_empty_line(s, pos) {
                on_empty_line = true;
                break;
            }
            let Some((prev, _)) = dec(s, pos) else {
                return pos;
            };
            pos = prev;
        }
        if on_empty_line {
            continue;
        }

        let class = cls(s, pos, big);
        while cls(s, pos, big) == class {
            let Some((prev, _)) = dec(s, pos) else {
                return pos;
            };
            pos = prev;
        }
        // overshot by one
        pos += 1;
    }
    pos
}

/// End of the `count`th word (`e`/`E`).
///
/// With `stop`, a cursor already on the last character of a word stays
/// there for the first step; `cw` relies on this.
pub fn end_word(s: &dyn TextSurface, mut pos: usize, count: usize, big: bool, stop: bool) -> usize {
    let mut stop = stop;
    for _ in 0..count {
        let sclass = cls(s, pos, big);
        let Some((next, _)) = inc(s, pos) else {
            return pos;
        };
        pos = next;

        if cls(s, pos, big) == sclass && sclass != CharClass::Blank {
            while cls(s, pos, big) == sclass {
                let Some((next, _)) = inc(s, pos) else {
                    return pos;
                };
                pos = next;
            }
        } else if !stop || sclass == CharClass::Blank {
            while cls(s, pos, big) == CharClass::Blank {
                let Some((next, _)) = inc(s, pos) else {
                    return pos;
                };
                pos = next;
            }
            let class = cls(s, pos, big);
            while cls(s, pos, big) == class {
                let Some((next, _)) = inc(s, pos) else {
                    return pos;
                };
                pos = next;
            }
        }
        // overshot by one
        pos -= 1;
        stop = false;
    }
    pos
}

/// End of the `count`th previous word (`ge`/`gE`).
pub fn bckend_word(s: &dyn TextSurface, mut pos: usize, count: usize, big: bool) -> usize {
    for _ in 0..count {
        let sclass = cls(s, pos, big);
        let Some((prev, _)) = dec(s, pos) else {
            return pos;
        };
        pos = prev;

        if sclass != CharClass::Blank {
            while cls(s, pos, big) == sclass {
                let Some((prev, _)) = dec(s, pos) else {
                    return pos;
                };
                pos = prev;
            }
        }
        while cls(s, pos, big) == CharClass::Blank {
            if at_empty_line(s, pos) {
                break;
            }
            let Some((prev, _)) = dec(s, pos) else {
                return pos;
            };
            pos = prev;
        }
    }
    pos
}

/// Offsets where sentences start, in buffer order.
///
/// A sentence ends at `.`, `!` or `?` followed (after any closing `)]"'`)
/// by white space or a line end. Empty lines also separate sentences and
/// count as starts themselves.
pub fn sentence_starts(s: &dyn TextSurface) -> Vec<usize> {
    let text: Vec<char> = s.slice(TextRange::new(0, s.len_chars())).chars().collect();
    let n = text.len();
    let mut starts = Vec::new();
    let mut at_start = true;
    let mut i = 0;

    while i < n {
        let c = text[i];
        if at_start {
            if is_blank(c) {
                i += 1;
                continue;
            }
            if c == '\n' {
                if i == 0 || text[i - 1] == '\n' {
                    starts.push(i);
                }
                i += 1;
                continue;
            }
            starts.push(i);
            at_start = false;
        }

        if matches!(c, '.' | '!' | '?') {
            let mut j = i + 1;
            while j < n && matches!(text[j], ')' | ']' | '"' | '\'') {
                j += 1;
            }
            if j >= n || text[j].is_whitespace() {
                at_start = true;
                i = j;
                continue;
            }
        }
        if c == '\n' && i + 1 < n && text[i + 1] == '\n' {
            at_start = true;
        }
        i += 1;
    }

    starts
}

/// Selection produced by a text object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub range: TextRange,
    pub linewise: bool,
}

impl Selection {
    fn chars(start: usize, end: usize) -> Self {
        Self {
            range: TextRange::new(start, end),
            linewise: false,
        }
    }
}

/// Inner (`i`) or around (`a`) variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Inner,
    Around,
}

/// Text objects selectable after `i`/`a`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextObject {
    Word { big: bool },
    Sentence,
    Paragraph,
    Bracket { open: char, close: char },
    Quote(char),
}

impl TextObject {
    /// Object selected by the key after `i`/`a`.
    pub fn from_key(c: char) -> Option<Self> {
        let obj = match c {
            'w' => TextObject::Word { big: false },
            'W' => TextObject::Word { big: true },
            's' => TextObject::Sentence,
            'p' => TextObject::Paragraph,
            '(' | ')' | 'b' => TextObject::Bracket {
                open: '(',
                close: ')',
            },
            '[' | ']' => TextObject::Bracket {
                open: '[',
                close: ']',
            },
            '{' | '}' | 'B' => TextObject::Bracket {
                open: '{',
                close: '}',
            },
            '<' | '>' => TextObject::Bracket {
                open: '<',
                close: '>',
            },
            '"' | '\'' | '`' => TextObject::Quote(c),
            _ => return None,
        };
        Some(obj)
    }

    /// Human readable name for error messages.
    pub fn describe(&self) -> String {
        match self {
            TextObject::Word { big: false } => "word".to_string(),
            TextObject::Word { big: true } => "WORD".to_string(),
            TextObject::Sentence => "sentence".to_string(),
            TextObject::Paragraph => "paragraph".to_string(),
            TextObject::Bracket { open, close } => format!("{}{} block", open, close),
            TextObject::Quote(q) => format!("{} string", q),
        }
    }

    /// Compute the selection around `pos`.
    pub fn select(&self, s: &dyn TextSurface, pos: usize, count: usize, scope: Scope) -> Result<Selection> {
        let count = count.max(1);
        let around = scope == Scope::Around;
        let selection = match *self {
            TextObject::Word { big } => Some(word_object(s, pos, count, around, big)),
            TextObject::Sentence => sentence_object(s, pos, count, around),
            TextObject::Paragraph => Some(paragraph_object(s, pos, count, around)),
            TextObject::Bracket { open, close } => bracket_object(s, pos, open, close, count, around),
            TextObject::Quote(q) => quote_object(s, pos, q, around),
        };
        selection.ok_or_else(|| EngineError::InvalidTextObjectAtCursor(self.describe()))
    }
}

/// Run of same-class characters containing `pos`, within `line`.
fn class_run(s: &dyn TextSurface, line: TextRange, pos: usize, big: bool) -> (usize, usize) {
    let class = cls(s, pos, big);
    let mut start = pos;
    while start > line.start && cls(s, start - 1, big) == class {
        start -= 1;
    }
    let mut end = pos;
    while end < line.end && cls(s, end, big) == class {
        end += 1;
    }
    (start, end)
}

fn word_object(s: &dyn TextSurface, pos: usize, count: usize, around: bool, big: bool) -> Selection {
    let line = s.line_range(s.line_of(pos));
    if line.is_empty() {
        return Selection::chars(line.start, line.start);
    }
    let pos = pos.clamp(line.start, line.end - 1);
    let (mut start, mut end) = class_run(s, line, pos, big);

    if !around {
        // every run, word or blank, counts once
        for _ in 1..count {
            if end >= line.end {
                break;
            }
            end = class_run(s, line, end, big).1;
        }
        return Selection::chars(start, end);
    }

    let started_on_blank = cls(s, pos, big) == CharClass::Blank;
    if started_on_blank {
        // blanks plus the following word
        for i in 0..count {
            if i > 0 && end < line.end && cls(s, end, big) == CharClass::Blank {
                end = class_run(s, line, end, big).1;
            }
            if end < line.end {
                end = class_run(s, line, end, big).1;
            }
        }
        return Selection::chars(start, end);
    }

    for _ in 1..count {
        if end < line.end && cls(s, end, big) == CharClass::Blank {
            end = class_run(s, line, end, big).1;
        }
        if end < line.end {
            end = class_run(s, line, end, big).1;
        }
    }
    if end < line.end && cls(s, end, big) == CharClass::Blank {
        end = class_run(s, line, end, big).1;
    } else {
        let mut lead = start;
        while lead > line.start && cls(s, lead - 1, big) == CharClass::Blank {
            lead -= 1;
        }
        // indentation stays put
        if lead > line.start {
            start = lead;
        }
    }
    Selection::chars(start, end)
}

fn sentence_object(s: &dyn TextSurface, pos: usize, count: usize, around: bool) -> Option<Selection> {
    let starts = sentence_starts(s);
    let len = s.len_chars();
    let idx = starts.iter().rposition(|&st| st <= pos)?;
    let start = starts[idx];
    let end = starts.get(idx + count).copied().unwrap_or(len);

    if around {
        return Some(Selection::chars(start, end));
    }
    let mut inner_end = end;
    while inner_end > start && s.char_at(inner_end - 1).is_some_and(char::is_whitespace) {
        inner_end -= 1;
    }
    Some(Selection::chars(start, inner_end))
}

fn paragraph_object(s: &dyn TextSurface, pos: usize, count: usize, around: bool) -> Selection {
    let last = s.last_line();
    let line = s.line_of(pos);
    let blank = s.line_is_empty(line);

    let mut first = line;
    while first > 0 && s.line_is_empty(first - 1) == blank {
        first -= 1;
    }

    // extends `end` over the block of lines with the given emptiness
    let extend = |from: usize, empty: bool| -> Option<usize> {
        if from > last || s.line_is_empty(from) != empty {
            return None;
        }
        let mut end = from;
        while end < last && s.line_is_empty(end + 1) == empty {
            end += 1;
        }
        Some(end)
    };

    let mut end = extend(line, blank).unwrap_or(line);
    let mut blocks = if around { 2 * count } else { count };
    blocks -= 1;
    let mut current = blank;
    let mut trailing_found = !around;
    while blocks > 0 {
        current = !current;
        match extend(end + 1, current) {
            Some(e) => {
                end = e;
                if around && current {
                    trailing_found = true;
                }
            }
            None => break,
        }
        blocks -= 1;
    }

    // `ap` at the last paragraph takes the blank lines before it instead
    if around && !blank && !trailing_found {
        while first > 0 && s.line_is_empty(first - 1) {
            first -= 1;
        }
    }

    Selection {
        range: TextRange::new(s.line_start(first), s.line_end(end)),
        linewise: true,
    }
}

fn bracket_object(
    s: &dyn TextSurface,
    pos: usize,
    open: char,
    close: char,
    count: usize,
    around: bool,
) -> Option<Selection> {
    let mut remaining = count;
    let mut depth = 0usize;
    let mut i = if s.char_at(pos) == Some(close) {
        pos.checked_sub(1)?
    } else {
        pos
    };

    let open_pos = loop {
        match s.char_at(i) {
            Some(c) if c == close => depth += 1,
            Some(c) if c == open => {
                if depth == 0 {
                    remaining -= 1;
                    if remaining == 0 {
                        break i;
                    }
                } else {
                    depth -= 1;
                }
            }
            _ => {}
        }
        i = i.checked_sub(1)?;
    };

    let close_pos = match_forward(s, open_pos, open, close)?;
    if around {
        return Some(Selection::chars(open_pos, close_pos + 1));
    }

    let mut start = open_pos + 1;
    let mut end = close_pos;
    if s.char_at(start) == Some('\n') && start < end {
        start += 1;
    }
    let close_line = s.line_of(close_pos);
    let close_line_start = s.line_start(close_line);
    if close_line > s.line_of(open_pos)
        && close_line_start >= start
        && (close_line_start..close_pos).all(|p| s.char_at(p).is_some_and(is_blank))
    {
        end = close_line_start;
    }
    Some(Selection::chars(start, end.max(start)))
}

/// Offset of the bracket closing the one at `open_pos`.
pub fn match_forward(s: &dyn TextSurface, open_pos: usize, open: char, close: char) -> Option<usize> {
    let len = s.len_chars();
    let mut depth = 0usize;
    for p in open_pos + 1..len {
        match s.char_at(p) {
            Some(c) if c == open => depth += 1,
            Some(c) if c == close => {
                if depth == 0 {
                    return Some(p);
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}

/// Offset of the bracket opening the one at `close_pos`.
pub fn match_backward(s: &dyn TextSurface, close_pos: usize, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    for p in (0..close_pos).rev() {
        match s.char_at(p) {
            Some(c) if c == close => depth += 1,
            Some(c) if c == open => {
                if depth == 0 {
                    return Some(p);
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}

fn quote_object(s: &dyn TextSurface, pos: usize, q: char, around: bool) -> Option<Selection> {
    let line = s.line_range(s.line_of(pos));
    let quotes: Vec<usize> = (line.start..line.end)
        .filter(|&p| s.char_at(p) == Some(q) && (p == line.start || s.char_at(p - 1) != Some('\\')))
        .collect();

    let (open, close) = if let Some(idx) = quotes.iter().position(|&p| p == pos) {
        if idx % 2 == 0 {
            (quotes[idx], *quotes.get(idx + 1)?)
        } else {
            (quotes[idx - 1], quotes[idx])
        }
    } else {
        let before = quotes.iter().filter(|&&p| p < pos).count();
        if before % 2 == 1 {
            (quotes[before - 1], *quotes.get(before)?)
        } else {
            (*quotes.get(before)?, *quotes.get(before + 1)?)
        }
    };

    if !around {
        return Some(Selection::chars(open + 1, close));
    }
    let mut start = open;
    let mut end = close + 1;
    if end < line.end && s.char_at(end).is_some_and(is_blank) {
        while end < line.end && s.char_at(end).is_some_and(is_blank) {
            end += 1;
        }
    } else {
        while start > line.start && s.char_at(start - 1).is_some_and(is_blank) {
            start -= 1;
        }
    }
    Some(Selection::chars(start, end))
}
