//! The text surface the engine edits.
//!
//! The host owns the real text view; the engine only sees it through
//! [`TextSurface`]. Positions are character offsets into the whole buffer.
//! Lines are numbered from 0 and separated by `'\n'`.

mod buffer;

pub use buffer::Buffer;

use crate::error::SurfaceError;
use std::ops::Range;

/// A half-open range of character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    /// Create a range, ordering the endpoints.
    pub fn new(a: usize, b: usize) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// An empty range at `offset`.
    pub fn point(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl From<Range<usize>> for TextRange {
    fn from(r: Range<usize>) -> Self {
        Self::new(r.start, r.end)
    }
}

/// Buffer primitives supplied by the host.
pub trait TextSurface {
    /// Current cursor offset.
    fn cursor(&self) -> usize;

    /// Move the cursor. Offsets past the end are clamped by the surface.
    fn set_cursor(&mut self, offset: usize);

    /// Total number of characters.
    fn len_chars(&self) -> usize;

    /// Number of lines; an empty buffer has one empty line.
    fn line_count(&self) -> usize;

    /// Line containing `offset`. Offsets past the end map to the last line.
    fn line_of(&self, offset: usize) -> usize;

    /// Offsets of a line's text, excluding its newline.
    fn line_range(&self, line: usize) -> TextRange;

    /// Character at `offset`, or `None` past the end.
    fn char_at(&self, offset: usize) -> Option<char>;

    /// Copy of the text in `range`.
    fn slice(&self, range: TextRange) -> String;

    /// Replace `range` with `text`, returning the offset just past the
    /// inserted text.
    fn replace(&mut self, range: TextRange, text: &str) -> Result<usize, SurfaceError>;

    /// Start a group of edits that undo as one step. Groups may nest.
    fn begin_undo_group(&mut self);

    /// Close the innermost undo group.
    fn end_undo_group(&mut self);

    /// Undo one group, returning the cursor to restore.
    fn undo(&mut self) -> Option<usize>;

    /// Redo one group, returning the cursor to restore.
    fn redo(&mut self) -> Option<usize>;

    /// Whether edits will be refused.
    fn is_read_only(&self) -> bool {
        false
    }

    /// Whether the last line ends with a newline kept outside the
    /// editable text, as for a file read from disk.
    fn has_final_newline(&self) -> bool {
        false
    }
}

/// Line and column helpers available on every surface.
pub trait SurfaceExt: TextSurface {
    /// Last valid line index.
    fn last_line(&self) -> usize {
        self.line_count().saturating_sub(1)
    }

    fn line_start(&self, line: usize) -> usize {
        self.line_range(line).start
    }

    /// Offset of the line's newline (or the buffer end on the last line).
    fn line_end(&self, line: usize) -> usize {
        self.line_range(line).end
    }

    /// Offset of the first character of the next line, or the buffer end.
    fn line_end_with_newline(&self, line: usize) -> usize {
        if line < self.last_line() {
            self.line_start(line + 1)
        } else {
            self.len_chars()
        }
    }

    fn line_len(&self, line: usize) -> usize {
        self.line_range(line).len()
    }

    fn line_is_empty(&self, line: usize) -> bool {
        self.line_range(line).is_empty()
    }

    fn line_text(&self, line: usize) -> String {
        self.slice(self.line_range(line))
    }

    /// Column of `offset` within its line.
    fn column_of(&self, offset: usize) -> usize {
        let line = self.line_of(offset);
        offset.saturating_sub(self.line_start(line))
    }

    /// Offset of `column` on `line`, clamped to the line end.
    fn offset_at(&self, line: usize, column: usize) -> usize {
        let range = self.line_range(line.min(self.last_line()));
        range.start.saturating_add(column).min(range.end)
    }

    /// Last character of the line; the line start when empty.
    fn last_char_of(&self, line: usize) -> usize {
        let range = self.line_range(line);
        range.end.saturating_sub(1).max(range.start)
    }

    /// First non-blank character of the line, or its last character.
    fn first_non_blank(&self, line: usize) -> usize {
        let range = self.line_range(line);
        let mut pos = range.start;
        while pos < range.end && matches!(self.char_at(pos), Some(' ' | '\t')) {
            pos += 1;
        }
        pos.min(self.last_char_of(line))
    }

    /// Clamp an offset so it rests on a character, as normal mode requires.
    fn clamp_normal(&self, offset: usize) -> usize {
        let line = self.line_of(offset.min(self.len_chars()));
        offset.min(self.last_char_of(line)).max(self.line_start(line))
    }

    /// Whole buffer text, with the final newline when the surface keeps
    /// one. An empty buffer has nothing to terminate.
    fn text(&self) -> String {
        let mut text = self.slice(TextRange::new(0, self.len_chars()));
        if self.has_final_newline() && !text.is_empty() {
            text.push('\n');
        }
        text
    }
}

impl<T: TextSurface + ?Sized> SurfaceExt for T {}
