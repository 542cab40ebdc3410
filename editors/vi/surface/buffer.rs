//! In-memory text surface backed by a rope.
//!
//! Used by the replay binary and the tests; hosts with their own text
//! storage implement [`TextSurface`] directly instead.
//!
//! A newline at the end of the loaded text terminates the last line rather
//! than starting an empty one. It is kept apart from the rope, so `G` and
//! `$` addresses land on the last real line, and is added back by
//! [`SurfaceExt::text`](super::SurfaceExt::text).

use super::{TextRange, TextSurface};
use crate::error::SurfaceError;
use ropey::Rope;

/// One primitive edit, enough to apply it in either direction.
#[derive(Debug, Clone)]
struct Edit {
    start: usize,
    removed: String,
    inserted: String,
    cursor_before: usize,
}

/// Rope buffer with grouped undo history.
#[derive(Debug)]
pub struct Buffer {
    text: Rope,
    final_newline: bool,
    cursor: usize,
    read_only: bool,
    undo_stack: Vec<Vec<Edit>>,
    redo_stack: Vec<Vec<Edit>>,
    /// Edits of the group being built.
    current_group: Vec<Edit>,
    group_depth: usize,
}

impl Default for Buffer {
    fn default() -> Self {
        Self::from_text("")
    }
}

impl Buffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: &str) -> Self {
        let (body, final_newline) = split_final_newline(text);
        Self {
            text: Rope::from_str(body),
            final_newline,
            cursor: 0,
            read_only: false,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            current_group: Vec::new(),
            group_depth: 0,
        }
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Replace all text and forget the history.
    pub fn set_text(&mut self, text: &str) {
        let (body, final_newline) = split_final_newline(text);
        self.text = Rope::from_str(body);
        self.final_newline = final_newline;
        self.cursor = 0;
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current_group.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    fn apply(&mut self, start: usize, remove_len: usize, insert: &str) {
        self.text.remove(start..start + remove_len);
        self.text.insert(start, insert);
    }

    /// Whether the last line is terminated by a newline.
    pub fn final_newline(&self) -> bool {
        self.final_newline
    }

    pub fn set_final_newline(&mut self, final_newline: bool) {
        self.final_newline = final_newline;
    }

    fn push_edit(&mut self, edit: Edit) {
        self.redo_stack.clear();
        if self.group_depth > 0 {
            self.current_group.push(edit);
        } else {
            self.undo_stack.push(vec![edit]);
        }
    }
}

impl TextSurface for Buffer {
    fn cursor(&self) -> usize {
        self.cursor
    }

    fn set_cursor(&mut self, offset: usize) {
        self.cursor = offset.min(self.text.len_chars());
    }

    fn len_chars(&self) -> usize {
        self.text.len_chars()
    }

    fn line_count(&self) -> usize {
        self.text.len_lines()
    }

    fn line_of(&self, offset: usize) -> usize {
        self.text.char_to_line(offset.min(self.text.len_chars()))
    }

    fn line_range(&self, line: usize) -> TextRange {
        let line = line.min(self.text.len_lines() - 1);
        let start = self.text.line_to_char(line);
        let slice = self.text.line(line);
        let mut len = slice.len_chars();
        if len > 0 && slice.char(len - 1) == '\n' {
            len -= 1;
        }
        TextRange {
            start,
            end: start + len,
        }
    }

    fn char_at(&self, offset: usize) -> Option<char> {
        (offset < self.text.len_chars()).then(|| self.text.char(offset))
    }

    fn slice(&self, range: TextRange) -> String {
        let len = self.text.len_chars();
        let end = range.end.min(len);
        let start = range.start.min(end);
        self.text.slice(start..end).to_string()
    }

    fn replace(&mut self, range: TextRange, text: &str) -> Result<usize, SurfaceError> {
        if self.read_only {
            return Err(SurfaceError::ReadOnly);
        }
        let len = self.text.len_chars();
        if range.start > range.end || range.end > len {
            return Err(SurfaceError::OutOfRange {
                start: range.start,
                end: range.end,
                len,
            });
        }

        let removed = self.slice(range);
        if removed.is_empty() && text.is_empty() {
            return Ok(range.start);
        }
        let edit = Edit {
            start: range.start,
            removed,
            inserted: text.to_string(),
            cursor_before: self.cursor,
        };
        self.apply(range.start, range.len(), text);
        self.push_edit(edit);

        let after = range.start + text.chars().count();
        self.cursor = after.min(self.text.len_chars());
        Ok(after)
    }

    fn begin_undo_group(&mut self) {
        self.group_depth += 1;
    }

    fn end_undo_group(&mut self) {
        if self.group_depth == 0 {
            return;
        }
        self.group_depth -= 1;
        if self.group_depth == 0 && !self.current_group.is_empty() {
            let group = std::mem::take(&mut self.current_group);
            self.undo_stack.push(group);
        }
    }

    fn undo(&mut self) -> Option<usize> {
        let group = self.undo_stack.pop()?;
        for edit in group.iter().rev() {
            let inserted = edit.inserted.chars().count();
            self.apply(edit.start, inserted, &edit.removed);
        }
        let cursor = group
            .iter()
            .map(|e| e.cursor_before.min(e.start))
            .min()
            .unwrap_or(0);
        self.cursor = cursor.min(self.text.len_chars());
        self.redo_stack.push(group);
        Some(self.cursor)
    }

    fn redo(&mut self) -> Option<usize> {
        let group = self.redo_stack.pop()?;
        for edit in &group {
            let removed = edit.removed.chars().count();
            self.apply(edit.start, removed, &edit.inserted);
        }
        self.cursor = group.first().map(|e| e.start).unwrap_or(0).min(self.text.len_chars());
        self.undo_stack.push(group);
        Some(self.cursor)
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn has_final_newline(&self) -> bool {
        self.final_newline
    }
}

/// Text without one trailing newline, and whether there was one.
fn split_final_newline(text: &str) -> (&str, bool) {
    match text.strip_suffix('\n') {
        Some(body) => (body, true),
        None => (text, false),
    }
}

impl std::fmt::Display for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for chunk in self.text.chunks() {
            f.write_str(chunk)?;
        }
        if self.final_newline && self.text.len_chars() > 0 {
            f.write_str("\n")?;
        }
        Ok(())
    }
}
