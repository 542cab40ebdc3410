//! Command-line editing keys.

use crate::evaluator::frame::CommandLineState;
use crate::input::{code, KeyEvent};

/// One command-line editing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEdit {
    Insert(char),
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
    /// `Ctrl-W`
    DeleteWord,
    /// `Ctrl-U`
    DeleteToStart,
    Commit,
    Cancel,
}

/// What applying an edit did to the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStatus {
    Editing,
    Committed,
    Cancelled,
}

pub fn lookup(key: &KeyEvent) -> Option<LineEdit> {
    if key.is_escape() {
        return Some(LineEdit::Cancel);
    }
    if key.is_enter() {
        return Some(LineEdit::Commit);
    }
    if key.is_backspace() {
        return Some(LineEdit::Backspace);
    }
    if key.modifiers.control {
        return match key.code {
            'w' => Some(LineEdit::DeleteWord),
            'u' => Some(LineEdit::DeleteToStart),
            'b' => Some(LineEdit::Home),
            'e' => Some(LineEdit::End),
            _ => None,
        };
    }
    let edit = match key.code {
        code::DELETE => LineEdit::Delete,
        code::LEFT => LineEdit::Left,
        code::RIGHT => LineEdit::Right,
        code::HOME => LineEdit::Home,
        code::END => LineEdit::End,
        code::TAB => LineEdit::Insert('\t'),
        _ => LineEdit::Insert(key.printable()?),
    };
    Some(edit)
}

fn byte_index(text: &str, chars: usize) -> usize {
    text.char_indices().nth(chars).map_or(text.len(), |(i, _)| i)
}

impl CommandLineState {
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn remove(&mut self, from: usize, to: usize) {
        let start = byte_index(&self.text, from);
        let end = byte_index(&self.text, to);
        self.text.replace_range(start..end, "");
        self.cursor = from;
    }

    /// Apply one edit. Backspace on an empty line cancels it.
    pub fn apply(&mut self, edit: LineEdit) -> LineStatus {
        match edit {
            LineEdit::Insert(c) => {
                let at = byte_index(&self.text, self.cursor);
                self.text.insert(at, c);
                self.cursor += 1;
            }
            LineEdit::Backspace => {
                if self.text.is_empty() {
                    return LineStatus::Cancelled;
                }
                if self.cursor > 0 {
                    self.remove(self.cursor - 1, self.cursor);
                }
            }
            LineEdit::Delete => {
                if self.cursor < self.len() {
                    self.remove(self.cursor, self.cursor + 1);
                }
            }
            LineEdit::Left => self.cursor = self.cursor.saturating_sub(1),
            LineEdit::Right => self.cursor = (self.cursor + 1).min(self.len()),
            LineEdit::Home => self.cursor = 0,
            LineEdit::End => self.cursor = self.len(),
            LineEdit::DeleteWord => {
                let chars: Vec<char> = self.text.chars().collect();
                let mut start = self.cursor;
                while start > 0 && chars[start - 1].is_whitespace() {
                    start -= 1;
                }
                if start > 0 {
                    let word = chars[start - 1].is_alphanumeric() || chars[start - 1] == '_';
                    while start > 0 {
                        let c = chars[start - 1];
                        let same = (c.is_alphanumeric() || c == '_') == word;
                        if c.is_whitespace() || !same {
                            break;
                        }
                        start -= 1;
                    }
                }
                self.remove(start, self.cursor);
            }
            LineEdit::DeleteToStart => self.remove(0, self.cursor),
            LineEdit::Commit => return LineStatus::Committed,
            LineEdit::Cancel => return LineStatus::Cancelled,
        }
        LineStatus::Editing
    }
}
