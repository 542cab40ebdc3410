//! Buffer marks.
//!
//! Marks are stored as character offsets and shifted by every edit made
//! through the engine, so they follow the text they were set on.

use crate::error::{EngineError, Result};
use std::collections::BTreeMap;

/// Mark set by jumps; `` ` `` is an alias.
pub const PREVIOUS_CONTEXT: char = '\'';
/// Start of the last visual selection.
pub const VISUAL_START: char = '<';
/// End of the last visual selection.
pub const VISUAL_END: char = '>';
/// Start and end of the last changed or yanked text.
pub const CHANGE_START: char = '[';
pub const CHANGE_END: char = ']';
/// Position of the last change.
pub const LAST_CHANGE: char = '.';

#[derive(Debug, Clone, Default)]
pub struct Marks {
    marks: BTreeMap<char, usize>,
}

fn normalize(name: char) -> char {
    if name == '`' {
        PREVIOUS_CONTEXT
    } else {
        name
    }
}

impl Marks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names `m` accepts.
    pub fn is_settable(name: char) -> bool {
        name.is_ascii_alphabetic() || matches!(name, '\'' | '`' | '[' | ']' | '<' | '>')
    }

    /// Set a mark from the user (`m` or `:mark`).
    pub fn set(&mut self, name: char, offset: usize) -> Result<()> {
        if !Self::is_settable(name) {
            return Err(EngineError::InvalidMarkName(name));
        }
        self.marks.insert(normalize(name), offset);
        Ok(())
    }

    /// Set one of the marks the engine maintains itself.
    pub(crate) fn set_internal(&mut self, name: char, offset: usize) {
        self.marks.insert(normalize(name), offset);
    }

    pub fn get(&self, name: char) -> Result<usize> {
        let name = normalize(name);
        self.marks.get(&name).copied().ok_or(EngineError::MarkNotSet(name))
    }

    /// Shift marks after `removed` characters at `start` were replaced by
    /// `inserted` characters. Marks inside the removed text move to `start`.
    pub fn adjust(&mut self, start: usize, removed: usize, inserted: usize) {
        for offset in self.marks.values_mut() {
            if *offset >= start + removed {
                *offset = *offset - removed + inserted;
            } else if *offset > start {
                *offset = start;
            }
        }
    }

    /// All marks in name order.
    pub fn entries(&self) -> impl Iterator<Item = (char, usize)> + '_ {
        self.marks.iter().map(|(&name, &offset)| (name, offset))
    }

    pub fn clear(&mut self) {
        self.marks.clear();
    }
}
