//! Register store.
//!
//! Registers hold text for yank/delete/put operations and for macros.
//!
//! - Unnamed register (`"`): written by every yank and delete
//! - Named registers (`a`-`z`): uppercase (`A`-`Z`) appends
//! - Yank register (`0`): last yank that named no register
//! - Numbered registers (`1`-`9`): previous deletes of a line or more
//! - Small delete register (`-`): deletes within one line
//! - Black hole (`_`): swallows writes, reads as empty
//! - Read-only registers (`.`, `:`, `/`): last insert, command line, search
//!
//! One store is shared by every engine in the process through a
//! [`SharedRegisters`] handle. All access happens on the event thread.

use crate::error::{EngineError, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shape of the text held by a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegisterKind {
    #[default]
    Character,
    /// Whole lines; content always ends with a newline.
    Line,
    /// A rectangle; rows are separated by newlines.
    Block,
}

/// Content stored in a register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterEntry {
    pub name: char,
    pub content: String,
    pub kind: RegisterKind,
}

impl RegisterEntry {
    pub fn new(name: char, content: impl Into<String>, kind: RegisterKind) -> Self {
        Self {
            name,
            content: content.into(),
            kind,
        }
    }

    pub fn is_linewise(&self) -> bool {
        self.kind == RegisterKind::Line
    }
}

/// Handle through which engines share one store.
pub type SharedRegisters = Rc<RefCell<RegisterStore>>;

/// Register storage.
#[derive(Debug, Default)]
pub struct RegisterStore {
    /// `"`, `0`, `a`-`z`, `-` and the read-only registers.
    slots: HashMap<char, RegisterEntry>,
    /// Numbered registers `1`-`9`, most recent first.
    numbered: [Option<RegisterEntry>; 9],
}

impl RegisterStore {
    /// Create a new register storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store wrapped for sharing between engines.
    pub fn shared() -> SharedRegisters {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Whether `name` can be read by a put or a macro.
    pub fn is_readable(name: char) -> bool {
        matches!(name, '"' | '0'..='9' | 'a'..='z' | 'A'..='Z' | '-' | '_' | '.' | ':' | '/')
    }

    /// Whether `name` can be given to a yank or delete.
    pub fn is_writable(name: char) -> bool {
        matches!(name, '"' | '0'..='9' | 'a'..='z' | 'A'..='Z' | '-' | '_')
    }

    /// Get content from a register.
    ///
    /// Returns `Ok(None)` for a valid register that has never been written.
    pub fn get(&self, name: char) -> Result<Option<&RegisterEntry>> {
        if !Self::is_readable(name) {
            return Err(EngineError::InvalidRegister(name));
        }
        let entry = match name {
            '1'..='9' => self.numbered[(name as u8 - b'1') as usize].as_ref(),
            '_' => None,
            'A'..='Z' => self.slots.get(&name.to_ascii_lowercase()),
            _ => self.slots.get(&name),
        };
        Ok(entry)
    }

    /// Get content that must exist, as a put requires.
    pub fn require(&self, name: char) -> Result<&RegisterEntry> {
        self.get(name)?.ok_or(EngineError::EmptyRegister(name))
    }

    /// Write one register directly, without the unnamed/numbered side effects.
    ///
    /// Uppercase names append to their lowercase register.
    pub fn set(&mut self, name: char, content: &str, kind: RegisterKind) -> Result<()> {
        if !Self::is_writable(name) {
            return Err(EngineError::InvalidRegister(name));
        }
        match name {
            '_' => {}
            '1'..='9' => {
                self.numbered[(name as u8 - b'1') as usize] =
                    Some(RegisterEntry::new(name, content, kind));
            }
            'A'..='Z' => {
                let lower = name.to_ascii_lowercase();
                match self.slots.get_mut(&lower) {
                    Some(existing) => append(existing, content, kind),
                    None => {
                        self.slots
                            .insert(lower, RegisterEntry::new(lower, content, kind));
                    }
                }
            }
            _ => {
                self.slots
                    .insert(name, RegisterEntry::new(name, content, kind));
            }
        }
        Ok(())
    }

    /// Update one of the read-only registers (`.`, `:`, `/`).
    pub fn set_read_only(&mut self, name: char, content: &str) {
        if matches!(name, '.' | ':' | '/') {
            self.slots
                .insert(name, RegisterEntry::new(name, content, RegisterKind::Character));
        }
    }

    /// Store a yank.
    ///
    /// With no register named, the text goes to `"` and `0`. With a named
    /// register, `"` follows it. The black hole register leaves everything
    /// untouched.
    pub fn record_yank(&mut self, register: Option<char>, content: &str, kind: RegisterKind) -> Result<()> {
        match register {
            Some('_') => Ok(()),
            None | Some('"') => {
                self.set('0', content, kind)?;
                self.set('"', content, kind)
            }
            Some(name) => {
                self.set(name, content, kind)?;
                self.mirror_unnamed(name)
            }
        }
    }

    /// Store a delete.
    ///
    /// Deletes of a line or more shift `1`-`9`; smaller ones go to `-`.
    pub fn record_delete(&mut self, register: Option<char>, content: &str, kind: RegisterKind) -> Result<()> {
        match register {
            Some('_') => Ok(()),
            None | Some('"') => {
                if kind == RegisterKind::Line || content.contains('\n') {
                    self.push_numbered(RegisterEntry::new('1', content, kind));
                } else {
                    self.set('-', content, kind)?;
                }
                self.set('"', content, kind)
            }
            Some(name) => {
                self.set(name, content, kind)?;
                self.mirror_unnamed(name)
            }
        }
    }

    /// Shift registers 1-8 to 2-9 and put new content in 1.
    fn push_numbered(&mut self, entry: RegisterEntry) {
        for i in (1..9).rev() {
            self.numbered[i] = self.numbered[i - 1].take().map(|mut e| {
                e.name = (b'1' + i as u8) as char;
                e
            });
        }
        self.numbered[0] = Some(entry);
    }

    fn mirror_unnamed(&mut self, name: char) -> Result<()> {
        if let Some(entry) = self.get(name)?.cloned() {
            self.set('"', &entry.content, entry.kind)?;
        }
        Ok(())
    }

    /// All non-empty registers in `:registers` order.
    pub fn entries(&self) -> Vec<&RegisterEntry> {
        let order = "\"0123456789abcdefghijklmnopqrstuvwxyz-.:/";
        order
            .chars()
            .filter_map(|name| self.get(name).ok().flatten())
            .collect()
    }

    /// Clear all registers.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.numbered = Default::default();
    }
}

fn append(existing: &mut RegisterEntry, content: &str, kind: RegisterKind) {
    let linewise = existing.kind == RegisterKind::Line || kind == RegisterKind::Line;
    if linewise && !existing.content.ends_with('\n') {
        existing.content.push('\n');
    }
    existing.content.push_str(content);
    if linewise && !existing.content.ends_with('\n') {
        existing.content.push('\n');
    }
    if linewise {
        existing.kind = RegisterKind::Line;
    }
}
