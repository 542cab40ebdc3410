//! Canonical key events.
//!
//! Host toolkits deliver keys in many shapes (raw bytes, virtual key codes,
//! platform event objects). Everything is converted into a [`KeyEvent`] at
//! the boundary; the grammar only ever sees this type.

use std::fmt;

/// Code points used for keys that have no character of their own.
///
/// These are the private-use code points AppKit reports for function keys,
/// so hosts on that platform can pass them through unchanged.
pub mod code {
    pub const ESCAPE: char = '\u{1b}';
    pub const ENTER: char = '\r';
    pub const TAB: char = '\t';
    pub const BACKSPACE: char = '\u{8}';
    pub const UP: char = '\u{f700}';
    pub const DOWN: char = '\u{f701}';
    pub const LEFT: char = '\u{f702}';
    pub const RIGHT: char = '\u{f703}';
    pub const F1: char = '\u{f704}';
    pub const INSERT: char = '\u{f727}';
    pub const DELETE: char = '\u{f728}';
    pub const HOME: char = '\u{f729}';
    pub const END: char = '\u{f72b}';
    pub const PAGE_UP: char = '\u{f72c}';
    pub const PAGE_DOWN: char = '\u{f72d}';
}

/// Modifier keys held while a key was pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub control: bool,
    pub option: bool,
    pub command: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        control: false,
        option: false,
        command: false,
    };
    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };
    pub const CONTROL: Self = Self {
        control: true,
        ..Self::NONE
    };
    pub const OPTION: Self = Self {
        option: true,
        ..Self::NONE
    };
    pub const COMMAND: Self = Self {
        command: true,
        ..Self::NONE
    };

    /// True when no modifier is held.
    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }
}

/// A single key press, normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: char,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// Build and normalize a key event.
    pub fn new(code: char, modifiers: Modifiers) -> Self {
        Self { code, modifiers }.normalize()
    }

    /// A key with no modifiers.
    pub fn plain(code: char) -> Self {
        Self::new(code, Modifiers::NONE)
    }

    /// A control chord, e.g. `KeyEvent::ctrl('r')` for `<C-r>`.
    pub fn ctrl(code: char) -> Self {
        Self::new(code, Modifiers::CONTROL)
    }

    pub fn escape() -> Self {
        Self::plain(code::ESCAPE)
    }

    pub fn enter() -> Self {
        Self::plain(code::ENTER)
    }

    pub fn backspace() -> Self {
        Self::plain(code::BACKSPACE)
    }

    /// Create a key from a terminal byte.
    pub fn from_byte(b: u8) -> Self {
        Self::new(b as char, Modifiers::NONE)
    }

    /// Reduce a key to its canonical form.
    ///
    /// Raw control bytes become `control` + letter, shifted letters become
    /// their uppercase code point, and `<C-[>` becomes Escape. Shift is only
    /// kept for keys without a printable code point (arrows and friends).
    pub fn normalize(self) -> Self {
        let Self {
            mut code,
            mut modifiers,
        } = self;

        match code {
            '\n' => code = code::ENTER,
            '\u{7f}' => code = code::BACKSPACE,
            '\u{0}' => {
                code = '@';
                modifiers.control = true;
            }
            c @ '\u{1}'..='\u{1a}'
                if c != code::BACKSPACE && c != code::TAB && c != code::ENTER =>
            {
                code = (b'a' + (c as u8) - 1) as char;
                modifiers.control = true;
            }
            _ => {}
        }

        if modifiers.control {
            if code.is_ascii_uppercase() {
                code = code.to_ascii_lowercase();
            }
            if code == '[' {
                code = code::ESCAPE;
                modifiers.control = false;
            }
        }

        if modifiers.shift && !is_special(code) {
            if !modifiers.control {
                code = code.to_uppercase().next().unwrap_or(code);
            }
            modifiers.shift = false;
        }

        Self { code, modifiers }
    }

    /// The character this key types, if it is plain printable text.
    pub fn printable(&self) -> Option<char> {
        if self.modifiers.control || self.modifiers.command {
            return None;
        }
        if self.code.is_control() || is_special(self.code) {
            return None;
        }
        Some(self.code)
    }

    /// Escape-class keys: `<Esc>`, `<C-[>` and `<C-c>`.
    pub fn is_escape(&self) -> bool {
        (self.code == code::ESCAPE && !self.modifiers.command)
            || (self.modifiers.control && self.code == 'c')
    }

    /// Confirm keys: `<CR>`, `<C-m>` and `<C-j>`.
    pub fn is_enter(&self) -> bool {
        (self.code == code::ENTER && self.modifiers.is_empty())
            || (self.modifiers.control && matches!(self.code, 'm' | 'j'))
    }

    /// `<BS>` and `<C-h>`.
    pub fn is_backspace(&self) -> bool {
        (self.code == code::BACKSPACE && self.modifiers.is_empty())
            || (self.modifiers.control && self.code == 'h')
    }

    /// A plain ASCII digit, if this is one.
    pub fn digit(&self) -> Option<u32> {
        self.printable().and_then(|c| c.to_digit(10))
    }

    /// `ctrl('x')` check.
    pub fn is_ctrl(&self, c: char) -> bool {
        self.modifiers.control && !self.modifiers.command && self.code == c
    }
}

impl From<char> for KeyEvent {
    fn from(c: char) -> Self {
        Self::plain(c)
    }
}

/// Keys whose code point is not text.
fn is_special(c: char) -> bool {
    ('\u{f700}'..='\u{f8ff}').contains(&c)
}

/// Name used for a special key in `<...>` notation.
pub(crate) fn special_name(c: char) -> Option<&'static str> {
    let name = match c {
        code::ESCAPE => "Esc",
        code::ENTER => "CR",
        code::TAB => "Tab",
        code::BACKSPACE => "BS",
        code::UP => "Up",
        code::DOWN => "Down",
        code::LEFT => "Left",
        code::RIGHT => "Right",
        code::INSERT => "Insert",
        code::DELETE => "Del",
        code::HOME => "Home",
        code::END => "End",
        code::PAGE_UP => "PageUp",
        code::PAGE_DOWN => "PageDown",
        ' ' => "Space",
        '<' => "lt",
        _ => return None,
    };
    Some(name)
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.modifiers;
        let fkey = (self.code as u32)
            .checked_sub(code::F1 as u32)
            .filter(|n| *n < 35);
        let name = special_name(self.code).filter(|_| self.code != ' ' || !m.is_empty());

        if m.is_empty() && name.is_none() && fkey.is_none() {
            return write!(f, "{}", self.code);
        }

        f.write_str("<")?;
        if m.shift {
            f.write_str("S-")?;
        }
        if m.control {
            f.write_str("C-")?;
        }
        if m.option {
            f.write_str("M-")?;
        }
        if m.command {
            f.write_str("D-")?;
        }
        match (name, fkey) {
            (Some(name), _) => f.write_str(name)?,
            (None, Some(n)) => write!(f, "F{}", n + 1)?,
            (None, None) => write!(f, "{}", self.code)?,
        }
        f.write_str(">")
    }
}
