//! Ex command definitions.

use super::address::{Address, AddressRange};
use crate::error::{EngineError, Result};

/// Names of the commands the engine runs, as `(full name, shortest
/// abbreviation)`. A name matches when it is a prefix of the full name at
/// least as long as the abbreviation.
const COMMANDS: &[(&str, &str)] = &[
    ("copy", "co"),
    ("delete", "d"),
    ("display", "di"),
    ("join", "j"),
    ("k", "k"),
    ("mark", "ma"),
    ("marks", "marks"),
    ("move", "m"),
    ("print", "p"),
    ("put", "pu"),
    ("quit", "q"),
    ("redo", "red"),
    ("registers", "reg"),
    ("set", "se"),
    ("substitute", "s"),
    ("t", "t"),
    ("undo", "u"),
    ("wq", "wq"),
    ("write", "w"),
    ("xit", "x"),
    ("yank", "y"),
];

/// Find the full command name for what the user typed.
///
/// An exact name wins; otherwise the shortest full name the input
/// abbreviates is taken, so `m` is `move` and `ma` is `mark`.
pub fn lookup_name(name: &str) -> Option<&'static str> {
    if let Some((full, _)) = COMMANDS.iter().find(|(full, _)| *full == name) {
        return Some(full);
    }
    COMMANDS
        .iter()
        .filter(|(full, abbrev)| full.starts_with(name) && name.starts_with(abbrev))
        .map(|(full, _)| *full)
        .min_by_key(|full| full.len())
}

/// A command line split into its parts, before interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLineEntry {
    pub range: AddressRange,
    /// Full command name, or the symbol for `>`, `<`, `&` and `=`. Empty
    /// for a bare address.
    pub name: String,
    /// `!` after the name.
    pub force: bool,
    pub args: String,
}

/// Parsed ex command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExCommand {
    /// Go to line (just an address).
    Goto { line: Address },
    /// Delete lines (:d, :delete).
    Delete {
        range: AddressRange,
        register: Option<char>,
        count: Option<usize>,
    },
    /// Yank lines (:y, :yank).
    Yank {
        range: AddressRange,
        register: Option<char>,
        count: Option<usize>,
    },
    /// Put text from register (:pu, :put). `above` with `!`.
    Put {
        line: Option<Address>,
        register: Option<char>,
        above: bool,
    },
    /// Copy lines (:co, :copy, :t).
    Copy { range: AddressRange, dest: Address },
    /// Move lines (:m, :move).
    Move { range: AddressRange, dest: Address },
    /// Join lines (:j, :join). `!` keeps white space.
    Join {
        range: AddressRange,
        count: Option<usize>,
        spaces: bool,
    },
    /// Shift right (:>). `depth` is the number of `>` typed.
    ShiftRight {
        range: AddressRange,
        depth: usize,
        count: Option<usize>,
    },
    /// Shift left (:<).
    ShiftLeft {
        range: AddressRange,
        depth: usize,
        count: Option<usize>,
    },
    /// Substitute (:s, :substitute).
    Substitute {
        range: AddressRange,
        pattern: String,
        replacement: String,
        flags: SubstituteFlags,
        count: Option<usize>,
    },
    /// Repeat substitute (:&, or :s with only flags).
    RepeatSubstitute {
        range: AddressRange,
        flags: SubstituteFlags,
        count: Option<usize>,
    },
    /// Set options (:se, :set).
    Set { args: String },
    /// Undo (:u, :undo).
    Undo,
    /// Redo (:red, :redo).
    Redo,
    /// Mark line (:ma, :mark, :k).
    Mark { line: Option<Address>, name: char },
    /// List marks (:marks).
    Marks { names: String },
    /// List registers (:reg, :di).
    Registers { names: String },
    /// Print lines (:p, :print).
    Print {
        range: AddressRange,
        count: Option<usize>,
    },
    /// Write line number (:=).
    LineNumber { line: Option<Address> },
    /// Write buffer (:w, :write).
    Write {
        range: AddressRange,
        file: Option<String>,
        force: bool,
    },
    /// Quit editor (:q, :quit).
    Quit { force: bool },
    /// Write and quit (:wq, :x). `if_modified` for `:x`.
    WriteQuit {
        file: Option<String>,
        force: bool,
        if_modified: bool,
    },
}

/// Flags for substitute command.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SubstituteFlags {
    /// Global (all occurrences on line).
    pub global: bool,
    /// Count matches (don't substitute).
    pub count: bool,
    /// Print the last substituted line.
    pub print: bool,
    /// Case insensitive.
    pub ignore_case: bool,
    /// Case sensitive, whatever the options say.
    pub match_case: bool,
    /// Keep the flags of the previous substitute (`&`).
    pub keep: bool,
}

impl SubstituteFlags {
    /// Parse flags from a string; returns the flags and what follows them.
    pub fn parse(s: &str) -> Result<(Self, &str)> {
        let mut flags = Self::default();
        for (i, c) in s.char_indices() {
            match c {
                '&' if i == 0 => flags.keep = true,
                'g' => flags.global = !flags.global,
                'n' => flags.count = true,
                'p' => flags.print = true,
                'i' => flags.ignore_case = true,
                'I' => flags.match_case = true,
                'c' => {
                    return Err(EngineError::InvalidCommandLine(
                        "confirm flag not supported".to_string(),
                    ))
                }
                ' ' | '\t' | '0'..='9' => return Ok((flags, s[i..].trim_start())),
                _ => {
                    return Err(EngineError::InvalidCommandLine(format!(
                        "trailing characters: {}",
                        &s[i..]
                    )))
                }
            }
        }
        Ok((flags, ""))
    }

    /// These flags on top of the previous substitute's, for `&&`.
    pub fn merged(self, previous: SubstituteFlags) -> Self {
        if !self.keep {
            return self;
        }
        Self {
            global: previous.global != self.global,
            count: previous.count || self.count,
            print: previous.print || self.print,
            ignore_case: previous.ignore_case || self.ignore_case,
            match_case: previous.match_case || self.match_case,
            keep: false,
        }
    }
}

/// Host-side effect of a command the engine cannot perform itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostRequest {
    Write {
        file: Option<String>,
        /// 1-based inclusive lines when only part of the buffer is written.
        lines: Option<(usize, usize)>,
        force: bool,
    },
    Quit {
        force: bool,
    },
    WriteQuit {
        file: Option<String>,
        force: bool,
        /// Only write when the buffer changed (`:x`, `ZZ`).
        if_modified: bool,
    },
}
