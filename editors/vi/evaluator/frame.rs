//! Evaluator frames and modes.

use crate::command::{FindKind, Operator, Scope};
use crate::executor::InsertSession;
use std::fmt;

/// Kind of visual selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualKind {
    /// `v`
    Char,
    /// `V`
    Line,
    /// `Ctrl-V`
    Block,
}

/// Editor modes, as seen by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    Insert,
    /// Insert mode entered with `R`.
    Replace,
    Visual(VisualKind),
    CommandLine,
}

impl Mode {
    pub fn is_normal(&self) -> bool {
        matches!(self, Mode::Normal)
    }

    /// Check if in any insert/input mode.
    pub fn is_insert(&self) -> bool {
        matches!(self, Mode::Insert | Mode::Replace)
    }

    pub fn is_visual(&self) -> bool {
        matches!(self, Mode::Visual(_))
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Normal => write!(f, "NORMAL"),
            Mode::Insert => write!(f, "INSERT"),
            Mode::Replace => write!(f, "REPLACE"),
            Mode::Visual(VisualKind::Char) => write!(f, "VISUAL"),
            Mode::Visual(VisualKind::Line) => write!(f, "VISUAL LINE"),
            Mode::Visual(VisualKind::Block) => write!(f, "VISUAL BLOCK"),
            Mode::CommandLine => write!(f, "COMMAND"),
        }
    }
}

/// Keys that take one literal character as their argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentKind {
    Find(FindKind),
    /// `r`
    Replace,
    /// `m`
    SetMark,
    /// `'` (linewise) and `` ` ``
    GotoMark { linewise: bool },
    /// `q`
    Record,
    /// `@`
    Play,
    /// `Ctrl-R` in insert mode.
    InsertRegister,
}

/// Command line being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLineState {
    /// `:`, `/` or `?`.
    pub prefix: char,
    pub text: String,
    /// Cursor as a character index into `text`.
    pub cursor: usize,
    /// Selection to restore when a search started in visual mode ends.
    pub visual: Option<(usize, VisualKind)>,
}

impl CommandLineState {
    pub fn new(prefix: char, text: &str) -> Self {
        Self {
            prefix,
            text: text.to_string(),
            cursor: text.chars().count(),
            visual: None,
        }
    }
}

/// One evaluator frame. The bottom of the stack is always a mode root.
#[derive(Debug, Clone)]
pub enum Frame {
    Normal,
    Insert(Box<InsertSession>),
    Visual { anchor: usize, kind: VisualKind },
    CommandLine(CommandLineState),
    /// Digits typed so far.
    Count(usize),
    /// `"` typed; the name once known.
    Register(Option<char>),
    OperatorPending(Operator),
    /// `i`/`a` after an operator (or in visual mode, without one).
    TextObjectPending {
        operator: Option<Operator>,
        scope: Scope,
    },
    Argument(ArgumentKind),
    /// First key of a two-key command (`g`, `Z`).
    Prefix(char),
}

impl Frame {
    pub fn is_root(&self) -> bool {
        matches!(
            self,
            Frame::Normal | Frame::Insert(_) | Frame::Visual { .. } | Frame::CommandLine(_)
        )
    }

    /// Mode of a root frame.
    pub fn mode(&self) -> Option<Mode> {
        match self {
            Frame::Normal => Some(Mode::Normal),
            Frame::Insert(session) if session.is_replace() => Some(Mode::Replace),
            Frame::Insert(_) => Some(Mode::Insert),
            Frame::Visual { kind, .. } => Some(Mode::Visual(*kind)),
            Frame::CommandLine(_) => Some(Mode::CommandLine),
            _ => None,
        }
    }
}
