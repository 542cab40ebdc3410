//! Resolved operations: what a completed key sequence asks the executor
//! to do.

use crate::command::{Motion, Operator, Scope, TextObject};
use crate::evaluator::frame::VisualKind;
use std::fmt;

/// What an operator applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Motion(Motion),
    TextObject(TextObject, Scope),
    /// Doubled operator (`dd`, `>>`, `gUU`): `count` whole lines.
    Line,
    /// The current visual selection.
    Visual,
}

/// Where insert mode starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertAt {
    /// `i`
    Before,
    /// `a`
    After,
    /// `I`
    FirstNonBlank,
    /// `A`
    LineEnd,
    /// `gI`
    ColumnZero,
    /// `o`
    OpenBelow,
    /// `O`
    OpenAbove,
    /// `R`
    Replace,
}

impl InsertAt {
    pub fn opens_line(self) -> bool {
        matches!(self, InsertAt::OpenBelow | InsertAt::OpenAbove)
    }
}

/// Commands that are neither motions nor operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Put { after: bool },
    Undo,
    Redo,
    RepeatChange,
    /// `~` in normal mode.
    ToggleCaseChar,
    Join { spaces: bool },
    /// `r{c}`
    ReplaceChar(char),
    Insert(InsertAt),
    EnterVisual(VisualKind),
    /// `o` in visual mode.
    SwapVisualEnds,
    /// `I`/`A` in visual mode.
    VisualInsert { append: bool },
    /// `i{obj}`/`a{obj}` in visual mode.
    SelectObject(TextObject, Scope),
    SetMark(char),
    StartRecording(char),
    StopRecording,
    /// `@{reg}`; `@` replays the last one, `:` the last command line.
    PlayMacro(char),
    /// `ZZ`
    WriteQuit,
    /// `ZQ`
    Quit,
    /// `Ctrl-G`
    ShowPosition,
}

impl Action {
    /// Actions `.` can repeat.
    pub fn is_repeatable(&self) -> bool {
        matches!(
            self,
            Action::Put { .. }
                | Action::ToggleCaseChar
                | Action::Join { .. }
                | Action::ReplaceChar(_)
                | Action::Insert(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationKind {
    Motion(Motion),
    Operator { operator: Operator, target: Target },
    Action(Action),
    /// Committed command line: `:` commands, `/` and `?` searches.
    CommandLine { prefix: char, text: String },
}

/// A fully resolved key sequence. Consumed once by the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOperation {
    pub count: Option<usize>,
    pub register: Option<char>,
    pub kind: OperationKind,
}

impl ResolvedOperation {
    pub fn new(kind: OperationKind, count: Option<usize>, register: Option<char>) -> Self {
        Self {
            count,
            register,
            kind,
        }
    }

    /// Count with the default of one.
    pub fn count1(&self) -> usize {
        self.count.unwrap_or(1).max(1)
    }

    pub fn operator(&self) -> Option<Operator> {
        match &self.kind {
            OperationKind::Operator { operator, .. } => Some(*operator),
            _ => None,
        }
    }

    pub fn motion(&self) -> Option<&Motion> {
        match &self.kind {
            OperationKind::Motion(motion)
            | OperationKind::Operator {
                target: Target::Motion(motion),
                ..
            } => Some(motion),
            _ => None,
        }
    }

    pub fn text_object(&self) -> Option<(TextObject, Scope)> {
        match &self.kind {
            OperationKind::Operator {
                target: Target::TextObject(obj, scope),
                ..
            } => Some((*obj, *scope)),
            OperationKind::Action(Action::SelectObject(obj, scope)) => Some((*obj, *scope)),
            _ => None,
        }
    }

    pub fn action(&self) -> Option<&Action> {
        match &self.kind {
            OperationKind::Action(action) => Some(action),
            _ => None,
        }
    }

    /// Whether `.` should remember this operation.
    pub fn is_repeatable(&self) -> bool {
        match &self.kind {
            OperationKind::Operator { operator, .. } => operator.changes_text(),
            OperationKind::Action(action) => action.is_repeatable(),
            _ => false,
        }
    }
}

impl fmt::Display for ResolvedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(register) = self.register {
            write!(f, "\"{}", register)?;
        }
        if let Some(count) = self.count {
            write!(f, "{}", count)?;
        }
        match &self.kind {
            OperationKind::Motion(motion) => write!(f, "{:?}", motion),
            OperationKind::Operator { operator, target } => {
                write!(f, "{} {:?}", operator.name(), target)
            }
            OperationKind::Action(action) => write!(f, "{:?}", action),
            OperationKind::CommandLine { prefix, text } => write!(f, "{}{}", prefix, text),
        }
    }
}
