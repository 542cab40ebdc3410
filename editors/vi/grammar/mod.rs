//! Per-mode key tables.
//!
//! Grammars are pure lookups from a key (in a context) to a [`Rule`]; the
//! evaluator owns every state transition.

pub mod cmdline;
pub mod insert;
pub mod normal;

use crate::command::{Motion, Operator, Scope};
use crate::evaluator::frame::{ArgumentKind, VisualKind};
use crate::evaluator::operation::{Action, Target};

/// Context a normal-style key is looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    Normal,
    Visual(VisualKind),
    OperatorPending(Operator),
}

impl Context {
    pub fn is_visual(&self) -> bool {
        matches!(self, Context::Visual(_))
    }
}

/// What a key means in normal, visual and operator-pending mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Motion(Motion),
    Operator(Operator),
    /// Shorthand for an operator with a fixed target (`x` is `dl`).
    Alias(Operator, Target),
    Action(Action),
    /// First key of a two-key command.
    Prefix(char),
    /// The key needs one literal character.
    Argument(ArgumentKind),
    /// `i`/`a` starting a text object.
    TextObject(Scope),
    /// `:`, `/` or `?`.
    CommandLine(char),
    /// `"`
    Register,
}
