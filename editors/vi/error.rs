//! Error types for the evaluation engine.
//!
//! Every variant is recoverable: the engine reports it through
//! [`Feedback`](crate::feedback::Feedback) and keeps running.

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Failures raised by the text surface itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("buffer is read-only")]
    ReadOnly,
    #[error("range {start}..{end} outside buffer of {len} characters")]
    OutOfRange { start: usize, end: usize, len: usize },
}

/// All errors the engine can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// No grammar rule matched the keys typed so far.
    #[error("undefined key sequence: {0}")]
    UndefinedKeySequence(String),
    /// The committed command line could not be parsed.
    #[error("{0}")]
    InvalidCommandLine(String),
    /// A motion could not move at all (e.g. `fx` with no `x` on the line).
    #[error("motion out of bounds")]
    MotionOutOfBounds,
    /// The requested text object does not exist around the cursor.
    #[error("no {0} at cursor")]
    InvalidTextObjectAtCursor(String),
    #[error("invalid register name: \"{0}\"")]
    InvalidRegister(char),
    #[error("register \"{0} is empty")]
    EmptyRegister(char),
    #[error("pattern not found: {0}")]
    PatternNotFound(String),
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("no previous regular expression")]
    NoPreviousPattern,
    #[error("no previous substitute")]
    NoPreviousSubstitution,
    #[error("invalid range: {0}")]
    InvalidRange(String),
    #[error("unknown option: {0}")]
    InvalidOption(String),
    #[error("mark not set: '{0}")]
    MarkNotSet(char),
    #[error("invalid mark name: {0}")]
    InvalidMarkName(char),
    #[error("already at oldest change")]
    NothingToUndo,
    #[error("already at newest change")]
    NothingToRedo,
    #[error("no previous change to repeat")]
    NoPreviousChange,
    #[error("recursive macro limit reached")]
    MacroDepth,
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

impl EngineError {
    /// Whether the error should ring the bell as well as show a message.
    pub fn rings_bell(&self) -> bool {
        matches!(
            self,
            EngineError::UndefinedKeySequence(_)
                | EngineError::InvalidTextObjectAtCursor(_)
                | EngineError::InvalidRegister(_)
                | EngineError::EmptyRegister(_)
                | EngineError::MarkNotSet(_)
                | EngineError::InvalidMarkName(_)
                | EngineError::Surface(_)
        )
    }

    /// Errors that are handled by clamping and never shown to the user.
    pub fn is_silent(&self) -> bool {
        matches!(self, EngineError::MotionOutOfBounds)
    }
}

impl From<regex::Error> for EngineError {
    fn from(e: regex::Error) -> Self {
        EngineError::InvalidPattern(e.to_string())
    }
}
