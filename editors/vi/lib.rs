//! vi-engine: the vi command language as an embeddable evaluation engine.
//!
//! The engine owns no window and no terminal. A host hands it key events
//! one at a time; the engine parses them against the normal, visual,
//! insert and command-line grammars and, once a command is complete,
//! executes it against a [`TextSurface`] supplied by the host. Messages
//! and bells go to a [`Feedback`] sink and the `:`, `/` and `?` prompts
//! are drawn by a [`CommandLineWidget`].
//!
//! ```
//! use vi_engine::{Buffer, Engine, SurfaceExt};
//!
//! let mut engine = Engine::new(Buffer::from_text("one two three"), Default::default());
//! engine.feed("dw");
//! assert_eq!(engine.surface().text(), "two three");
//! ```

pub mod cmdline;
pub mod command;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod ex;
pub mod executor;
pub mod feedback;
pub mod grammar;
pub mod input;
pub mod marks;
pub mod options;
pub mod register;
pub mod registry;
pub mod repeat;
pub mod search;
pub mod surface;

pub use cmdline::{CommandLineWidget, EchoWidget};
pub use command::{Motion, MotionKind, Operator, TextObject};
pub use engine::{Engine, Outcome, MAX_MACRO_DEPTH};
pub use error::{EngineError, Result, SurfaceError};
pub use evaluator::{Evaluator, Mode, ResolvedOperation, Step, VisualKind};
pub use ex::{parse_ex_command, ExCommand, HostRequest};
pub use executor::{EngineState, Executor, InsertSession, Transition};
pub use feedback::{Feedback, Message, Silent, StatusLine};
pub use input::{format_keys, parse_keys, KeyEvent, Modifiers};
pub use marks::Marks;
pub use options::Options;
pub use register::{RegisterEntry, RegisterKind, RegisterStore, SharedRegisters};
pub use registry::EngineRegistry;
pub use repeat::{ChangeRecord, SelectionExtent};
pub use search::{SearchDirection, SearchState};
pub use surface::{Buffer, SurfaceExt, TextRange, TextSurface};
