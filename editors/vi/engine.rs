//! One engine per editor area.
//!
//! The engine owns the evaluator and the per-area state, borrows the shared
//! register store for each operation, and drives the host's surface,
//! command-line widget and feedback. Keys go through the evaluator;
//! resolved operations go to the executor, and the [`Transition`] it
//! returns selects the next mode root. Errors are reported to the user and
//! never leave the engine.

use crate::cmdline::{CommandLineWidget, EchoWidget};
use crate::error::EngineError;
use crate::evaluator::{Evaluator, Frame, Mode, OperationKind, ResolvedOperation, Step, VisualKind};
use crate::ex::HostRequest;
use crate::executor::{EngineState, Executor, Transition};
use crate::feedback::{Feedback, Silent};
use crate::grammar::insert::InsertInput;
use crate::input::{format_keys, parse_keys, KeyEvent};
use crate::marks::{Marks, VISUAL_END, VISUAL_START};
use crate::options::Options;
use crate::register::SharedRegisters;
use crate::surface::{SurfaceExt, TextSurface};
use tracing::{debug, trace};

/// Nesting limit for macros that play macros.
pub const MAX_MACRO_DEPTH: usize = 50;

/// What became of one key.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Absorbed into a partial sequence, an insert or a command-line edit.
    Consumed,
    CompletedOperation(ResolvedOperation),
    /// The pending sequence was dropped or the operation failed.
    Cancelled,
    /// Not for the engine; the host may handle it.
    PassThrough,
}

pub struct Engine<S: TextSurface> {
    surface: S,
    registers: SharedRegisters,
    options: Options,
    state: EngineState,
    evaluator: Evaluator,
    feedback: Box<dyn Feedback>,
    widget: Box<dyn CommandLineWidget>,
    macro_depth: usize,
    /// An error was reported since the flag was last cleared.
    failed: bool,
    /// Where the mouse went down, while the button is held.
    mouse_anchor: Option<usize>,
}

impl<S: TextSurface> Engine<S> {
    pub fn new(surface: S, registers: SharedRegisters) -> Self {
        Self {
            surface,
            registers,
            options: Options::default(),
            state: EngineState::default(),
            evaluator: Evaluator::new(),
            feedback: Box::new(Silent),
            widget: Box::new(EchoWidget::new()),
            macro_depth: 0,
            failed: false,
            mouse_anchor: None,
        }
    }

    pub fn with_feedback(mut self, feedback: impl Feedback + 'static) -> Self {
        self.feedback = Box::new(feedback);
        self
    }

    pub fn with_widget(mut self, widget: impl CommandLineWidget + 'static) -> Self {
        self.widget = Box::new(widget);
        self
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn mode(&self) -> Mode {
        self.evaluator.mode()
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn registers(&self) -> &SharedRegisters {
        &self.registers
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    pub fn marks(&self) -> &Marks {
        &self.state.marks
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Register being recorded into, if any.
    pub fn recording(&self) -> Option<char> {
        self.state.recording.as_ref().map(|r| r.register)
    }

    /// Write and quit requests since the last call.
    pub fn take_requests(&mut self) -> Vec<HostRequest> {
        std::mem::take(&mut self.state.requests)
    }

    /// Host entry point: whether the engine used the key.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> bool {
        self.handle_key(key) != Outcome::PassThrough
    }

    /// Feed keys written in key notation, e.g. `3dw` or `:5,10d<CR>`.
    pub fn feed(&mut self, keys: &str) -> Vec<Outcome> {
        parse_keys(keys).into_iter().map(|key| self.handle_key(key)).collect()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Outcome {
        trace!(key = %format_keys(&[key]), mode = %self.mode(), "key");
        self.remember_visual();
        if self.macro_depth == 0 {
            if let Some(recording) = self.state.recording.as_mut() {
                recording.keys.push(key);
            }
        }

        let was_command_line = self.mode() == Mode::CommandLine;
        match self.evaluator.step(key) {
            Step::Pending => Outcome::Consumed,
            Step::PassThrough => Outcome::PassThrough,
            Step::Cancelled => {
                if was_command_line {
                    self.widget.cancel();
                }
                Outcome::Cancelled
            }
            Step::Error(error) => {
                self.report(&error);
                Outcome::Cancelled
            }
            Step::CommandLine => {
                if let Some(line) = self.evaluator.command_line() {
                    if !was_command_line {
                        self.widget.show(line.prefix);
                    }
                    self.widget.update(&line.text);
                }
                Outcome::Consumed
            }
            Step::Insert(input) => self.insert(input),
            Step::Resolved(op) => self.complete(op, was_command_line),
        }
    }

    /// `'<` and `'>` follow the selection while visual mode is active.
    fn remember_visual(&mut self) {
        if let Some((anchor, _)) = self.evaluator.visual() {
            let cursor = self.surface.cursor();
            self.state.marks.set_internal(VISUAL_START, anchor.min(cursor));
            self.state.marks.set_internal(VISUAL_END, anchor.max(cursor));
        }
    }

    fn complete(&mut self, op: ResolvedOperation, was_command_line: bool) -> Outcome {
        let prefix = match &op.kind {
            OperationKind::CommandLine { prefix, .. } if was_command_line => Some(*prefix),
            _ => None,
        };
        // the widget has the final say over the committed text
        let op = match prefix {
            Some(prefix) => {
                let text = self.widget.commit();
                ResolvedOperation::new(OperationKind::CommandLine { prefix, text }, op.count, op.register)
            }
            None => op,
        };
        debug!(%op, "completed operation");
        self.feedback.clear_error();

        let result = {
            let mut registers = self.registers.borrow_mut();
            let mut executor = Executor {
                surface: &mut self.surface,
                registers: &mut registers,
                state: &mut self.state,
                options: &mut self.options,
                feedback: &mut *self.feedback,
                visual: self.evaluator.visual(),
            };
            executor.execute(&op)
        };

        match result {
            Ok(transition) => {
                self.apply(transition);
                Outcome::CompletedOperation(op)
            }
            Err(error) => {
                if let (EngineError::InvalidTextObjectAtCursor(_), Some(operator)) = (&error, op.operator()) {
                    self.evaluator.restore_operator(operator, op.count, op.register);
                }
                self.report(&error);
                self.settle();
                if error.is_silent() {
                    Outcome::CompletedOperation(op)
                } else {
                    Outcome::Cancelled
                }
            }
        }
    }

    fn insert(&mut self, input: InsertInput) -> Outcome {
        let Self {
            surface,
            registers,
            options,
            state,
            evaluator,
            feedback,
            ..
        } = self;
        let mut registers = registers.borrow_mut();
        let exit = input == InsertInput::Exit;
        let session = if exit {
            let session = evaluator.insert_session().cloned();
            evaluator.set_root(Frame::Normal);
            session
        } else {
            None
        };
        let mut executor = Executor {
            surface,
            registers: &mut registers,
            state,
            options,
            feedback: &mut **feedback,
            visual: None,
        };
        let result = match (session, evaluator.insert_session_mut()) {
            (Some(session), _) => executor.finish_insert(session),
            (None, Some(session)) => executor.insert_input(session, input),
            (None, None) => Ok(()),
        };
        drop(registers);
        match result {
            Ok(()) => Outcome::Consumed,
            Err(error) => {
                self.report(&error);
                Outcome::Cancelled
            }
        }
    }

    fn apply(&mut self, transition: Transition) {
        match transition {
            Transition::Stay => {}
            Transition::Normal => self.evaluator.set_root(Frame::Normal),
            Transition::Insert(session) => self.evaluator.set_root(Frame::Insert(Box::new(session))),
            Transition::Visual { anchor, kind } => self.evaluator.set_root(Frame::Visual { anchor, kind }),
            Transition::Play { keys, count } => self.play(keys, count),
        }
        self.settle();
    }

    /// Keep the cursor on a character outside insert mode and tell the
    /// evaluator whether `q` stops a recording.
    fn settle(&mut self) {
        self.evaluator.recording = self.state.recording.is_some();
        if matches!(self.mode(), Mode::Normal | Mode::Visual(_)) {
            let cursor = self.surface.cursor();
            let clamped = self.surface.clamp_normal(cursor);
            if clamped != cursor {
                self.surface.set_cursor(clamped);
            }
        }
    }

    /// Run a macro; the first failing key aborts it and every macro that
    /// played it.
    fn play(&mut self, keys: Vec<KeyEvent>, count: usize) {
        if self.macro_depth >= MAX_MACRO_DEPTH {
            self.report(&EngineError::MacroDepth);
            return;
        }
        self.macro_depth += 1;
        debug!(keys = %format_keys(&keys), count, depth = self.macro_depth, "play macro");
        'repeat: for _ in 0..count {
            for key in &keys {
                self.failed = false;
                self.handle_key(*key);
                if self.failed {
                    break 'repeat;
                }
            }
        }
        self.macro_depth -= 1;
    }

    fn report(&mut self, error: &EngineError) {
        self.failed = true;
        debug!(%error, "operation failed");
        if error.is_silent() {
            return;
        }
        let bell = error.rings_bell() && self.options.errorbells;
        self.feedback.report_error(&error.to_string(), bell);
    }

    /// Mouse button pressed at `offset`: move the cursor there, dropping
    /// any pending keys and visual selection.
    pub fn handle_mouse_down(&mut self, offset: usize) {
        let offset = offset.min(self.surface.len_chars());
        self.evaluator.reset_transient();
        self.mouse_anchor = Some(offset);
        self.state.curswant = None;
        match self.mode() {
            Mode::Insert | Mode::Replace => {
                let Self {
                    surface,
                    registers,
                    options,
                    state,
                    evaluator,
                    feedback,
                    ..
                } = self;
                if let Some(session) = evaluator.insert_session_mut() {
                    let mut registers = registers.borrow_mut();
                    let mut executor = Executor {
                        surface,
                        registers: &mut registers,
                        state,
                        options,
                        feedback: &mut **feedback,
                        visual: None,
                    };
                    executor.relocate_insert(session, offset);
                }
            }
            Mode::CommandLine => {
                self.widget.cancel();
                self.evaluator.set_root(Frame::Normal);
                self.surface.set_cursor(offset);
            }
            Mode::Visual(_) => {
                self.evaluator.set_root(Frame::Normal);
                self.surface.set_cursor(offset);
            }
            Mode::Normal => self.surface.set_cursor(offset),
        }
        self.settle();
    }

    /// Dragging from the press point selects characters.
    pub fn handle_mouse_dragged(&mut self, offset: usize) {
        let Some(anchor) = self.mouse_anchor else {
            return;
        };
        let offset = self.surface.clamp_normal(offset.min(self.surface.len_chars()));
        match self.mode() {
            Mode::Normal if offset != self.surface.clamp_normal(anchor) => {
                let anchor = self.surface.clamp_normal(anchor);
                self.evaluator.set_root(Frame::Visual {
                    anchor,
                    kind: VisualKind::Char,
                });
                self.surface.set_cursor(offset);
            }
            Mode::Visual(_) => self.surface.set_cursor(offset),
            _ => {}
        }
    }

    pub fn handle_mouse_up(&mut self, offset: usize) {
        self.handle_mouse_dragged(offset);
        self.mouse_anchor = None;
    }
}
