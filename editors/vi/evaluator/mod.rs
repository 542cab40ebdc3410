//! Keystroke evaluator.
//!
//! The evaluator is a stack of [`Frame`]s. The bottom frame is the mode
//! root; transient frames above it (count, register, pending operator and
//! so on) refine the key sequence being typed. Each key is looked up in the
//! grammar for the current context and either pushes a frame, is absorbed
//! by the top frame, or resolves the sequence into a [`ResolvedOperation`].
//!
//! The evaluator never touches the buffer. Executing an operation and
//! switching the mode root afterwards is the engine's job.

pub mod frame;
pub mod operation;

pub use frame::{ArgumentKind, CommandLineState, Frame, Mode, VisualKind};
pub use operation::{Action, InsertAt, OperationKind, ResolvedOperation, Target};

use crate::command::{Motion, Operator, TextObject};
use crate::error::EngineError;
use crate::executor::InsertSession;
use crate::grammar::cmdline::{self, LineStatus};
use crate::grammar::insert::{self, InsertInput, InsertRule};
use crate::grammar::normal;
use crate::grammar::{Context, Rule};
use crate::input::{format_keys, KeyEvent};
use crate::register::RegisterStore;
use tracing::{debug, trace};

/// Largest count accepted; further digits are ignored.
const MAX_COUNT: usize = 99_999_999;

/// Result of feeding one key to the evaluator.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The key was absorbed into a partial sequence.
    Pending,
    Resolved(ResolvedOperation),
    /// Partial state was discarded.
    Cancelled,
    Error(EngineError),
    /// An insert-mode edit for the active insert session.
    Insert(InsertInput),
    /// The command line was opened or its text changed.
    CommandLine,
    /// The key means nothing to the engine; the host may use it.
    PassThrough,
}

#[derive(Debug, Clone)]
pub struct Evaluator {
    stack: Vec<Frame>,
    /// Keys of the sequence being typed, for error messages.
    typed: Vec<KeyEvent>,
    /// Whether a macro is being recorded (`q` then stops it).
    pub recording: bool,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            stack: vec![Frame::Normal],
            typed: Vec::new(),
            recording: false,
        }
    }

    /// All frames, root first.
    pub fn frames(&self) -> &[Frame] {
        &self.stack
    }

    pub fn root(&self) -> &Frame {
        &self.stack[0]
    }

    pub fn mode(&self) -> Mode {
        self.root().mode().unwrap_or_default()
    }

    /// Whether any transient frame is on the stack.
    pub fn is_pending(&self) -> bool {
        self.stack.len() > 1
    }

    /// Anchor and kind of the visual selection, when in visual mode.
    pub fn visual(&self) -> Option<(usize, VisualKind)> {
        match self.root() {
            Frame::Visual { anchor, kind } => Some((*anchor, *kind)),
            _ => None,
        }
    }

    pub fn command_line(&self) -> Option<&CommandLineState> {
        match self.root() {
            Frame::CommandLine(state) => Some(state),
            _ => None,
        }
    }

    pub fn insert_session(&self) -> Option<&InsertSession> {
        match self.root() {
            Frame::Insert(session) => Some(session.as_ref()),
            _ => None,
        }
    }

    pub fn insert_session_mut(&mut self) -> Option<&mut InsertSession> {
        match &mut self.stack[0] {
            Frame::Insert(session) => Some(session.as_mut()),
            _ => None,
        }
    }

    /// Replace the mode root and drop every transient frame.
    pub fn set_root(&mut self, root: Frame) {
        debug_assert!(root.is_root());
        debug!(from = %self.mode(), to = ?root.mode(), "switch mode root");
        self.stack.clear();
        self.stack.push(root);
        self.typed.clear();
    }

    /// Pop every transient frame, keeping the root.
    pub fn reset_transient(&mut self) {
        self.stack.truncate(1);
        self.typed.clear();
    }

    /// Put an operator back on the stack after its target failed, so the
    /// user can retry with another motion or object.
    pub fn restore_operator(&mut self, op: Operator, count: Option<usize>, register: Option<char>) {
        self.reset_transient();
        if let Some(name) = register {
            self.push(Frame::Register(Some(name)));
        }
        if let Some(n) = count {
            self.push(Frame::Count(n));
        }
        self.push(Frame::OperatorPending(op));
    }

    fn top(&self) -> &Frame {
        self.stack.last().unwrap_or(&Frame::Normal)
    }

    fn push(&mut self, frame: Frame) {
        trace!(?frame, "push frame");
        self.stack.push(frame);
    }

    fn pop(&mut self) -> Option<Frame> {
        if self.stack.len() > 1 {
            let frame = self.stack.pop();
            trace!(?frame, "pop frame");
            frame
        } else {
            None
        }
    }

    /// Operator waiting for its target. A count or register typed after
    /// the operator (`d3w`, `c2w`) sits above it on the stack.
    fn pending_operator(&self) -> Option<Operator> {
        for frame in self.stack[1..].iter().rev() {
            match frame {
                Frame::OperatorPending(op) => return Some(*op),
                Frame::Count(_) | Frame::Register(Some(_)) => continue,
                _ => return None,
            }
        }
        None
    }

    fn context(&self) -> Context {
        if let Some(op) = self.pending_operator() {
            return Context::OperatorPending(op);
        }
        match self.root() {
            Frame::Visual { kind, .. } => Context::Visual(*kind),
            _ => Context::Normal,
        }
    }

    /// Feed one key.
    pub fn step(&mut self, key: KeyEvent) -> Step {
        debug!(key = %key, mode = %self.mode(), depth = self.stack.len(), "evaluate key");
        if key.modifiers.command {
            return Step::PassThrough;
        }
        self.typed.push(key);

        let step = match self.root() {
            Frame::Insert(_) => self.step_insert(key),
            Frame::CommandLine(_) => self.step_command_line(key),
            _ => self.step_normal(key),
        };
        if !matches!(step, Step::Pending) {
            self.typed.clear();
        }
        step
    }

    fn step_insert(&mut self, key: KeyEvent) -> Step {
        if let Frame::Argument(ArgumentKind::InsertRegister) = self.top() {
            self.pop();
            return match key.printable() {
                Some(name) if !key.is_escape() => Step::Insert(InsertInput::Register(name)),
                _ => Step::Cancelled,
            };
        }
        match insert::lookup(&key) {
            InsertRule::Input(input) => Step::Insert(input),
            InsertRule::Argument(kind) => {
                self.push(Frame::Argument(kind));
                Step::Pending
            }
            InsertRule::PassThrough => Step::PassThrough,
        }
    }

    fn step_command_line(&mut self, key: KeyEvent) -> Step {
        let Some(edit) = cmdline::lookup(&key) else {
            return Step::Pending;
        };
        let Frame::CommandLine(state) = &mut self.stack[0] else {
            return Step::Pending;
        };
        match state.apply(edit) {
            LineStatus::Editing => Step::CommandLine,
            LineStatus::Cancelled => {
                let visual = state.visual;
                self.leave_command_line(visual);
                Step::Cancelled
            }
            LineStatus::Committed => {
                let prefix = state.prefix;
                let text = std::mem::take(&mut state.text);
                let visual = state.visual;
                self.leave_command_line(visual);
                let op = ResolvedOperation::new(OperationKind::CommandLine { prefix, text }, None, None);
                debug!(operation = %op, "resolved");
                Step::Resolved(op)
            }
        }
    }

    fn leave_command_line(&mut self, visual: Option<(usize, VisualKind)>) {
        let root = match visual {
            Some((anchor, kind)) => Frame::Visual { anchor, kind },
            None => Frame::Normal,
        };
        self.set_root(root);
    }

    fn step_normal(&mut self, key: KeyEvent) -> Step {
        if key.is_escape() {
            return self.escape();
        }
        match self.top().clone() {
            Frame::Register(None) => self.name_register(key),
            Frame::Argument(kind) => {
                self.pop();
                self.argument(kind, key)
            }
            Frame::Prefix(prefix) => {
                self.pop();
                match normal::lookup_prefix(prefix, &key, self.context()) {
                    Some(rule) => self.apply(rule),
                    None => self.undefined(),
                }
            }
            Frame::TextObjectPending { operator, scope } => {
                self.pop();
                match key.printable().and_then(TextObject::from_key) {
                    Some(object) => {
                        let kind = match operator {
                            Some(op) => OperationKind::Operator {
                                operator: op,
                                target: Target::TextObject(object, scope),
                            },
                            None => OperationKind::Action(Action::SelectObject(object, scope)),
                        };
                        self.resolve(kind)
                    }
                    None => {
                        debug!(key = %key, "unknown text object");
                        Step::Cancelled
                    }
                }
            }
            top => {
                let doubled = self.pending_operator().filter(|op| key.printable() == Some(op.line_key()));
                if let Some(operator) = doubled {
                    return self.resolve(OperationKind::Operator {
                        operator,
                        target: Target::Line,
                    });
                }
                if let Some(digit) = key.digit() {
                    if let Frame::Count(n) = top {
                        let n = n.saturating_mul(10).saturating_add(digit as usize).min(MAX_COUNT);
                        if let Some(frame) = self.stack.last_mut() {
                            *frame = Frame::Count(n);
                        }
                        return Step::Pending;
                    }
                    if digit != 0 {
                        self.push(Frame::Count(digit as usize));
                        return Step::Pending;
                    }
                }
                match normal::lookup(&key, self.context(), self.recording) {
                    Some(rule) => self.apply(rule),
                    None => self.undefined(),
                }
            }
        }
    }

    fn escape(&mut self) -> Step {
        if self.is_pending() {
            self.reset_transient();
        } else if let Frame::Visual { .. } = self.root() {
            self.set_root(Frame::Normal);
        }
        Step::Cancelled
    }

    fn name_register(&mut self, key: KeyEvent) -> Step {
        match key.printable() {
            Some(name) if RegisterStore::is_readable(name) => {
                if let Some(frame) = self.stack.last_mut() {
                    *frame = Frame::Register(Some(name));
                }
                Step::Pending
            }
            other => {
                self.reset_transient();
                Step::Error(EngineError::InvalidRegister(other.unwrap_or(key.code)))
            }
        }
    }

    fn argument(&mut self, kind: ArgumentKind, key: KeyEvent) -> Step {
        let Some(c) = key.printable() else {
            self.reset_transient();
            return Step::Cancelled;
        };
        let rule = match kind {
            ArgumentKind::Find(kind) => Rule::Motion(Motion::Find { kind, ch: c }),
            ArgumentKind::GotoMark { linewise } => Rule::Motion(Motion::Mark { name: c, linewise }),
            ArgumentKind::Replace => Rule::Action(Action::ReplaceChar(c)),
            ArgumentKind::SetMark => Rule::Action(Action::SetMark(c)),
            ArgumentKind::Record => Rule::Action(Action::StartRecording(c)),
            ArgumentKind::Play => Rule::Action(Action::PlayMacro(c)),
            ArgumentKind::InsertRegister => return Step::Insert(InsertInput::Register(c)),
        };
        self.apply(rule)
    }

    fn apply(&mut self, rule: Rule) -> Step {
        let pending = self.pending_operator();
        match rule {
            Rule::Motion(motion) => match pending {
                Some(operator) => self.resolve(OperationKind::Operator {
                    operator,
                    target: Target::Motion(motion),
                }),
                None => self.resolve(OperationKind::Motion(motion)),
            },
            Rule::Operator(op) => match pending {
                Some(operator) if operator == op => {
                    self.resolve(OperationKind::Operator {
                        operator,
                        target: Target::Line,
                    })
                }
                Some(_) => self.undefined(),
                None => {
                    self.push(Frame::OperatorPending(op));
                    Step::Pending
                }
            },
            Rule::Alias(operator, target) if pending.is_none() => {
                self.resolve(OperationKind::Operator { operator, target })
            }
            Rule::Action(action) if pending.is_none() => self.resolve(OperationKind::Action(action)),
            Rule::Alias(..) | Rule::Action(_) => self.undefined(),
            Rule::Prefix(c) => {
                self.push(Frame::Prefix(c));
                Step::Pending
            }
            Rule::Argument(kind) => {
                self.push(Frame::Argument(kind));
                Step::Pending
            }
            Rule::TextObject(scope) => {
                self.push(Frame::TextObjectPending {
                    operator: pending,
                    scope,
                });
                Step::Pending
            }
            Rule::Register => {
                self.push(Frame::Register(None));
                Step::Pending
            }
            Rule::CommandLine(prefix) => self.open_command_line(prefix),
        }
    }

    fn open_command_line(&mut self, prefix: char) -> Step {
        let count = self.count();
        let visual = self.visual();
        let mut state = match (prefix, visual, count) {
            (':', Some(_), _) => CommandLineState::new(prefix, "'<,'>"),
            (':', None, Some(n)) if n > 1 => CommandLineState::new(prefix, &format!(".,.+{}", n - 1)),
            (':', None, Some(_)) => CommandLineState::new(prefix, "."),
            _ => CommandLineState::new(prefix, ""),
        };
        if prefix != ':' {
            state.visual = visual;
        }
        self.set_root(Frame::CommandLine(state));
        Step::CommandLine
    }

    fn count(&self) -> Option<usize> {
        self.stack
            .iter()
            .filter_map(|frame| match frame {
                Frame::Count(n) => Some(*n),
                _ => None,
            })
            .reduce(|a, b| a.saturating_mul(b).min(MAX_COUNT))
    }

    fn register(&self) -> Option<char> {
        self.stack.iter().rev().find_map(|frame| match frame {
            Frame::Register(name) => *name,
            _ => None,
        })
    }

    fn resolve(&mut self, kind: OperationKind) -> Step {
        let op = ResolvedOperation::new(kind, self.count(), self.register());
        debug!(operation = %op, "resolved");
        self.reset_transient();
        Step::Resolved(op)
    }

    fn undefined(&mut self) -> Step {
        let keys = format_keys(&self.typed);
        debug!(keys = %keys, "undefined key sequence");
        self.reset_transient();
        Step::Error(EngineError::UndefinedKeySequence(keys))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{FindKind, Scope};
    use crate::input::parse_keys;

    fn feed(ev: &mut Evaluator, script: &str) -> Vec<Step> {
        parse_keys(script).into_iter().map(|k| ev.step(k)).collect()
    }

    fn last(ev: &mut Evaluator, script: &str) -> Step {
        feed(ev, script).pop().unwrap()
    }

    fn resolved(step: Step) -> ResolvedOperation {
        match step {
            Step::Resolved(op) => op,
            other => panic!("expected a resolved operation, got {:?}", other),
        }
    }

    #[test]
    fn test_count_operator_motion() {
        let mut ev = Evaluator::new();
        let steps = feed(&mut ev, "3dw");
        assert_eq!(steps[0], Step::Pending);
        assert_eq!(steps[1], Step::Pending);
        let op = resolved(steps[2].clone());
        assert_eq!(op.count, Some(3));
        assert_eq!(op.operator(), Some(Operator::Delete));
        assert_eq!(op.motion(), Some(&Motion::WordForward { big: false }));
        assert!(!ev.is_pending());
    }

    #[test]
    fn test_counts_multiply() {
        let mut ev = Evaluator::new();
        let op = resolved(last(&mut ev, "2d3w"));
        assert_eq!(op.count, Some(6));
        assert_eq!(op.operator(), Some(Operator::Delete));
        assert_eq!(op.motion(), Some(&Motion::WordForward { big: false }));
        let op = resolved(last(&mut ev, "10j"));
        assert_eq!(op.count, Some(10));
        assert_eq!(op.operator(), None);
    }

    #[test]
    fn test_count_after_operator() {
        let mut ev = Evaluator::new();
        let steps = feed(&mut ev, "d3w");
        assert_eq!(steps[..2], [Step::Pending, Step::Pending]);
        let op = resolved(steps[2].clone());
        assert_eq!(op.operator(), Some(Operator::Delete));
        assert_eq!(op.count, Some(3));
        assert!(!ev.is_pending());

        let op = resolved(last(&mut ev, "c2w"));
        assert_eq!(op.operator(), Some(Operator::Change));
        assert_eq!(op.count, Some(2));

        let op = resolved(last(&mut ev, "y5j"));
        assert_eq!(op.operator(), Some(Operator::Yank));
        assert_eq!(op.motion(), Some(&Motion::Down));
        assert_eq!(op.count, Some(5));
    }

    #[test]
    fn test_count_after_operator_with_prefix_and_object() {
        let mut ev = Evaluator::new();
        let op = resolved(last(&mut ev, "d2gg"));
        assert_eq!(op.operator(), Some(Operator::Delete));
        assert_eq!(op.motion(), Some(&Motion::FirstLine));
        assert_eq!(op.count, Some(2));

        let op = resolved(last(&mut ev, "d2aw"));
        assert_eq!(op.operator(), Some(Operator::Delete));
        assert_eq!(op.text_object(), Some((TextObject::Word { big: false }, Scope::Around)));
        assert_eq!(op.count, Some(2));

        let op = resolved(last(&mut ev, "d12fx"));
        assert_eq!(op.count, Some(12));
        assert_eq!(op.operator(), Some(Operator::Delete));

        let op = resolved(last(&mut ev, "d3d"));
        assert_eq!(
            op.kind,
            OperationKind::Operator {
                operator: Operator::Delete,
                target: Target::Line
            }
        );
        assert_eq!(op.count, Some(3));
    }

    #[test]
    fn test_zero_is_a_motion_without_count() {
        let mut ev = Evaluator::new();
        let op = resolved(last(&mut ev, "0"));
        assert_eq!(op.motion(), Some(&Motion::LineStart));
        assert_eq!(op.count, None);
    }

    #[test]
    fn test_register_prefix() {
        let mut ev = Evaluator::new();
        let op = resolved(last(&mut ev, "\"ayy"));
        assert_eq!(op.register, Some('a'));
        assert_eq!(
            op.kind,
            OperationKind::Operator {
                operator: Operator::Yank,
                target: Target::Line
            }
        );
        let op = resolved(last(&mut ev, "\"1p"));
        assert_eq!(op.register, Some('1'));
        assert_eq!(op.count, None);
    }

    #[test]
    fn test_invalid_register() {
        let mut ev = Evaluator::new();
        assert_eq!(last(&mut ev, "\"!"), Step::Error(EngineError::InvalidRegister('!')));
        assert!(!ev.is_pending());
    }

    #[test]
    fn test_doubled_g_operator() {
        let mut ev = Evaluator::new();
        let op = resolved(last(&mut ev, "gUgU"));
        assert_eq!(op.operator(), Some(Operator::Uppercase));
        let op = resolved(last(&mut ev, "g~~"));
        assert_eq!(
            op.kind,
            OperationKind::Operator {
                operator: Operator::ToggleCase,
                target: Target::Line
            }
        );
    }

    #[test]
    fn test_mismatched_operators_are_undefined() {
        let mut ev = Evaluator::new();
        assert!(matches!(
            last(&mut ev, "dy"),
            Step::Error(EngineError::UndefinedKeySequence(keys)) if keys == "dy"
        ));
        assert!(!ev.is_pending());
    }

    #[test]
    fn test_find_argument() {
        let mut ev = Evaluator::new();
        let op = resolved(last(&mut ev, "dtx"));
        assert_eq!(
            op.motion(),
            Some(&Motion::Find {
                kind: FindKind::TillForward,
                ch: 'x'
            })
        );
    }

    #[test]
    fn test_text_object() {
        let mut ev = Evaluator::new();
        let op = resolved(last(&mut ev, "ciw"));
        assert_eq!(op.operator(), Some(Operator::Change));
        assert_eq!(op.text_object(), Some((TextObject::Word { big: false }, Scope::Inner)));
    }

    #[test]
    fn test_unknown_text_object_keeps_operator() {
        let mut ev = Evaluator::new();
        assert_eq!(last(&mut ev, "diz"), Step::Cancelled);
        assert!(matches!(ev.frames().last(), Some(Frame::OperatorPending(Operator::Delete))));
        let op = resolved(last(&mut ev, "w"));
        assert_eq!(op.operator(), Some(Operator::Delete));
    }

    #[test]
    fn test_escape_clears_everything() {
        let mut ev = Evaluator::new();
        feed(&mut ev, "\"a3d");
        assert!(ev.is_pending());
        assert_eq!(ev.step(KeyEvent::escape()), Step::Cancelled);
        assert!(!ev.is_pending());
        assert_eq!(ev.mode(), Mode::Normal);
    }

    #[test]
    fn test_undefined_clears_pending() {
        let mut ev = Evaluator::new();
        assert!(matches!(last(&mut ev, "3gz"), Step::Error(_)));
        assert!(!ev.is_pending());
        let op = resolved(last(&mut ev, "j"));
        assert_eq!(op.count, None);
    }

    #[test]
    fn test_visual_context() {
        let mut ev = Evaluator::new();
        ev.set_root(Frame::Visual {
            anchor: 0,
            kind: VisualKind::Char,
        });
        let op = resolved(last(&mut ev, "d"));
        assert_eq!(
            op.kind,
            OperationKind::Operator {
                operator: Operator::Delete,
                target: Target::Visual
            }
        );
        let op = resolved(last(&mut ev, "iw"));
        assert_eq!(
            op.kind,
            OperationKind::Action(Action::SelectObject(TextObject::Word { big: false }, Scope::Inner))
        );
        assert_eq!(ev.step(KeyEvent::escape()), Step::Cancelled);
        assert_eq!(ev.mode(), Mode::Normal);
    }

    #[test]
    fn test_command_line_commit() {
        let mut ev = Evaluator::new();
        assert_eq!(last(&mut ev, ":"), Step::CommandLine);
        assert_eq!(ev.mode(), Mode::CommandLine);
        let op = resolved(last(&mut ev, "5,10d<CR>"));
        assert_eq!(
            op.kind,
            OperationKind::CommandLine {
                prefix: ':',
                text: "5,10d".to_string()
            }
        );
        assert_eq!(ev.mode(), Mode::Normal);
    }

    #[test]
    fn test_command_line_cancel() {
        let mut ev = Evaluator::new();
        assert_eq!(last(&mut ev, "/ab<BS><BS><BS>"), Step::Cancelled);
        assert_eq!(ev.mode(), Mode::Normal);
        feed(&mut ev, ":x");
        assert_eq!(ev.step(KeyEvent::escape()), Step::Cancelled);
        assert_eq!(ev.mode(), Mode::Normal);
    }

    #[test]
    fn test_command_line_from_visual_and_count() {
        let mut ev = Evaluator::new();
        ev.set_root(Frame::Visual {
            anchor: 3,
            kind: VisualKind::Line,
        });
        ev.step(KeyEvent::plain(':'));
        assert_eq!(ev.command_line().map(|c| c.text.as_str()), Some("'<,'>"));

        let mut ev = Evaluator::new();
        feed(&mut ev, "3:");
        assert_eq!(ev.command_line().map(|c| c.text.as_str()), Some(".,.+2"));
    }

    #[test]
    fn test_search_from_visual_returns_to_visual() {
        let mut ev = Evaluator::new();
        ev.set_root(Frame::Visual {
            anchor: 3,
            kind: VisualKind::Char,
        });
        let op = resolved(last(&mut ev, "/x<CR>"));
        assert_eq!(op.kind, OperationKind::CommandLine { prefix: '/', text: "x".to_string() });
        assert_eq!(ev.visual(), Some((3, VisualKind::Char)));
    }

    #[test]
    fn test_restore_operator() {
        let mut ev = Evaluator::new();
        ev.restore_operator(Operator::Delete, Some(2), Some('a'));
        let op = resolved(last(&mut ev, "w"));
        assert_eq!(op.count, Some(2));
        assert_eq!(op.register, Some('a'));
        assert_eq!(op.operator(), Some(Operator::Delete));
    }

    #[test]
    fn test_command_modifier_passes_through() {
        let mut ev = Evaluator::new();
        let key = KeyEvent::new('s', crate::input::Modifiers::COMMAND);
        assert_eq!(ev.step(key), Step::PassThrough);
    }

    #[test]
    fn test_recording_toggles_q() {
        let mut ev = Evaluator::new();
        let op = resolved(last(&mut ev, "qa"));
        assert_eq!(op.kind, OperationKind::Action(Action::StartRecording('a')));
        ev.recording = true;
        let op = resolved(last(&mut ev, "q"));
        assert_eq!(op.kind, OperationKind::Action(Action::StopRecording));
    }
}
