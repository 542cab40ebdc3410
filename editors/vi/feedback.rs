//! User feedback.
//!
//! The engine reports errors and status messages through the [`Feedback`]
//! capability it is constructed with. Calls are synchronous and happen on
//! the event thread.

use std::cell::RefCell;
use std::rc::Rc;

/// Where messages for the user go.
pub trait Feedback {
    /// Show an error; `ring_bell` asks for an audible or visual bell too.
    fn report_error(&mut self, message: &str, ring_bell: bool);
    fn report_status(&mut self, message: &str);
    /// Remove a displayed error, e.g. when the next command succeeds.
    fn clear_error(&mut self);
}

/// A message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Error { text: String, bell: bool },
    Status(String),
}

/// Feedback that keeps every message, for headless hosts and tests.
#[derive(Debug, Default, Clone)]
pub struct StatusLine {
    messages: Vec<Message>,
    /// Error currently on display.
    error: Option<String>,
    bells: usize,
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a recorder that can be handed to an engine and still read.
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().filter_map(|m| match m {
            Message::Error { text, .. } => Some(text.as_str()),
            Message::Status(_) => None,
        })
    }

    pub fn last_status(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| match m {
            Message::Status(text) => Some(text.as_str()),
            Message::Error { .. } => None,
        })
    }

    pub fn current_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Number of times the bell was rung.
    pub fn bells(&self) -> usize {
        self.bells
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.error = None;
        self.bells = 0;
    }
}

impl Feedback for StatusLine {
    fn report_error(&mut self, message: &str, ring_bell: bool) {
        if ring_bell {
            self.bells += 1;
        }
        self.error = Some(message.to_string());
        self.messages.push(Message::Error {
            text: message.to_string(),
            bell: ring_bell,
        });
    }

    fn report_status(&mut self, message: &str) {
        self.messages.push(Message::Status(message.to_string()));
    }

    fn clear_error(&mut self) {
        self.error = None;
    }
}

impl<F: Feedback> Feedback for Rc<RefCell<F>> {
    fn report_error(&mut self, message: &str, ring_bell: bool) {
        self.borrow_mut().report_error(message, ring_bell);
    }

    fn report_status(&mut self, message: &str) {
        self.borrow_mut().report_status(message);
    }

    fn clear_error(&mut self) {
        self.borrow_mut().clear_error();
    }
}

/// Feedback that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Feedback for Silent {
    fn report_error(&mut self, _message: &str, _ring_bell: bool) {}
    fn report_status(&mut self, _message: &str) {}
    fn clear_error(&mut self) {}
}
