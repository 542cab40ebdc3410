//! Command-line widget contract.
//!
//! The engine owns the text being edited on the `:`, `/` and `?` line; the
//! host only renders it. `commit` hands back the text to run, so widgets
//! that allow editing of their own (history, completion) can return their
//! version of the line.

/// Host widget showing the command line.
pub trait CommandLineWidget {
    /// Open the widget with its prefix character.
    fn show(&mut self, prefix: char);
    /// The text (without prefix) changed.
    fn update(&mut self, text: &str);
    /// Close the widget and return the text to execute.
    fn commit(&mut self) -> String;
    /// Close the widget without executing.
    fn cancel(&mut self);
}

/// Widget that just mirrors the engine's text.
#[derive(Debug, Default, Clone)]
pub struct EchoWidget {
    prefix: Option<char>,
    text: String,
}

impl EchoWidget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.prefix.is_some()
    }

    /// What a host would draw, e.g. `:5,10d`.
    pub fn display(&self) -> String {
        match self.prefix {
            Some(prefix) => format!("{}{}", prefix, self.text),
            None => String::new(),
        }
    }
}

impl CommandLineWidget for EchoWidget {
    fn show(&mut self, prefix: char) {
        self.prefix = Some(prefix);
        self.text.clear();
    }

    fn update(&mut self, text: &str) {
        self.text = text.to_string();
    }

    fn commit(&mut self) -> String {
        self.prefix = None;
        std::mem::take(&mut self.text)
    }

    fn cancel(&mut self) {
        self.prefix = None;
        self.text.clear();
    }
}
