//! Engine options.
//!
//! The subset of vi options that changes how commands behave, set with
//! `:set` or seeded by the host through
//! [`Engine::with_options`](crate::engine::Engine::with_options).

use crate::error::{EngineError, Result};

/// Editor options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Spaces for `>`/`<` shifts (shiftwidth/sw).
    pub shiftwidth: usize,
    /// Width of a tab character (tabstop/ts).
    pub tabstop: usize,
    /// Insert spaces instead of tabs (expandtab/et).
    pub expandtab: bool,
    /// Case insensitive search (ignorecase/ic).
    pub ignorecase: bool,
    /// Case sensitive again when the pattern has uppercase (smartcase/scs).
    pub smartcase: bool,
    /// Wrap search at end of file (wrapscan/ws).
    pub wrapscan: bool,
    /// Round shifts to a multiple of shiftwidth (shiftround/sr).
    pub shiftround: bool,
    /// Ring the bell on errors (errorbells/eb).
    pub errorbells: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            shiftwidth: 8,
            tabstop: 8,
            expandtab: false,
            ignorecase: false,
            smartcase: false,
            wrapscan: true,
            shiftround: false,
            errorbells: true,
        }
    }
}

const BOOLEANS: &[(&str, &str)] = &[
    ("errorbells", "eb"),
    ("expandtab", "et"),
    ("ignorecase", "ic"),
    ("shiftround", "sr"),
    ("smartcase", "scs"),
    ("wrapscan", "ws"),
];

const NUMBERS: &[(&str, &str)] = &[("shiftwidth", "sw"), ("tabstop", "ts")];

impl Options {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply every whitespace-separated argument of a `:set` line.
    ///
    /// Returns the text to show for queries, if any.
    pub fn set_line(&mut self, line: &str) -> Result<Option<String>> {
        if line.trim().is_empty() {
            return Ok(Some(self.show_changed()));
        }
        let mut shown = Vec::new();
        for arg in line.split_whitespace() {
            if let Some(text) = self.set(arg)? {
                shown.push(text);
            }
        }
        Ok((!shown.is_empty()).then(|| shown.join("  ")))
    }

    /// Parse and apply a single `:set` argument.
    pub fn set(&mut self, arg: &str) -> Result<Option<String>> {
        let arg = arg.trim();

        if arg == "all" {
            return Ok(Some(self.show_all()));
        }

        if let Some(name) = arg.strip_suffix('?') {
            return self.query(name).map(Some);
        }

        if let Some((name, value)) = arg.split_once('=') {
            return self.set_value(name, value).map(|_| None);
        }

        if let Some(name) = arg.strip_suffix('!').or_else(|| arg.strip_prefix("inv")) {
            let current = self.get_bool(name)?;
            return self.set_bool(name, !current).map(|_| None);
        }

        if let Some(name) = arg.strip_prefix("no") {
            if self.get_bool(name).is_ok() {
                return self.set_bool(name, false).map(|_| None);
            }
        }

        // A bare numeric option name shows its value, as in vi.
        if canonical(arg, NUMBERS).is_some() {
            return self.query(arg).map(Some);
        }

        self.set_bool(arg, true).map(|_| None)
    }

    fn bool_slot(&mut self, name: &str) -> Result<&mut bool> {
        let slot = match canonical(name, BOOLEANS) {
            Some("errorbells") => &mut self.errorbells,
            Some("expandtab") => &mut self.expandtab,
            Some("ignorecase") => &mut self.ignorecase,
            Some("shiftround") => &mut self.shiftround,
            Some("smartcase") => &mut self.smartcase,
            Some("wrapscan") => &mut self.wrapscan,
            _ => return Err(EngineError::InvalidOption(name.to_string())),
        };
        Ok(slot)
    }

    fn get_bool(&self, name: &str) -> Result<bool> {
        let value = match canonical(name, BOOLEANS) {
            Some("errorbells") => self.errorbells,
            Some("expandtab") => self.expandtab,
            Some("ignorecase") => self.ignorecase,
            Some("shiftround") => self.shiftround,
            Some("smartcase") => self.smartcase,
            Some("wrapscan") => self.wrapscan,
            _ => return Err(EngineError::InvalidOption(name.to_string())),
        };
        Ok(value)
    }

    fn set_bool(&mut self, name: &str, value: bool) -> Result<()> {
        *self.bool_slot(name)? = value;
        Ok(())
    }

    fn set_value(&mut self, name: &str, value: &str) -> Result<()> {
        let invalid = || EngineError::InvalidOption(format!("{}={}", name, value));
        let parsed: usize = value.trim().parse().map_err(|_| invalid())?;
        match canonical(name.trim(), NUMBERS) {
            Some("shiftwidth") => self.shiftwidth = parsed,
            Some("tabstop") if parsed > 0 => self.tabstop = parsed,
            Some("tabstop") => return Err(invalid()),
            _ => return Err(EngineError::InvalidOption(name.to_string())),
        }
        Ok(())
    }

    /// Query an option value.
    fn query(&self, name: &str) -> Result<String> {
        let name = name.trim();
        match canonical(name, NUMBERS) {
            Some("shiftwidth") => return Ok(format!("shiftwidth={}", self.shiftwidth)),
            Some("tabstop") => return Ok(format!("tabstop={}", self.tabstop)),
            _ => {}
        }
        let full = canonical(name, BOOLEANS)
            .ok_or_else(|| EngineError::InvalidOption(name.to_string()))?;
        let value = self.get_bool(full)?;
        Ok(format!("{}{}", if value { "" } else { "no" }, full))
    }

    /// Effective shift width; zero means "use tabstop", as in Vim.
    pub fn shift_width(&self) -> usize {
        if self.shiftwidth == 0 {
            self.tabstop
        } else {
            self.shiftwidth
        }
    }

    /// Whether a search for `pattern` should ignore case.
    pub fn search_ignores_case(&self, pattern: &str) -> bool {
        self.ignorecase && !(self.smartcase && pattern.chars().any(char::is_uppercase))
    }

    fn show_all(&self) -> String {
        let mut items: Vec<String> = BOOLEANS
            .iter()
            .filter_map(|(name, _)| self.query(name).ok())
            .collect();
        items.extend(NUMBERS.iter().filter_map(|(name, _)| self.query(name).ok()));
        items.join("  ")
    }

    fn show_changed(&self) -> String {
        let defaults = Options::default();
        let mut items = Vec::new();
        for (name, _) in BOOLEANS.iter().chain(NUMBERS) {
            let (now, then) = (self.query(name), defaults.query(name));
            if let (Ok(now), Ok(then)) = (now, then) {
                if now != then {
                    items.push(now);
                }
            }
        }
        items.join("  ")
    }
}

fn canonical(name: &str, table: &[(&'static str, &'static str)]) -> Option<&'static str> {
    table
        .iter()
        .find(|(full, short)| *full == name || *short == name)
        .map(|(full, _)| *full)
}
