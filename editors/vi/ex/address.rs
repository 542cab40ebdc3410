//! Ex command address parsing.
//!
//! Addresses specify line numbers or patterns for ex commands. Parsed
//! addresses keep the user's 1-based numbering; resolving turns them into
//! 0-based surface lines.

use crate::error::{EngineError, Result};
use crate::marks::Marks;
use crate::options::Options;
use crate::search;
use crate::surface::{SurfaceExt, TextSurface};

/// Base of an ex address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressBase {
    /// Current line (.).
    Current,
    /// Last line ($).
    Last,
    /// Absolute line number, 1-based. `0` is only valid for `:put`/`:copy`
    /// destinations.
    Line(usize),
    /// Pattern search forward (/pattern/).
    SearchForward(String),
    /// Pattern search backward (?pattern?).
    SearchBackward(String),
    /// Mark ('x).
    Mark(char),
}

/// An address with its `+n`/`-n` offsets summed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub base: AddressBase,
    pub offset: isize,
}

impl Address {
    pub fn new(base: AddressBase) -> Self {
        Self { base, offset: 0 }
    }

    pub fn line(n: usize) -> Self {
        Self::new(AddressBase::Line(n))
    }
}

/// What an address needs to be resolved.
pub struct AddressContext<'a> {
    pub surface: &'a dyn TextSurface,
    pub marks: &'a Marks,
    pub options: &'a Options,
    /// Pattern to use for an empty `//`.
    pub last_pattern: Option<&'a str>,
}

impl AddressContext<'_> {
    fn search(&self, pattern: &str, from: usize, forward: bool) -> Result<usize> {
        let pattern = if pattern.is_empty() {
            self.last_pattern.ok_or(EngineError::NoPreviousPattern)?
        } else {
            pattern
        };
        let regex = search::compile(pattern, self.options)?;
        let s = self.surface;
        let count = s.line_count();
        let mut line = from;
        for _ in 0..count {
            line = if forward {
                (line + 1) % count
            } else {
                (line + count - 1) % count
            };
            if !self.options.wrapscan && ((forward && line <= from) || (!forward && line >= from)) {
                break;
            }
            if regex.is_match(&s.line_text(line)) {
                return Ok(line);
            }
        }
        Err(EngineError::PatternNotFound(pattern.to_string()))
    }
}

impl Address {
    /// Resolve to a 1-based line number; `0` means "before the first line".
    pub fn resolve_number(&self, ctx: &AddressContext, current: usize) -> Result<usize> {
        let s = ctx.surface;
        let base = match &self.base {
            AddressBase::Current => current + 1,
            AddressBase::Last => s.line_count(),
            AddressBase::Line(n) => *n,
            AddressBase::SearchForward(pattern) => ctx.search(pattern, current, true)? + 1,
            AddressBase::SearchBackward(pattern) => ctx.search(pattern, current, false)? + 1,
            AddressBase::Mark(name) => {
                let offset = ctx.marks.get(*name)?;
                s.line_of(offset.min(s.len_chars())) + 1
            }
        };
        let line = base as isize + self.offset;
        if line < 0 || line as usize > s.line_count() {
            return Err(EngineError::InvalidRange(format!("line {} does not exist", line)));
        }
        Ok(line as usize)
    }

    /// Resolve to a 0-based surface line.
    pub fn resolve(&self, ctx: &AddressContext, current: usize) -> Result<usize> {
        match self.resolve_number(ctx, current)? {
            0 => Err(EngineError::InvalidRange("line 0 does not exist".to_string())),
            n => Ok(n - 1),
        }
    }
}

/// A range of addresses for ex commands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AddressRange {
    /// Start address (None means current line).
    pub start: Option<Address>,
    /// End address (None means same as start).
    pub end: Option<Address>,
    /// `;` separator: the second address is relative to the first.
    pub anchored: bool,
}

impl AddressRange {
    /// Create an empty range (means use default).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(addr: Address) -> Self {
        Self {
            start: Some(addr),
            ..Self::default()
        }
    }

    pub fn range(start: Address, end: Address) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            anchored: false,
        }
    }

    /// Create a range for the whole file (1,$).
    pub fn all() -> Self {
        Self::range(Address::line(1), Address::new(AddressBase::Last))
    }

    /// Whether any address was given.
    pub fn is_explicit(&self) -> bool {
        self.start.is_some()
    }

    /// Resolve to 0-based `(first, last)` lines. A backwards range is an
    /// error, as it would need confirmation to swap.
    pub fn resolve(&self, ctx: &AddressContext, current: usize) -> Result<(usize, usize)> {
        let start = match &self.start {
            Some(addr) => addr.resolve(ctx, current)?,
            None => current,
        };
        let base = if self.anchored { start } else { current };
        let end = match &self.end {
            Some(addr) => addr.resolve(ctx, base)?,
            None => start,
        };
        if start > end {
            return Err(EngineError::InvalidRange("backwards range".to_string()));
        }
        Ok((start, end))
    }
}

/// Read a `/pattern/` body; the closing delimiter is optional at the end.
fn delimited(input: &str, delim: char) -> (String, &str) {
    let mut pattern = String::new();
    let mut chars = input.char_indices();
    while let Some((i, c)) = chars.next() {
        if c == delim {
            return (pattern, &input[i + c.len_utf8()..]);
        }
        if c == '\\' {
            if let Some((_, next)) = chars.next() {
                if next != delim {
                    pattern.push('\\');
                }
                pattern.push(next);
                continue;
            }
        }
        pattern.push(c);
    }
    (pattern, "")
}

/// Parse a number from start of string.
fn parse_number(input: &str) -> Option<(usize, &str)> {
    let end = input
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(input.len());

    if end == 0 {
        return None;
    }

    let num: usize = input[..end].parse().ok()?;
    Some((num, &input[end..]))
}

/// Sum of `+n`/`-n` offsets following an address.
fn parse_offsets(mut input: &str) -> (isize, &str) {
    let mut total = 0isize;
    loop {
        let sign = match input.chars().next() {
            Some('+') => 1,
            Some('-') => -1,
            _ => return (total, input),
        };
        input = &input[1..];
        match parse_number(input) {
            Some((n, rest)) => {
                total += sign * n as isize;
                input = rest;
            }
            None => total += sign,
        }
    }
}

/// Parse one address from the start of `input`.
pub fn parse_address(input: &str) -> Result<Option<(Address, &str)>> {
    let input = input.trim_start();
    let Some(first) = input.chars().next() else {
        return Ok(None);
    };

    let (base, rest) = match first {
        '.' => (Some(AddressBase::Current), &input[1..]),
        '$' => (Some(AddressBase::Last), &input[1..]),
        '/' => {
            let (pattern, rest) = delimited(&input[1..], '/');
            (Some(AddressBase::SearchForward(pattern)), rest)
        }
        '?' => {
            let (pattern, rest) = delimited(&input[1..], '?');
            (Some(AddressBase::SearchBackward(pattern)), rest)
        }
        '\'' => {
            let mark = input[1..]
                .chars()
                .next()
                .ok_or_else(|| EngineError::InvalidRange("missing mark name".to_string()))?;
            (Some(AddressBase::Mark(mark)), &input[1 + mark.len_utf8()..])
        }
        '0'..='9' => match parse_number(input) {
            Some((n, rest)) => (Some(AddressBase::Line(n)), rest),
            None => return Err(EngineError::InvalidRange(input.to_string())),
        },
        // A bare offset is relative to the current line.
        '+' | '-' => (Some(AddressBase::Current), input),
        _ => (None, input),
    };

    let Some(base) = base else {
        return Ok(None);
    };
    let (offset, rest) = parse_offsets(rest);
    Ok(Some((Address { base, offset }, rest)))
}

/// Parse an address range.
pub fn parse_address_range(input: &str) -> Result<(AddressRange, &str)> {
    let input = input.trim_start();

    if let Some(rest) = input.strip_prefix('%') {
        return Ok((AddressRange::all(), rest));
    }

    let (first, rest) = match parse_address(input)? {
        Some((addr, rest)) => (Some(addr), rest),
        None => (None, input),
    };

    let rest = rest.trim_start();
    let separator = rest.chars().next().filter(|c| matches!(c, ',' | ';'));
    let Some(separator) = separator else {
        return Ok((AddressRange { start: first, ..AddressRange::default() }, rest));
    };
    let rest = &rest[1..];

    let (second, rest) = match parse_address(rest)? {
        Some((addr, rest)) => (Some(addr), rest),
        None => (None, rest),
    };
    // A missing side of `a,b` is the current line.
    let current = || Address::new(AddressBase::Current);
    let range = AddressRange {
        start: Some(first.unwrap_or_else(current)),
        end: Some(second.unwrap_or_else(current)),
        anchored: separator == ';',
    };
    Ok((range, rest))
}
