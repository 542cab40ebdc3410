//! Pattern search and substitution.
//!
//! Patterns use vi "magic" syntax and are translated to the `regex`
//! crate's syntax before compiling.

use crate::error::{EngineError, Result};
use crate::options::Options;
use regex::{Captures, Regex, RegexBuilder};

/// Maximum accepted pattern length.
const MAX_PATTERN_LEN: usize = 4096;

/// Search direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchDirection {
    #[default]
    Forward,
    Backward,
}

impl SearchDirection {
    /// Get the opposite direction.
    pub fn opposite(self) -> Self {
        match self {
            SearchDirection::Forward => SearchDirection::Backward,
            SearchDirection::Backward => SearchDirection::Forward,
        }
    }
}

/// Last search, reused by `n`, `N` and empty patterns.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub pattern: Option<String>,
    pub direction: SearchDirection,
}

impl SearchState {
    /// Remember a search. An empty pattern keeps the previous one.
    pub fn set(&mut self, pattern: &str, direction: SearchDirection) -> Result<String> {
        if !pattern.is_empty() {
            self.pattern = Some(pattern.to_string());
        }
        self.direction = direction;
        self.pattern.clone().ok_or(EngineError::NoPreviousPattern)
    }

    pub fn pattern(&self) -> Result<&str> {
        self.pattern.as_deref().ok_or(EngineError::NoPreviousPattern)
    }
}

/// Translate a magic vi pattern into `regex` syntax.
pub fn translate_pattern(pattern: &str) -> String {
    let mut result = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('<') | Some('>') => result.push_str(r"\b"),
                Some('{') => {
                    // \{n,m} closes with a bare brace
                    result.push('{');
                    for b in chars.by_ref() {
                        if b == '\\' {
                            continue;
                        }
                        result.push(b);
                        if b == '}' {
                            break;
                        }
                    }
                }
                Some(g @ ('(' | ')' | '|' | '}' | '+' | '?')) => result.push(g),
                Some('=') => result.push('?'),
                Some(other) => {
                    result.push('\\');
                    result.push(other);
                }
                None => result.push_str(r"\\"),
            },
            // Literal in magic vi patterns, special in regex.
            '+' | '?' | '|' | '(' | ')' | '{' | '}' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }

    result
}

/// Compile a vi pattern honoring ignorecase/smartcase.
pub fn compile(pattern: &str, options: &Options) -> Result<Regex> {
    if pattern.len() > MAX_PATTERN_LEN {
        return Err(EngineError::InvalidPattern("pattern too long".to_string()));
    }
    let regex = RegexBuilder::new(&translate_pattern(pattern))
        .case_insensitive(options.search_ignores_case(pattern))
        .multi_line(true)
        .build()?;
    Ok(regex)
}

/// Find the next match starting strictly after (or before) `from`.
///
/// Offsets are in characters. Returns the match as a character range.
pub fn find(
    regex: &Regex,
    text: &str,
    from: usize,
    direction: SearchDirection,
    wrap: bool,
) -> Option<(usize, usize)> {
    let matches = regex.find_iter(text).map(|m| (m.start(), m.end()));
    let from_byte = char_to_byte(text, from);

    let hit = match direction {
        SearchDirection::Forward => {
            let mut first = None;
            let mut after = None;
            for m in matches {
                if first.is_none() {
                    first = Some(m);
                }
                if m.0 > from_byte {
                    after = Some(m);
                    break;
                }
            }
            after.or(if wrap { first } else { None })
        }
        SearchDirection::Backward => {
            let mut last = None;
            let mut before = None;
            for m in matches {
                if m.0 < from_byte {
                    before = Some(m);
                }
                last = Some(m);
            }
            before.or(if wrap { last } else { None })
        }
    }?;

    Some((byte_to_char(text, hit.0), byte_to_char(text, hit.1)))
}

/// A compiled `:substitute`.
#[derive(Debug, Clone)]
pub struct Substitution {
    regex: Regex,
    replacement: String,
    global: bool,
}

impl Substitution {
    pub fn new(regex: Regex, replacement: &str, global: bool) -> Self {
        Self {
            regex,
            replacement: replacement.to_string(),
            global,
        }
    }

    /// Substitute in a single line.
    /// Returns (new_line, substitution_count).
    pub fn apply_line(&self, line: &str) -> (String, usize) {
        let mut count = 0;
        let limit = if self.global { 0 } else { 1 };
        let new_line = self.regex.replacen(line, limit, |caps: &Captures| {
            count += 1;
            expand_replacement(&self.replacement, caps)
        });
        (new_line.into_owned(), count)
    }
}

/// Expand `&`, `\0`-`\9`, `\n`, `\r`, `\t` and escapes in a replacement.
fn expand_replacement(replacement: &str, caps: &Captures) -> String {
    let mut result = String::new();
    let mut chars = replacement.chars();
    let group = |n: usize| caps.get(n).map(|m| m.as_str()).unwrap_or("");

    while let Some(c) = chars.next() {
        match c {
            '&' => result.push_str(group(0)),
            '\\' => match chars.next() {
                Some(d @ '0'..='9') => result.push_str(group((d as u8 - b'0') as usize)),
                Some('n') | Some('r') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some(other) => result.push(other),
                None => result.push('\\'),
            },
            _ => result.push(c),
        }
    }

    result
}

pub(crate) fn char_to_byte(s: &str, char_offset: usize) -> usize {
    s.char_indices()
        .nth(char_offset)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub(crate) fn byte_to_char(s: &str, byte_offset: usize) -> usize {
    s[..byte_offset.min(s.len())].chars().count()
}
