//! Input handling module.
//!
//! This module provides the canonical key event type and the `<...>`
//! notation used by scripts, macros and tests.

mod key;
mod notation;

pub use key::{code, KeyEvent, Modifiers};
pub use notation::{format_keys, parse_keys};
