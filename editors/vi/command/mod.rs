//! Motions, operators and text objects.
//!
//! These are the building blocks the executor combines once the evaluator
//! has resolved a key sequence.

pub mod motion;
pub mod operator;
pub mod text_object;

pub use motion::{FindKind, Motion, MotionContext, MotionKind, MotionResult};
pub use operator::{Operator, OperatorResult, Region};
pub use text_object::{Scope, Selection, TextObject};

use crate::error::{EngineError, Result};
use crate::marks::Marks;
use crate::surface::{TextRange, TextSurface};
use tracing::warn;

/// Surface access for commands that edit.
///
/// Every replacement shifts the marks and is tallied, so the change can be
/// described afterwards.
pub struct EditContext<'a> {
    pub surface: &'a mut dyn TextSurface,
    pub marks: &'a mut Marks,
    /// Characters removed so far.
    pub removed: usize,
    /// Characters inserted so far.
    pub inserted: usize,
}

impl<'a> EditContext<'a> {
    pub fn new(surface: &'a mut dyn TextSurface, marks: &'a mut Marks) -> Self {
        Self {
            surface,
            marks,
            removed: 0,
            inserted: 0,
        }
    }

    /// Replace `range` with `text`, returning the offset after the new text.
    pub fn replace(&mut self, range: TextRange, text: &str) -> Result<usize> {
        let inserted = text.chars().count();
        let after = self.surface.replace(range, text).map_err(|e| {
            warn!(start = range.start, end = range.end, error = %e, "surface refused edit");
            EngineError::from(e)
        })?;
        self.marks.adjust(range.start, range.len(), inserted);
        self.removed += range.len();
        self.inserted += inserted;
        Ok(after)
    }

    pub fn insert(&mut self, offset: usize, text: &str) -> Result<usize> {
        self.replace(TextRange::point(offset), text)
    }

    pub fn delete(&mut self, range: TextRange) -> Result<usize> {
        self.replace(range, "")
    }

    /// Whether anything was changed through this context.
    pub fn changed(&self) -> bool {
        self.removed > 0 || self.inserted > 0
    }
}
