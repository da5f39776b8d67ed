//! Local undo stack of drawings created by this participant.
//!
//! Only drawings the local actor creates are pushed; drawings received from
//! peers never are. Clearing a layer does not prune the stack, so an undo
//! can pop an id that no longer exists and the session treats it as a no-op.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use crate::model::DrawingId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrawingHistory {
    stack: Vec<DrawingId>,
}

impl DrawingHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: DrawingId) {
        self.stack.push(id);
    }

    /// Pop the most recently created id.
    pub fn pop(&mut self) -> Option<DrawingId> {
        self.stack.pop()
    }

    #[must_use]
    pub fn peek(&self) -> Option<&DrawingId> {
        self.stack.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &DrawingId) -> bool {
        self.stack.contains(id)
    }
}
