//! Authorization guard: who may mutate what.
//!
//! The Seer has full control. Players control only tokens that list them in
//! `controlled_by`, and may remove shared-layer drawings they created. The
//! `gm` drawing layer is Seer-only for every operation, including reads.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use crate::error::{Action, SessionError};
use crate::model::{Drawing, DrawingLayer, ParticipantId, Token};

/// Capability checks for one session, keyed by its Seer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guard {
    seer: ParticipantId,
}

impl Guard {
    #[must_use]
    pub fn new(seer: ParticipantId) -> Self {
        Self { seer }
    }

    #[must_use]
    pub fn seer(&self) -> &ParticipantId {
        &self.seer
    }

    #[must_use]
    pub fn is_seer(&self, actor: &ParticipantId) -> bool {
        *actor == self.seer
    }

    /// True iff the actor is the Seer or listed in `token.controlled_by`.
    #[must_use]
    pub fn can_control_token(&self, actor: &ParticipantId, token: &Token) -> bool {
        self.is_seer(actor) || token.controlled_by.contains(actor)
    }

    #[must_use]
    pub fn can_add_drawing(&self, actor: &ParticipantId, layer: DrawingLayer) -> bool {
        match layer {
            DrawingLayer::Gm => self.is_seer(actor),
            DrawingLayer::Drawings => true,
        }
    }

    #[must_use]
    pub fn can_remove_drawing(&self, actor: &ParticipantId, drawing: &Drawing) -> bool {
        if self.is_seer(actor) {
            return true;
        }
        match drawing.layer {
            DrawingLayer::Gm => false,
            DrawingLayer::Drawings => drawing.created_by == *actor,
        }
    }

    #[must_use]
    pub fn can_see_drawing(&self, actor: &ParticipantId, drawing: &Drawing) -> bool {
        drawing.layer == DrawingLayer::Drawings || self.is_seer(actor)
    }

    // --- Result-returning variants used at the mutation boundary ---

    /// # Errors
    ///
    /// Returns `Denied` unless the actor is the Seer.
    pub fn require_seer(&self, actor: &ParticipantId, action: Action) -> Result<(), SessionError> {
        if self.is_seer(actor) { Ok(()) } else { Err(denied(actor, action)) }
    }

    /// # Errors
    ///
    /// Returns `Denied` unless [`Guard::can_control_token`] holds.
    pub fn require_token_control(
        &self,
        actor: &ParticipantId,
        token: &Token,
        action: Action,
    ) -> Result<(), SessionError> {
        if self.can_control_token(actor, token) { Ok(()) } else { Err(denied(actor, action)) }
    }

    /// # Errors
    ///
    /// Returns `Denied` unless [`Guard::can_add_drawing`] holds.
    pub fn require_drawing_add(&self, actor: &ParticipantId, layer: DrawingLayer) -> Result<(), SessionError> {
        if self.can_add_drawing(actor, layer) { Ok(()) } else { Err(denied(actor, Action::AddDrawing)) }
    }

    /// # Errors
    ///
    /// Returns `Denied` unless [`Guard::can_remove_drawing`] holds.
    pub fn require_drawing_remove(&self, actor: &ParticipantId, drawing: &Drawing) -> Result<(), SessionError> {
        if self.can_remove_drawing(actor, drawing) { Ok(()) } else { Err(denied(actor, Action::RemoveDrawing)) }
    }
}

fn denied(actor: &ParticipantId, action: Action) -> SessionError {
    tracing::debug!(%actor, %action, "mutation denied");
    SessionError::Denied { actor: actor.clone(), action }
}
