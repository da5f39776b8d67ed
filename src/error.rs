//! Error types for session mutations.
//!
//! DESIGN
//! ======
//! Every mutation entry point returns `Result<_, SessionError>`. A rejected
//! mutation never touches state and never emits an event, so callers that
//! only care about the happy path may ignore the error. `ErrorCode` gives
//! each variant a grepable code for the transport's structured error
//! payloads.

use uuid::Uuid;

use crate::model::ParticipantId;

/// Mutations the authorization guard can reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveToken,
    AddToken,
    RemoveToken,
    UpdateToken,
    RevealFog,
    HideFog,
    ResetFog,
    AddDrawing,
    RemoveDrawing,
    ClearDrawings,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::MoveToken => "move_token",
            Self::AddToken => "add_token",
            Self::RemoveToken => "remove_token",
            Self::UpdateToken => "update_token",
            Self::RevealFog => "reveal_fog",
            Self::HideFog => "hide_fog",
            Self::ResetFog => "reset_fog",
            Self::AddDrawing => "add_drawing",
            Self::RemoveDrawing => "remove_drawing",
            Self::ClearDrawings => "clear_drawings",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("{actor} is not allowed to {action}")]
    Denied { actor: ParticipantId, action: Action },
    #[error("token not found: {0}")]
    TokenNotFound(Uuid),
    #[error("drawing not found: {0}")]
    DrawingNotFound(Uuid),
    #[error("ping not found: {0}")]
    PingNotFound(Uuid),
    #[error("no map loaded for this session")]
    MapNotLoaded,
    #[error("invalid {field}: {value}")]
    InvalidCoordinate { field: &'static str, value: f64 },
    #[error("invalid map: {0}")]
    InvalidMap(String),
    #[error("ping timers require a running tokio runtime")]
    NoRuntime,
    #[error("session actor is closed")]
    ActorClosed,
}

impl SessionError {
    /// True when the mutation was refused by the authorization guard.
    #[must_use]
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied { .. })
    }
}

// =============================================================================
// ERROR CODES
// =============================================================================

/// Grepable error code and retryable flag for structured error payloads.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

impl ErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Denied { .. } => "E_DENIED",
            Self::TokenNotFound(_) => "E_TOKEN_NOT_FOUND",
            Self::DrawingNotFound(_) => "E_DRAWING_NOT_FOUND",
            Self::PingNotFound(_) => "E_PING_NOT_FOUND",
            Self::MapNotLoaded => "E_MAP_NOT_LOADED",
            Self::InvalidCoordinate { .. } => "E_INVALID_COORDINATE",
            Self::InvalidMap(_) => "E_INVALID_MAP",
            Self::NoRuntime => "E_NO_RUNTIME",
            Self::ActorClosed => "E_ACTOR_CLOSED",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::ActorClosed)
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Reject NaN and infinities at the mutation boundary.
///
/// # Errors
///
/// Returns `InvalidCoordinate` naming `field` when `value` is not finite.
pub fn ensure_finite(field: &'static str, value: f64) -> Result<f64, SessionError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SessionError::InvalidCoordinate { field, value })
    }
}

/// Like [`ensure_finite`], additionally rejecting zero and negative sizes.
///
/// # Errors
///
/// Returns `InvalidCoordinate` when `value` is not finite or not positive.
pub fn ensure_positive(field: &'static str, value: f64) -> Result<f64, SessionError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SessionError::InvalidCoordinate { field, value })
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
