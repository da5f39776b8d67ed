//! State store — pure transitions from one snapshot to the next.
//!
//! DESIGN
//! ======
//! Every function takes the current `SessionMapState` by reference and
//! returns a new one. The touched collection is rebuilt into a fresh
//! `Arc<Vec<_>>`; untouched collections keep sharing their `Arc`. Nothing
//! here authorizes or notifies; `session` runs the guard first and the
//! dispatcher after.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::sync::Arc;

use crate::error::SessionError;
use crate::model::{Drawing, DrawingId, DrawingLayer, FogId, FogRegion, Ping, PingId, SessionMapState, Token, TokenId, TokenPatch};

// =============================================================================
// TOKENS
// =============================================================================

/// Append a token. A token with the same id replaces the existing one in place.
#[must_use]
pub fn with_token_added(state: &SessionMapState, token: Token) -> SessionMapState {
    let mut tokens: Vec<Token> = state.tokens.iter().filter(|t| t.id != token.id).cloned().collect();
    match state.tokens.iter().position(|t| t.id == token.id) {
        Some(index) => tokens.insert(index, token),
        None => tokens.push(token),
    }
    SessionMapState { tokens: Arc::new(tokens), ..state.clone() }
}

/// Move a token to a new grid position.
///
/// # Errors
///
/// Returns `TokenNotFound` if no token has `id`.
pub fn with_token_moved(state: &SessionMapState, id: TokenId, x: f64, y: f64) -> Result<SessionMapState, SessionError> {
    map_token(state, id, |token| {
        token.x = x;
        token.y = y;
    })
}

/// Apply a sparse patch to a token.
///
/// # Errors
///
/// Returns `TokenNotFound` if no token has `id`.
pub fn with_token_patched(
    state: &SessionMapState,
    id: TokenId,
    patch: &TokenPatch,
) -> Result<SessionMapState, SessionError> {
    map_token(state, id, |token| patch.apply_to(token))
}

/// Remove a token.
///
/// # Errors
///
/// Returns `TokenNotFound` if no token has `id`.
pub fn with_token_removed(state: &SessionMapState, id: TokenId) -> Result<SessionMapState, SessionError> {
    if state.token(&id).is_none() {
        return Err(SessionError::TokenNotFound(id));
    }
    let tokens = state.tokens.iter().filter(|t| t.id != id).cloned().collect();
    Ok(SessionMapState { tokens: Arc::new(tokens), ..state.clone() })
}

fn map_token(
    state: &SessionMapState,
    id: TokenId,
    f: impl FnOnce(&mut Token),
) -> Result<SessionMapState, SessionError> {
    let index = state
        .tokens
        .iter()
        .position(|t| t.id == id)
        .ok_or(SessionError::TokenNotFound(id))?;
    let mut tokens = state.tokens.as_ref().clone();
    f(&mut tokens[index]);
    Ok(SessionMapState { tokens: Arc::new(tokens), ..state.clone() })
}

// =============================================================================
// FOG
// =============================================================================

/// Add a revealed region.
#[must_use]
pub fn with_fog_revealed(state: &SessionMapState, region: FogRegion) -> SessionMapState {
    let mut fog = state.fog.as_ref().clone();
    fog.push(region);
    SessionMapState { fog: Arc::new(fog), ..state.clone() }
}

/// Re-cover the map by dropping the listed reveals. `None` hides everything.
#[must_use]
pub fn with_fog_hidden(state: &SessionMapState, ids: Option<&[FogId]>) -> SessionMapState {
    let fog = match ids {
        Some(ids) => state.fog.iter().filter(|r| !ids.contains(&r.id)).cloned().collect(),
        None => Vec::new(),
    };
    SessionMapState { fog: Arc::new(fog), ..state.clone() }
}

/// Drop every reveal and return to a fully fogged map.
#[must_use]
pub fn with_fog_reset(state: &SessionMapState) -> SessionMapState {
    SessionMapState { fog: Arc::new(Vec::new()), ..state.clone() }
}

// =============================================================================
// DRAWINGS
// =============================================================================

#[must_use]
pub fn with_drawing_added(state: &SessionMapState, drawing: Drawing) -> SessionMapState {
    let mut drawings: Vec<Drawing> = state.drawings.iter().filter(|d| d.id != drawing.id).cloned().collect();
    drawings.push(drawing);
    SessionMapState { drawings: Arc::new(drawings), ..state.clone() }
}

/// # Errors
///
/// Returns `DrawingNotFound` if no drawing has `id`.
pub fn with_drawing_removed(state: &SessionMapState, id: DrawingId) -> Result<SessionMapState, SessionError> {
    if state.drawing(&id).is_none() {
        return Err(SessionError::DrawingNotFound(id));
    }
    let drawings = state.drawings.iter().filter(|d| d.id != id).cloned().collect();
    Ok(SessionMapState { drawings: Arc::new(drawings), ..state.clone() })
}

/// Remove every drawing on `layer`, keeping the other layer untouched.
#[must_use]
pub fn with_drawings_cleared(state: &SessionMapState, layer: DrawingLayer) -> SessionMapState {
    let drawings = state.drawings.iter().filter(|d| d.layer != layer).cloned().collect();
    SessionMapState { drawings: Arc::new(drawings), ..state.clone() }
}

// =============================================================================
// PINGS
// =============================================================================

/// Insert a ping, replacing any ping with the same id.
#[must_use]
pub fn with_ping_added(state: &SessionMapState, ping: Ping) -> SessionMapState {
    let mut pings: Vec<Ping> = state.pings.iter().filter(|p| p.id != ping.id).cloned().collect();
    pings.push(ping);
    SessionMapState { pings: Arc::new(pings), ..state.clone() }
}

/// Remove a ping. Returns `None` when the ping is already gone so expiry
/// and explicit removal can race without double-removal.
#[must_use]
pub fn with_ping_removed(state: &SessionMapState, id: PingId) -> Option<SessionMapState> {
    state.ping(&id)?;
    let pings = state.pings.iter().filter(|p| p.id != id).cloned().collect();
    Some(SessionMapState { pings: Arc::new(pings), ..state.clone() })
}
