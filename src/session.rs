//! Session — the single writer over one map's shared state.
//!
//! ARCHITECTURE
//! ============
//! `VttSession` owns everything one participant needs to run a map: the
//! loaded `GridMap`, the `SessionMapState` snapshot, ping timers, the local
//! drawing history, the local viewport and ruler, and the event dispatcher.
//!
//! Every mutation follows the same path:
//!
//! 1. Validate input (`InvalidCoordinate` for NaN and infinities).
//! 2. Resolve the target entity (`*NotFound`).
//! 3. Run the authorization guard (`Denied`).
//! 4. Compute the next snapshot with a pure `store` transition.
//! 5. Swap the snapshot in and dispatch exactly one event.
//!
//! A failure at any step leaves state untouched and emits nothing.
//!
//! Events received from other participants go through [`VttSession::apply_remote`],
//! which runs the same steps but skips dispatch so a change is never
//! re-broadcast by the participant that merely observed it.
//!
//! TRADE-OFFS
//! ==========
//! Participants converge through the external transport with last writer
//! wins. Nothing here reconciles concurrent edits beyond the authorization
//! gate.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::Arc;

use tracing::{debug, info};

use crate::auth::Guard;
use crate::config::SessionConfig;
use crate::consts::DEFAULT_PING_COLOR;
use crate::error::{Action, SessionError, ensure_finite};
use crate::events::{Dispatcher, Origin, SessionEvent, SessionListener};
use crate::grid::{GridCell, GridTransform, Point};
use crate::history::DrawingHistory;
use crate::measure::Measurement;
use crate::model::{
    Drawing, DrawingId, DrawingLayer, FogId, FogRegion, GridMap, ParticipantId, Ping, PingId, SessionMapState,
    Token, TokenId, TokenPatch, now_ms,
};
use crate::pings::{Expiry, PingTimers, new_ping, remaining};
use crate::store;
use crate::viewport::Viewport;

/// One participant's view of a map session.
///
/// Ping timers only queue their expiries. Nothing is removed from `state()`
/// until the owner drives [`next_ping_expiry`](Self::next_ping_expiry) in its
/// event loop or calls [`process_due_pings`](Self::process_due_pings).
/// [`spawn_session`](crate::actor::spawn_session) does this automatically.
pub struct VttSession {
    guard: Guard,
    local: ParticipantId,
    config: SessionConfig,
    map: Option<GridMap>,
    transform: Option<GridTransform>,
    state: SessionMapState,
    timers: PingTimers,
    history: DrawingHistory,
    viewport: Viewport,
    measurement: Option<Measurement>,
    dispatcher: Dispatcher,
}

impl std::fmt::Debug for VttSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VttSession")
            .field("seer", self.guard.seer())
            .field("local", &self.local)
            .field("map", &self.map.as_ref().map(|m| m.id))
            .field("tokens", &self.state.tokens.len())
            .field("drawings", &self.state.drawings.len())
            .field("fog", &self.state.fog.len())
            .field("pings", &self.state.pings.len())
            .field("listeners", &self.dispatcher.len())
            .finish_non_exhaustive()
    }
}

impl VttSession {
    /// Create an empty session. `seer` holds authoring rights; `local` is the
    /// participant driving this instance (their drawings feed undo).
    #[must_use]
    pub fn new(seer: impl Into<ParticipantId>, local: impl Into<ParticipantId>, config: SessionConfig) -> Self {
        Self {
            guard: Guard::new(seer.into()),
            local: local.into(),
            config,
            map: None,
            transform: None,
            state: SessionMapState::new(),
            timers: PingTimers::new(),
            history: DrawingHistory::new(),
            viewport: Viewport::default(),
            measurement: None,
            dispatcher: Dispatcher::new(),
        }
    }

    /// Register a listener for every accepted mutation.
    pub fn subscribe(&mut self, listener: Arc<dyn SessionListener>) {
        self.dispatcher.subscribe(listener);
    }

    // =========================================================================
    // LOADING
    // =========================================================================

    /// Install the map descriptor. Replaces any previous map; state is kept.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMap` for a zero-sized grid or non-finite offsets.
    pub fn load_map(&mut self, map: GridMap) -> Result<(), SessionError> {
        map.validate()?;
        let transform = GridTransform::new(&map);
        info!(map_id = %map.id, columns = map.grid_columns, rows = map.grid_rows, cell = transform.cell_size(), "map loaded");
        self.transform = Some(transform);
        self.map = Some(map);
        Ok(())
    }

    /// Replace the whole state with a seed from the persistence layer.
    ///
    /// Pending ping timers are cancelled. Seeded pings are rescheduled for
    /// their remaining lifetime and expire silently like remote pings; ones
    /// already past `expires_at` are dropped.
    /// The local undo stack is cleared. No event is emitted.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed seed, or `NoRuntime` when
    /// the seed holds live pings and no tokio runtime is available. State is
    /// unchanged on error.
    pub fn load_session_state(&mut self, seed: SessionMapState) -> Result<(), SessionError> {
        seed.validate()?;

        let now = now_ms();
        let mut live = Vec::with_capacity(seed.pings.len());
        for ping in seed.pings.iter() {
            if let Some(left) = remaining(ping, now) {
                live.push((ping.clone(), left));
            }
        }
        let dropped = seed.pings.len() - live.len();

        let mut timers = PingTimers::new();
        for (ping, left) in &live {
            timers.schedule(ping.id, *left, Origin::Remote)?;
        }

        self.timers = timers;
        self.history = DrawingHistory::new();
        self.state = SessionMapState {
            pings: Arc::new(live.into_iter().map(|(ping, _)| ping).collect()),
            ..seed
        };
        info!(
            tokens = self.state.tokens.len(),
            drawings = self.state.drawings.len(),
            fog = self.state.fog.len(),
            pings = self.state.pings.len(),
            dropped_pings = dropped,
            "session state loaded"
        );
        Ok(())
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    #[must_use]
    pub fn state(&self) -> &SessionMapState {
        &self.state
    }

    #[must_use]
    pub fn map(&self) -> Option<&GridMap> {
        self.map.as_ref()
    }

    #[must_use]
    pub fn seer(&self) -> &ParticipantId {
        self.guard.seer()
    }

    #[must_use]
    pub fn local_actor(&self) -> &ParticipantId {
        &self.local
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn token(&self, id: &TokenId) -> Option<&Token> {
        self.state.token(id)
    }

    /// False for unknown tokens.
    #[must_use]
    pub fn can_control_token(&self, actor: &ParticipantId, id: &TokenId) -> bool {
        self.state.token(id).is_some_and(|token| self.guard.can_control_token(actor, token))
    }

    /// Drawings `actor` may see: everything for the Seer, the shared layer
    /// for everyone else.
    #[must_use]
    pub fn visible_drawings(&self, actor: &ParticipantId) -> Vec<&Drawing> {
        self.state.drawings.iter().filter(|d| self.guard.can_see_drawing(actor, d)).collect()
    }

    #[must_use]
    pub fn history(&self) -> &DrawingHistory {
        &self.history
    }

    /// Grid geometry of the loaded map.
    ///
    /// # Errors
    ///
    /// Returns `MapNotLoaded` before [`VttSession::load_map`].
    pub fn transform(&self) -> Result<&GridTransform, SessionError> {
        self.transform.as_ref().ok_or(SessionError::MapNotLoaded)
    }

    /// # Errors
    ///
    /// Returns `InvalidCoordinate` for NaN or infinite input, `MapNotLoaded`
    /// before a map is loaded.
    pub fn pixel_to_grid(&self, px: f64, py: f64) -> Result<GridCell, SessionError> {
        ensure_finite("x", px)?;
        ensure_finite("y", py)?;
        Ok(self.transform()?.pixel_to_grid(px, py))
    }

    /// # Errors
    ///
    /// Returns `MapNotLoaded` before a map is loaded.
    pub fn grid_to_pixel(&self, gx: f64, gy: f64) -> Result<Point, SessionError> {
        Ok(self.transform()?.grid_to_pixel(gx, gy))
    }

    // =========================================================================
    // TOKENS
    // =========================================================================

    /// Move a token to grid position (`x`, `y`).
    ///
    /// # Errors
    ///
    /// `InvalidCoordinate`, `TokenNotFound`, or `Denied` unless the actor is
    /// the Seer or a controller of the token.
    pub fn move_token(&mut self, actor: &ParticipantId, id: TokenId, x: f64, y: f64) -> Result<(), SessionError> {
        self.move_token_from(actor, id, x, y, Origin::Local)
    }

    /// Add a token. Seer only. A token with an existing id replaces it.
    ///
    /// # Errors
    ///
    /// A validation error for the token, or `Denied`.
    pub fn add_token(&mut self, actor: &ParticipantId, token: Token) -> Result<TokenId, SessionError> {
        self.add_token_from(actor, token, Origin::Local)
    }

    /// Remove a token. Seer only.
    ///
    /// # Errors
    ///
    /// `TokenNotFound` or `Denied`.
    pub fn remove_token(&mut self, actor: &ParticipantId, id: TokenId) -> Result<(), SessionError> {
        self.remove_token_from(actor, id, Origin::Local)
    }

    /// Apply a sparse update. Controllers may patch position, size and
    /// display fields; changing `controlled_by` is reserved to the Seer.
    ///
    /// # Errors
    ///
    /// A validation error for the patch, `TokenNotFound`, or `Denied`.
    pub fn update_token(&mut self, actor: &ParticipantId, id: TokenId, patch: TokenPatch) -> Result<(), SessionError> {
        self.update_token_from(actor, id, patch, Origin::Local)
    }

    fn move_token_from(
        &mut self,
        actor: &ParticipantId,
        id: TokenId,
        x: f64,
        y: f64,
        origin: Origin,
    ) -> Result<(), SessionError> {
        ensure_finite("x", x)?;
        ensure_finite("y", y)?;
        let token = self.state.token(&id).ok_or(SessionError::TokenNotFound(id))?;
        self.guard.require_token_control(actor, token, Action::MoveToken)?;
        let next = store::with_token_moved(&self.state, id, x, y)?;
        self.commit(next, SessionEvent::TokenMoved { actor: actor.clone(), token_id: id, x, y }, origin);
        Ok(())
    }

    fn add_token_from(&mut self, actor: &ParticipantId, token: Token, origin: Origin) -> Result<TokenId, SessionError> {
        token.validate()?;
        self.guard.require_seer(actor, Action::AddToken)?;
        let id = token.id;
        let next = store::with_token_added(&self.state, token.clone());
        self.commit(next, SessionEvent::TokenAdded { actor: actor.clone(), token }, origin);
        Ok(id)
    }

    fn remove_token_from(&mut self, actor: &ParticipantId, id: TokenId, origin: Origin) -> Result<(), SessionError> {
        if self.state.token(&id).is_none() {
            return Err(SessionError::TokenNotFound(id));
        }
        self.guard.require_seer(actor, Action::RemoveToken)?;
        let next = store::with_token_removed(&self.state, id)?;
        self.commit(next, SessionEvent::TokenRemoved { actor: actor.clone(), token_id: id }, origin);
        Ok(())
    }

    fn update_token_from(
        &mut self,
        actor: &ParticipantId,
        id: TokenId,
        patch: TokenPatch,
        origin: Origin,
    ) -> Result<(), SessionError> {
        patch.validate()?;
        let token = self.state.token(&id).ok_or(SessionError::TokenNotFound(id))?;
        self.guard.require_token_control(actor, token, Action::UpdateToken)?;
        if patch.controlled_by.is_some() {
            self.guard.require_seer(actor, Action::UpdateToken)?;
        }
        let next = store::with_token_patched(&self.state, id, &patch)?;
        self.commit(next, SessionEvent::TokenUpdated { actor: actor.clone(), token_id: id, patch }, origin);
        Ok(())
    }

    // =========================================================================
    // FOG
    // =========================================================================

    /// Reveal a region. Seer only.
    ///
    /// # Errors
    ///
    /// A validation error for the region, or `Denied`.
    pub fn reveal_fog(&mut self, actor: &ParticipantId, region: FogRegion) -> Result<FogId, SessionError> {
        self.reveal_fog_from(actor, region, Origin::Local)
    }

    /// Hide the listed regions, or every region when `ids` is `None`. Seer
    /// only. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns `Denied` for non-Seer actors.
    pub fn hide_fog(&mut self, actor: &ParticipantId, ids: Option<Vec<FogId>>) -> Result<(), SessionError> {
        self.hide_fog_from(actor, ids, Origin::Local)
    }

    /// Drop every revealed region. Seer only.
    ///
    /// # Errors
    ///
    /// Returns `Denied` for non-Seer actors.
    pub fn reset_fog(&mut self, actor: &ParticipantId) -> Result<(), SessionError> {
        self.reset_fog_from(actor, Origin::Local)
    }

    fn reveal_fog_from(&mut self, actor: &ParticipantId, region: FogRegion, origin: Origin) -> Result<FogId, SessionError> {
        region.validate()?;
        self.guard.require_seer(actor, Action::RevealFog)?;
        let id = region.id;
        let next = store::with_fog_revealed(&self.state, region.clone());
        self.commit(next, SessionEvent::FogRevealed { actor: actor.clone(), region }, origin);
        Ok(id)
    }

    fn hide_fog_from(&mut self, actor: &ParticipantId, ids: Option<Vec<FogId>>, origin: Origin) -> Result<(), SessionError> {
        self.guard.require_seer(actor, Action::HideFog)?;
        let next = store::with_fog_hidden(&self.state, ids.as_deref());
        self.commit(next, SessionEvent::FogHidden { actor: actor.clone(), region_ids: ids }, origin);
        Ok(())
    }

    fn reset_fog_from(&mut self, actor: &ParticipantId, origin: Origin) -> Result<(), SessionError> {
        self.guard.require_seer(actor, Action::ResetFog)?;
        let next = store::with_fog_reset(&self.state);
        self.commit(next, SessionEvent::FogReset { actor: actor.clone() }, origin);
        Ok(())
    }

    // =========================================================================
    // DRAWINGS
    // =========================================================================

    /// Add a drawing on `layer`. The GM layer is Seer only. Drawings made by
    /// the local participant become undoable.
    ///
    /// # Errors
    ///
    /// Returns `Denied` when a non-Seer draws on the GM layer.
    pub fn add_drawing(
        &mut self,
        actor: &ParticipantId,
        layer: DrawingLayer,
        shape: serde_json::Value,
    ) -> Result<DrawingId, SessionError> {
        self.add_drawing_from(Drawing::new(layer, shape, actor.clone()), Origin::Local)
    }

    /// Remove a drawing. The Seer may remove anything; players only their
    /// own drawings on the shared layer.
    ///
    /// # Errors
    ///
    /// `DrawingNotFound` or `Denied`.
    pub fn remove_drawing(&mut self, actor: &ParticipantId, id: DrawingId) -> Result<(), SessionError> {
        self.remove_drawing_from(actor, id, Origin::Local)
    }

    /// Remove every drawing on `layer`. Seer only. The undo stack is left as
    /// is; undoing a cleared id later is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `Denied` for non-Seer actors.
    pub fn clear_drawings(&mut self, actor: &ParticipantId, layer: DrawingLayer) -> Result<(), SessionError> {
        self.clear_drawings_from(actor, layer, Origin::Local)
    }

    /// Remove the most recent drawing the local participant created.
    ///
    /// The id is popped whatever happens next. `Ok(None)` when the stack is
    /// empty or the drawing is already gone.
    ///
    /// # Errors
    ///
    /// Returns `Denied` under the same rule as [`VttSession::remove_drawing`].
    pub fn undo_drawing(&mut self) -> Result<Option<DrawingId>, SessionError> {
        let Some(id) = self.history.pop() else {
            return Ok(None);
        };
        if self.state.drawing(&id).is_none() {
            debug!(drawing_id = %id, "undo target already removed");
            return Ok(None);
        }
        let actor = self.local.clone();
        self.remove_drawing_from(&actor, id, Origin::Local)?;
        Ok(Some(id))
    }

    fn add_drawing_from(&mut self, drawing: Drawing, origin: Origin) -> Result<DrawingId, SessionError> {
        self.guard.require_drawing_add(&drawing.created_by, drawing.layer)?;
        let id = drawing.id;
        if origin == Origin::Local && drawing.created_by == self.local {
            self.history.push(id);
        }
        let next = store::with_drawing_added(&self.state, drawing.clone());
        self.commit(next, SessionEvent::DrawingAdded { drawing }, origin);
        Ok(id)
    }

    fn remove_drawing_from(&mut self, actor: &ParticipantId, id: DrawingId, origin: Origin) -> Result<(), SessionError> {
        let drawing = self.state.drawing(&id).ok_or(SessionError::DrawingNotFound(id))?;
        self.guard.require_drawing_remove(actor, drawing)?;
        let next = store::with_drawing_removed(&self.state, id)?;
        self.commit(next, SessionEvent::DrawingRemoved { actor: actor.clone(), drawing_id: id }, origin);
        Ok(())
    }

    fn clear_drawings_from(&mut self, actor: &ParticipantId, layer: DrawingLayer, origin: Origin) -> Result<(), SessionError> {
        self.guard.require_seer(actor, Action::ClearDrawings)?;
        let next = store::with_drawings_cleared(&self.state, layer);
        self.commit(next, SessionEvent::DrawingsCleared { actor: actor.clone(), layer }, origin);
        Ok(())
    }

    // =========================================================================
    // PINGS
    // =========================================================================

    /// Drop a ping at canvas position (`x`, `y`). Anyone may ping. The ping
    /// expires after the configured TTL, once the owner drives
    /// [`next_ping_expiry`](Self::next_ping_expiry) or
    /// [`process_due_pings`](Self::process_due_pings).
    ///
    /// # Errors
    ///
    /// `InvalidCoordinate`, or `NoRuntime` outside a tokio runtime.
    pub fn send_ping(
        &mut self,
        actor: &ParticipantId,
        x: f64,
        y: f64,
        color: Option<String>,
    ) -> Result<PingId, SessionError> {
        ensure_finite("x", x)?;
        ensure_finite("y", y)?;
        let color = color.unwrap_or_else(|| DEFAULT_PING_COLOR.to_owned());
        let ping = new_ping(actor.clone(), x, y, color, now_ms(), self.config.ping_ttl);
        let id = ping.id;
        self.timers.schedule(id, self.config.ping_ttl, Origin::Local)?;
        let next = store::with_ping_added(&self.state, ping.clone());
        self.commit(next, SessionEvent::PingCreated { ping }, Origin::Local);
        Ok(id)
    }

    /// Insert a ping created by another participant and schedule its removal
    /// at its own `expires_at`. A ping that has already expired is dropped.
    /// Emits nothing, now or on expiry. Returns whether the ping was kept.
    /// Removal needs the same driving as [`send_ping`](Self::send_ping).
    ///
    /// # Errors
    ///
    /// `InvalidCoordinate`, or `NoRuntime` outside a tokio runtime.
    pub fn add_ping(&mut self, ping: Ping) -> Result<bool, SessionError> {
        ensure_finite("x", ping.x)?;
        ensure_finite("y", ping.y)?;
        let Some(left) = remaining(&ping, now_ms()) else {
            debug!(ping_id = %ping.id, expires_at = ping.expires_at, "dropping expired remote ping");
            return Ok(false);
        };
        self.timers.schedule(ping.id, left, Origin::Remote)?;
        self.state = store::with_ping_added(&self.state, ping);
        Ok(true)
    }

    /// Remove a ping before it expires. The timer is cancelled first so the
    /// ping is removed exactly once.
    ///
    /// # Errors
    ///
    /// Returns `PingNotFound` when the ping is absent or already expired.
    pub fn remove_ping(&mut self, actor: &ParticipantId, id: PingId) -> Result<(), SessionError> {
        self.remove_ping_from(actor, id, Origin::Local)
    }

    fn remove_ping_from(&mut self, actor: &ParticipantId, id: PingId, origin: Origin) -> Result<(), SessionError> {
        self.timers.cancel(id);
        let next = store::with_ping_removed(&self.state, id).ok_or(SessionError::PingNotFound(id))?;
        self.commit(next, SessionEvent::PingRemoved { actor: actor.clone(), ping_id: id }, origin);
        Ok(())
    }

    /// Handle a fired timer. Returns true when the ping was removed; stale
    /// timers (cancelled or rescheduled after firing) are ignored. Only pings
    /// sent from this session announce `PingExpired`.
    pub fn expire_ping(&mut self, expiry: Expiry) -> bool {
        let Some(origin) = self.timers.claim(expiry) else {
            return false;
        };
        match store::with_ping_removed(&self.state, expiry.id) {
            Some(next) => {
                self.commit(next, SessionEvent::PingExpired { ping_id: expiry.id }, origin);
                true
            }
            None => false,
        }
    }

    /// Wait for the next ping to expire and remove it. Returns `None` only if
    /// the timer channel closes, which cannot happen while the session lives.
    pub async fn next_ping_expiry(&mut self) -> Option<PingId> {
        loop {
            let expiry = self.timers.next_expiry().await?;
            if self.expire_ping(expiry) {
                return Some(expiry.id);
            }
        }
    }

    /// Remove every ping whose timer has already fired, without waiting.
    pub fn process_due_pings(&mut self) -> usize {
        let mut removed = 0;
        while let Some(expiry) = self.timers.try_next_expiry() {
            if self.expire_ping(expiry) {
                removed += 1;
            }
        }
        removed
    }

    #[must_use]
    pub fn pending_ping_timers(&self) -> usize {
        self.timers.pending_count()
    }

    // =========================================================================
    // VIEWPORT
    // =========================================================================

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// # Errors
    ///
    /// Returns `InvalidCoordinate` for a non-finite or non-positive scale.
    pub fn set_scale(&mut self, scale: f64) -> Result<(), SessionError> {
        self.viewport.set_scale(scale)
    }

    /// # Errors
    ///
    /// Returns `InvalidCoordinate` for non-finite offsets.
    pub fn set_pan(&mut self, x: f64, y: f64) -> Result<(), SessionError> {
        self.viewport.set_pan(x, y)
    }

    /// # Errors
    ///
    /// Returns `InvalidCoordinate` for non-finite deltas.
    pub fn pan_by(&mut self, dx: f64, dy: f64) -> Result<(), SessionError> {
        self.viewport.pan_by(dx, dy)
    }

    pub fn reset_viewport(&mut self) {
        self.viewport.reset();
    }

    /// Pan so the token's footprint center sits in the middle of the canvas.
    ///
    /// # Errors
    ///
    /// `MapNotLoaded` or `TokenNotFound`.
    pub fn center_on_token(&mut self, id: &TokenId) -> Result<(), SessionError> {
        let transform = self.transform()?;
        let token = self.state.token(id).ok_or(SessionError::TokenNotFound(*id))?;
        let center = transform.token_center(token);
        self.viewport.center_on(center);
        Ok(())
    }

    // =========================================================================
    // MEASUREMENT
    // =========================================================================

    #[must_use]
    pub fn measurement(&self) -> Option<&Measurement> {
        self.measurement.as_ref()
    }

    /// # Errors
    ///
    /// Returns `InvalidCoordinate` for non-finite input.
    pub fn start_measurement(&mut self, x: f64, y: f64) -> Result<(), SessionError> {
        self.measurement = Some(Measurement::start(x, y)?);
        Ok(())
    }

    /// Move the ruler's end point. Returns the new pixel distance, or `None`
    /// when no measurement is in progress.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCoordinate` for non-finite input.
    pub fn update_measurement(&mut self, x: f64, y: f64) -> Result<Option<f64>, SessionError> {
        match self.measurement.as_mut() {
            Some(measurement) => {
                measurement.update(x, y)?;
                Ok(Some(measurement.distance))
            }
            None => Ok(None),
        }
    }

    pub fn clear_measurement(&mut self) {
        self.measurement = None;
    }

    /// Current ruler length in grid cells of the loaded map.
    ///
    /// # Errors
    ///
    /// Returns `MapNotLoaded` before a map is loaded.
    pub fn measurement_in_cells(&self) -> Result<Option<f64>, SessionError> {
        let cell = self.transform()?.cell_size();
        Ok(self.measurement.map(|m| m.distance_in_cells(cell)))
    }

    // =========================================================================
    // REMOTE EVENTS
    // =========================================================================

    /// Apply an event broadcast by another participant. The same validation
    /// and authorization rules apply, checked against the event's actor.
    /// Nothing is dispatched.
    ///
    /// # Errors
    ///
    /// Whatever the equivalent local mutation would return.
    pub fn apply_remote(&mut self, event: SessionEvent) -> Result<(), SessionError> {
        debug!(kind = event.kind(), "applying remote event");
        match event {
            SessionEvent::TokenMoved { actor, token_id, x, y } => {
                self.move_token_from(&actor, token_id, x, y, Origin::Remote)
            }
            SessionEvent::TokenAdded { actor, token } => self.add_token_from(&actor, token, Origin::Remote).map(drop),
            SessionEvent::TokenRemoved { actor, token_id } => self.remove_token_from(&actor, token_id, Origin::Remote),
            SessionEvent::TokenUpdated { actor, token_id, patch } => {
                self.update_token_from(&actor, token_id, patch, Origin::Remote)
            }
            SessionEvent::FogRevealed { actor, region } => self.reveal_fog_from(&actor, region, Origin::Remote).map(drop),
            SessionEvent::FogHidden { actor, region_ids } => self.hide_fog_from(&actor, region_ids, Origin::Remote),
            SessionEvent::FogReset { actor } => self.reset_fog_from(&actor, Origin::Remote),
            SessionEvent::DrawingAdded { drawing } => self.add_drawing_from(drawing, Origin::Remote).map(drop),
            SessionEvent::DrawingRemoved { actor, drawing_id } => {
                self.remove_drawing_from(&actor, drawing_id, Origin::Remote)
            }
            SessionEvent::DrawingsCleared { actor, layer } => self.clear_drawings_from(&actor, layer, Origin::Remote),
            SessionEvent::PingCreated { ping } => self.add_ping(ping).map(drop),
            SessionEvent::PingRemoved { actor, ping_id } => self.remove_ping_from(&actor, ping_id, Origin::Remote),
            SessionEvent::PingExpired { ping_id } => {
                // Our own timer covers this ping; only drop a straggler.
                self.timers.cancel(ping_id);
                if let Some(next) = store::with_ping_removed(&self.state, ping_id) {
                    self.state = next;
                }
                Ok(())
            }
        }
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn commit(&mut self, next: SessionMapState, event: SessionEvent, origin: Origin) {
        self.state = next;
        match origin {
            Origin::Local => {
                debug!(kind = event.kind(), "mutation applied");
                self.dispatcher.dispatch(&event);
            }
            Origin::Remote => debug!(kind = event.kind(), "remote mutation applied"),
        }
    }
}
