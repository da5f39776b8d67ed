//! Dispatcher — typed events fired once per accepted mutation.
//!
//! ARCHITECTURE
//! ============
//! The session emits a [`SessionEvent`] after every accepted mutation and
//! never for a rejected one. Listeners run synchronously, in registration
//! order, on the session's thread. Anything slow (network broadcast,
//! persistence) belongs behind an [`EventForwarder`], which hands events to
//! a bounded channel with `try_send` so a mutation never waits on the
//! transport.
//!
//! [`Callbacks`] adapts the event stream to per-kind optional closures for
//! hosts that prefer one sink per notification.

#[cfg(test)]
#[path = "events_test.rs"]
mod events_test;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;

use crate::model::{Drawing, DrawingId, DrawingLayer, FogId, FogRegion, ParticipantId, Ping, PingId, Token, TokenId, TokenPatch};

// =============================================================================
// EVENTS
// =============================================================================

/// One accepted change to the session map.
/// Whether a change originated on this participant and must be announced,
/// or arrived from another participant and is applied silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Local,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    TokenMoved { actor: ParticipantId, token_id: TokenId, x: f64, y: f64 },
    TokenAdded { actor: ParticipantId, token: Token },
    TokenRemoved { actor: ParticipantId, token_id: TokenId },
    TokenUpdated { actor: ParticipantId, token_id: TokenId, patch: TokenPatch },
    FogRevealed { actor: ParticipantId, region: FogRegion },
    /// `region_ids: None` hides every revealed region.
    FogHidden { actor: ParticipantId, region_ids: Option<Vec<FogId>> },
    FogReset { actor: ParticipantId },
    DrawingAdded { drawing: Drawing },
    DrawingRemoved { actor: ParticipantId, drawing_id: DrawingId },
    DrawingsCleared { actor: ParticipantId, layer: DrawingLayer },
    PingCreated { ping: Ping },
    PingExpired { ping_id: PingId },
    PingRemoved { actor: ParticipantId, ping_id: PingId },
}

impl SessionEvent {
    /// Short stable name, used as the transport's syscall suffix and in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TokenMoved { .. } => "token_moved",
            Self::TokenAdded { .. } => "token_added",
            Self::TokenRemoved { .. } => "token_removed",
            Self::TokenUpdated { .. } => "token_updated",
            Self::FogRevealed { .. } => "fog_revealed",
            Self::FogHidden { .. } => "fog_hidden",
            Self::FogReset { .. } => "fog_reset",
            Self::DrawingAdded { .. } => "drawing_added",
            Self::DrawingRemoved { .. } => "drawing_removed",
            Self::DrawingsCleared { .. } => "drawings_cleared",
            Self::PingCreated { .. } => "ping_created",
            Self::PingExpired { .. } => "ping_expired",
            Self::PingRemoved { .. } => "ping_removed",
        }
    }
}

// =============================================================================
// LISTENERS
// =============================================================================

/// Receives session events synchronously. Implementations must not block.
pub trait SessionListener: Send + Sync {
    fn on_event(&self, event: &SessionEvent);
}

impl<F> SessionListener for F
where
    F: Fn(&SessionEvent) + Send + Sync,
{
    fn on_event(&self, event: &SessionEvent) {
        self(event);
    }
}

/// Fan-out of events to registered listeners.
#[derive(Default, Clone)]
pub struct Dispatcher {
    listeners: Vec<Arc<dyn SessionListener>>,
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Arc<dyn SessionListener>) {
        self.listeners.push(listener);
    }

    pub fn dispatch(&self, event: &SessionEvent) {
        tracing::trace!(kind = event.kind(), listeners = self.listeners.len(), "dispatching session event");
        for listener in &self.listeners {
            listener.on_event(event);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

// =============================================================================
// CHANNEL FORWARDER
// =============================================================================

/// Best-effort, non-blocking bridge from the dispatcher to an async consumer.
///
/// Full or closed queues drop the event with a warning; the realtime layer
/// resyncs from a full snapshot when it falls behind.
#[derive(Debug, Clone)]
pub struct EventForwarder {
    tx: mpsc::Sender<SessionEvent>,
}

impl EventForwarder {
    /// Create a forwarder with a bounded queue and return its receiving end.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<SessionEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl SessionListener for EventForwarder {
    fn on_event(&self, event: &SessionEvent) {
        match self.tx.try_send(event.clone()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(kind = event.kind(), "session event queue full; dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!(kind = event.kind(), "session event queue closed; dropping event");
            }
        }
    }
}

// =============================================================================
// CALLBACKS
// =============================================================================

/// Optional per-notification sinks. Unset sinks are skipped.
#[derive(Default)]
pub struct Callbacks {
    on_token_move: Option<Box<dyn Fn(TokenId, f64, f64) + Send + Sync>>,
    on_token_add: Option<Box<dyn Fn(&Token) + Send + Sync>>,
    on_token_remove: Option<Box<dyn Fn(TokenId) + Send + Sync>>,
    on_token_update: Option<Box<dyn Fn(TokenId, &TokenPatch) + Send + Sync>>,
    on_fog_reveal: Option<Box<dyn Fn(&FogRegion) + Send + Sync>>,
    on_fog_hide: Option<Box<dyn Fn(Option<&[FogId]>) + Send + Sync>>,
    on_fog_reset: Option<Box<dyn Fn() + Send + Sync>>,
    on_drawing_add: Option<Box<dyn Fn(&Drawing) + Send + Sync>>,
    on_drawing_remove: Option<Box<dyn Fn(DrawingId) + Send + Sync>>,
    on_drawings_clear: Option<Box<dyn Fn(DrawingLayer) + Send + Sync>>,
    on_ping: Option<Box<dyn Fn(&Ping) + Send + Sync>>,
}

impl Callbacks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_token_move(mut self, f: impl Fn(TokenId, f64, f64) + Send + Sync + 'static) -> Self {
        self.on_token_move = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_token_add(mut self, f: impl Fn(&Token) + Send + Sync + 'static) -> Self {
        self.on_token_add = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_token_remove(mut self, f: impl Fn(TokenId) + Send + Sync + 'static) -> Self {
        self.on_token_remove = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_token_update(mut self, f: impl Fn(TokenId, &TokenPatch) + Send + Sync + 'static) -> Self {
        self.on_token_update = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_fog_reveal(mut self, f: impl Fn(&FogRegion) + Send + Sync + 'static) -> Self {
        self.on_fog_reveal = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_fog_hide(mut self, f: impl Fn(Option<&[FogId]>) + Send + Sync + 'static) -> Self {
        self.on_fog_hide = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_fog_reset(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_fog_reset = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_drawing_add(mut self, f: impl Fn(&Drawing) + Send + Sync + 'static) -> Self {
        self.on_drawing_add = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_drawing_remove(mut self, f: impl Fn(DrawingId) + Send + Sync + 'static) -> Self {
        self.on_drawing_remove = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_drawings_clear(mut self, f: impl Fn(DrawingLayer) + Send + Sync + 'static) -> Self {
        self.on_drawings_clear = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_ping(mut self, f: impl Fn(&Ping) + Send + Sync + 'static) -> Self {
        self.on_ping = Some(Box::new(f));
        self
    }
}

impl SessionListener for Callbacks {
    fn on_event(&self, event: &SessionEvent) {
        match event {
            SessionEvent::TokenMoved { token_id, x, y, .. } => {
                if let Some(f) = &self.on_token_move {
                    f(*token_id, *x, *y);
                }
            }
            SessionEvent::TokenAdded { token, .. } => {
                if let Some(f) = &self.on_token_add {
                    f(token);
                }
            }
            SessionEvent::TokenRemoved { token_id, .. } => {
                if let Some(f) = &self.on_token_remove {
                    f(*token_id);
                }
            }
            SessionEvent::TokenUpdated { token_id, patch, .. } => {
                if let Some(f) = &self.on_token_update {
                    f(*token_id, patch);
                }
            }
            SessionEvent::FogRevealed { region, .. } => {
                if let Some(f) = &self.on_fog_reveal {
                    f(region);
                }
            }
            SessionEvent::FogHidden { region_ids, .. } => {
                if let Some(f) = &self.on_fog_hide {
                    f(region_ids.as_deref());
                }
            }
            SessionEvent::FogReset { .. } => {
                if let Some(f) = &self.on_fog_reset {
                    f();
                }
            }
            SessionEvent::DrawingAdded { drawing } => {
                if let Some(f) = &self.on_drawing_add {
                    f(drawing);
                }
            }
            SessionEvent::DrawingRemoved { drawing_id, .. } => {
                if let Some(f) = &self.on_drawing_remove {
                    f(*drawing_id);
                }
            }
            SessionEvent::DrawingsCleared { layer, .. } => {
                if let Some(f) = &self.on_drawings_clear {
                    f(*layer);
                }
            }
            SessionEvent::PingCreated { ping } => {
                if let Some(f) = &self.on_ping {
                    f(ping);
                }
            }
            // No sink; the event stream still carries these.
            SessionEvent::PingExpired { .. } | SessionEvent::PingRemoved { .. } => {}
        }
    }
}
