//! Session actor — one tokio task per session, the single serialized writer.
//!
//! DESIGN
//! ======
//! `spawn_session` moves a [`VttSession`] onto its own task. Callers talk to
//! it through a cloneable [`SessionHandle`] that sends [`Command`]s over a
//! bounded mpsc queue and awaits a oneshot reply. The task `select!`s
//! between the command queue and the session's ping expiries, so a timer
//! firing and an explicit `remove_ping` are never interleaved.
//!
//! The task exits once every handle is dropped. Pending ping timers are
//! aborted with the session.
//!
//! ERROR HANDLING
//! ==============
//! Session errors are returned unchanged. A closed queue or a dropped reply
//! surfaces as `ActorClosed`, the only retryable error.

#[cfg(test)]
#[path = "actor_test.rs"]
mod actor_test;

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace};

use crate::error::SessionError;
use crate::events::{EventForwarder, SessionEvent, SessionListener};
use crate::model::{
    DrawingId, DrawingLayer, FogId, FogRegion, GridMap, ParticipantId, Ping, PingId, SessionMapState, Token, TokenId,
    TokenPatch,
};
use crate::session::VttSession;

type Reply<T> = oneshot::Sender<Result<T, SessionError>>;
type Job = Box<dyn FnOnce(&mut VttSession) + Send>;

// =============================================================================
// COMMANDS
// =============================================================================

/// One request to the session task.
pub enum Command {
    LoadMap { map: GridMap, reply: Reply<()> },
    LoadState { seed: SessionMapState, reply: Reply<()> },
    MoveToken { actor: ParticipantId, id: TokenId, x: f64, y: f64, reply: Reply<()> },
    AddToken { actor: ParticipantId, token: Token, reply: Reply<TokenId> },
    RemoveToken { actor: ParticipantId, id: TokenId, reply: Reply<()> },
    UpdateToken { actor: ParticipantId, id: TokenId, patch: TokenPatch, reply: Reply<()> },
    RevealFog { actor: ParticipantId, region: FogRegion, reply: Reply<FogId> },
    HideFog { actor: ParticipantId, ids: Option<Vec<FogId>>, reply: Reply<()> },
    ResetFog { actor: ParticipantId, reply: Reply<()> },
    AddDrawing { actor: ParticipantId, layer: DrawingLayer, shape: serde_json::Value, reply: Reply<DrawingId> },
    RemoveDrawing { actor: ParticipantId, id: DrawingId, reply: Reply<()> },
    ClearDrawings { actor: ParticipantId, layer: DrawingLayer, reply: Reply<()> },
    UndoDrawing { reply: Reply<Option<DrawingId>> },
    SendPing { actor: ParticipantId, x: f64, y: f64, color: Option<String>, reply: Reply<PingId> },
    AddPing { ping: Ping, reply: Reply<bool> },
    RemovePing { actor: ParticipantId, id: PingId, reply: Reply<()> },
    ApplyRemote { event: SessionEvent, reply: Reply<()> },
    Subscribe { listener: Arc<dyn SessionListener>, reply: Reply<()> },
    Forward { reply: Reply<mpsc::Receiver<SessionEvent>> },
    Snapshot { reply: Reply<SessionMapState> },
    /// Run an arbitrary closure against the session (queries, viewport and
    /// ruler updates). The closure replies on its own channel.
    Run(Job),
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::LoadMap { .. } => "load_map",
            Self::LoadState { .. } => "load_state",
            Self::MoveToken { .. } => "move_token",
            Self::AddToken { .. } => "add_token",
            Self::RemoveToken { .. } => "remove_token",
            Self::UpdateToken { .. } => "update_token",
            Self::RevealFog { .. } => "reveal_fog",
            Self::HideFog { .. } => "hide_fog",
            Self::ResetFog { .. } => "reset_fog",
            Self::AddDrawing { .. } => "add_drawing",
            Self::RemoveDrawing { .. } => "remove_drawing",
            Self::ClearDrawings { .. } => "clear_drawings",
            Self::UndoDrawing { .. } => "undo_drawing",
            Self::SendPing { .. } => "send_ping",
            Self::AddPing { .. } => "add_ping",
            Self::RemovePing { .. } => "remove_ping",
            Self::ApplyRemote { .. } => "apply_remote",
            Self::Subscribe { .. } => "subscribe",
            Self::Forward { .. } => "forward",
            Self::Snapshot { .. } => "snapshot",
            Self::Run(_) => "run",
        }
    }
}

// =============================================================================
// TASK
// =============================================================================

/// Move `session` onto its own task and return a handle to it.
///
/// Must be called from within a tokio runtime.
#[must_use]
pub fn spawn_session(session: VttSession) -> SessionHandle {
    let capacity = session.config().command_queue_capacity.max(1);
    let (tx, rx) = mpsc::channel(capacity);
    info!(seer = %session.seer(), local = %session.local_actor(), capacity, "session actor started");
    tokio::spawn(run(session, rx));
    SessionHandle { tx }
}

async fn run(mut session: VttSession, mut rx: mpsc::Receiver<Command>) {
    loop {
        tokio::select! {
            command = rx.recv() => match command {
                Some(command) => handle(&mut session, command),
                None => break,
            },
            Some(ping_id) = session.next_ping_expiry() => {
                trace!(%ping_id, "ping expired");
            }
        }
    }
    info!(local = %session.local_actor(), "session actor stopped");
}

fn handle(session: &mut VttSession, command: Command) {
    let name = command.name();
    trace!(command = name, "session command");
    let delivered = match command {
        Command::LoadMap { map, reply } => reply.send(session.load_map(map)).is_ok(),
        Command::LoadState { seed, reply } => reply.send(session.load_session_state(seed)).is_ok(),
        Command::MoveToken { actor, id, x, y, reply } => reply.send(session.move_token(&actor, id, x, y)).is_ok(),
        Command::AddToken { actor, token, reply } => reply.send(session.add_token(&actor, token)).is_ok(),
        Command::RemoveToken { actor, id, reply } => reply.send(session.remove_token(&actor, id)).is_ok(),
        Command::UpdateToken { actor, id, patch, reply } => {
            reply.send(session.update_token(&actor, id, patch)).is_ok()
        }
        Command::RevealFog { actor, region, reply } => reply.send(session.reveal_fog(&actor, region)).is_ok(),
        Command::HideFog { actor, ids, reply } => reply.send(session.hide_fog(&actor, ids)).is_ok(),
        Command::ResetFog { actor, reply } => reply.send(session.reset_fog(&actor)).is_ok(),
        Command::AddDrawing { actor, layer, shape, reply } => {
            reply.send(session.add_drawing(&actor, layer, shape)).is_ok()
        }
        Command::RemoveDrawing { actor, id, reply } => reply.send(session.remove_drawing(&actor, id)).is_ok(),
        Command::ClearDrawings { actor, layer, reply } => reply.send(session.clear_drawings(&actor, layer)).is_ok(),
        Command::UndoDrawing { reply } => reply.send(session.undo_drawing()).is_ok(),
        Command::SendPing { actor, x, y, color, reply } => reply.send(session.send_ping(&actor, x, y, color)).is_ok(),
        Command::AddPing { ping, reply } => reply.send(session.add_ping(ping)).is_ok(),
        Command::RemovePing { actor, id, reply } => reply.send(session.remove_ping(&actor, id)).is_ok(),
        Command::ApplyRemote { event, reply } => reply.send(session.apply_remote(event)).is_ok(),
        Command::Subscribe { listener, reply } => {
            session.subscribe(listener);
            reply.send(Ok(())).is_ok()
        }
        Command::Forward { reply } => {
            let (forwarder, events) = EventForwarder::channel(session.config().event_queue_capacity.max(1));
            session.subscribe(Arc::new(forwarder));
            reply.send(Ok(events)).is_ok()
        }
        Command::Snapshot { reply } => reply.send(Ok(session.state().clone())).is_ok(),
        Command::Run(job) => {
            job(session);
            true
        }
    };
    if !delivered {
        debug!(command = name, "caller dropped before reply");
    }
}

// =============================================================================
// HANDLE
// =============================================================================

/// Cloneable front door to a running session task.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Command>,
}

impl SessionHandle {
    /// True once the session task has stopped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> Command) -> Result<T, SessionError> {
        let (reply, response) = oneshot::channel();
        self.tx.send(build(reply)).await.map_err(|_| SessionError::ActorClosed)?;
        response.await.map_err(|_| SessionError::ActorClosed)?
    }

    /// Run `f` on the session task and return its result.
    ///
    /// # Errors
    ///
    /// Returns `ActorClosed` if the task has stopped.
    pub async fn run<R, F>(&self, f: F) -> Result<R, SessionError>
    where
        R: Send + 'static,
        F: FnOnce(&mut VttSession) -> R + Send + 'static,
    {
        let (reply, response) = oneshot::channel();
        let job: Job = Box::new(move |session| {
            if reply.send(f(session)).is_err() {
                trace!("run caller dropped before reply");
            }
        });
        self.tx.send(Command::Run(job)).await.map_err(|_| SessionError::ActorClosed)?;
        response.await.map_err(|_| SessionError::ActorClosed)
    }

    // --- loading ---

    /// # Errors
    ///
    /// See [`VttSession::load_map`], plus `ActorClosed`.
    pub async fn load_map(&self, map: GridMap) -> Result<(), SessionError> {
        self.request(|reply| Command::LoadMap { map, reply }).await
    }

    /// # Errors
    ///
    /// See [`VttSession::load_session_state`], plus `ActorClosed`.
    pub async fn load_session_state(&self, seed: SessionMapState) -> Result<(), SessionError> {
        self.request(|reply| Command::LoadState { seed, reply }).await
    }

    // --- tokens ---

    /// # Errors
    ///
    /// See [`VttSession::move_token`], plus `ActorClosed`.
    pub async fn move_token(&self, actor: ParticipantId, id: TokenId, x: f64, y: f64) -> Result<(), SessionError> {
        self.request(|reply| Command::MoveToken { actor, id, x, y, reply }).await
    }

    /// # Errors
    ///
    /// See [`VttSession::add_token`], plus `ActorClosed`.
    pub async fn add_token(&self, actor: ParticipantId, token: Token) -> Result<TokenId, SessionError> {
        self.request(|reply| Command::AddToken { actor, token, reply }).await
    }

    /// # Errors
    ///
    /// See [`VttSession::remove_token`], plus `ActorClosed`.
    pub async fn remove_token(&self, actor: ParticipantId, id: TokenId) -> Result<(), SessionError> {
        self.request(|reply| Command::RemoveToken { actor, id, reply }).await
    }

    /// # Errors
    ///
    /// See [`VttSession::update_token`], plus `ActorClosed`.
    pub async fn update_token(&self, actor: ParticipantId, id: TokenId, patch: TokenPatch) -> Result<(), SessionError> {
        self.request(|reply| Command::UpdateToken { actor, id, patch, reply }).await
    }

    // --- fog ---

    /// # Errors
    ///
    /// See [`VttSession::reveal_fog`], plus `ActorClosed`.
    pub async fn reveal_fog(&self, actor: ParticipantId, region: FogRegion) -> Result<FogId, SessionError> {
        self.request(|reply| Command::RevealFog { actor, region, reply }).await
    }

    /// # Errors
    ///
    /// See [`VttSession::hide_fog`], plus `ActorClosed`.
    pub async fn hide_fog(&self, actor: ParticipantId, ids: Option<Vec<FogId>>) -> Result<(), SessionError> {
        self.request(|reply| Command::HideFog { actor, ids, reply }).await
    }

    /// # Errors
    ///
    /// See [`VttSession::reset_fog`], plus `ActorClosed`.
    pub async fn reset_fog(&self, actor: ParticipantId) -> Result<(), SessionError> {
        self.request(|reply| Command::ResetFog { actor, reply }).await
    }

    // --- drawings ---

    /// # Errors
    ///
    /// See [`VttSession::add_drawing`], plus `ActorClosed`.
    pub async fn add_drawing(
        &self,
        actor: ParticipantId,
        layer: DrawingLayer,
        shape: serde_json::Value,
    ) -> Result<DrawingId, SessionError> {
        self.request(|reply| Command::AddDrawing { actor, layer, shape, reply }).await
    }

    /// # Errors
    ///
    /// See [`VttSession::remove_drawing`], plus `ActorClosed`.
    pub async fn remove_drawing(&self, actor: ParticipantId, id: DrawingId) -> Result<(), SessionError> {
        self.request(|reply| Command::RemoveDrawing { actor, id, reply }).await
    }

    /// # Errors
    ///
    /// See [`VttSession::clear_drawings`], plus `ActorClosed`.
    pub async fn clear_drawings(&self, actor: ParticipantId, layer: DrawingLayer) -> Result<(), SessionError> {
        self.request(|reply| Command::ClearDrawings { actor, layer, reply }).await
    }

    /// # Errors
    ///
    /// See [`VttSession::undo_drawing`], plus `ActorClosed`.
    pub async fn undo_drawing(&self) -> Result<Option<DrawingId>, SessionError> {
        self.request(|reply| Command::UndoDrawing { reply }).await
    }

    // --- pings ---

    /// # Errors
    ///
    /// See [`VttSession::send_ping`], plus `ActorClosed`.
    pub async fn send_ping(
        &self,
        actor: ParticipantId,
        x: f64,
        y: f64,
        color: Option<String>,
    ) -> Result<PingId, SessionError> {
        self.request(|reply| Command::SendPing { actor, x, y, color, reply }).await
    }

    /// # Errors
    ///
    /// See [`VttSession::add_ping`], plus `ActorClosed`.
    pub async fn add_ping(&self, ping: Ping) -> Result<bool, SessionError> {
        self.request(|reply| Command::AddPing { ping, reply }).await
    }

    /// # Errors
    ///
    /// See [`VttSession::remove_ping`], plus `ActorClosed`.
    pub async fn remove_ping(&self, actor: ParticipantId, id: PingId) -> Result<(), SessionError> {
        self.request(|reply| Command::RemovePing { actor, id, reply }).await
    }

    // --- sync ---

    /// # Errors
    ///
    /// See [`VttSession::apply_remote`], plus `ActorClosed`.
    pub async fn apply_remote(&self, event: SessionEvent) -> Result<(), SessionError> {
        self.request(|reply| Command::ApplyRemote { event, reply }).await
    }

    /// # Errors
    ///
    /// Returns `ActorClosed` if the task has stopped.
    pub async fn subscribe(&self, listener: Arc<dyn SessionListener>) -> Result<(), SessionError> {
        self.request(|reply| Command::Subscribe { listener, reply }).await
    }

    /// Open a bounded event stream sized by `event_queue_capacity`. Events
    /// are dropped, not queued, when the receiver falls behind.
    ///
    /// # Errors
    ///
    /// Returns `ActorClosed` if the task has stopped.
    pub async fn events(&self) -> Result<mpsc::Receiver<SessionEvent>, SessionError> {
        self.request(|reply| Command::Forward { reply }).await
    }

    /// # Errors
    ///
    /// Returns `ActorClosed` if the task has stopped.
    pub async fn snapshot(&self) -> Result<SessionMapState, SessionError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }
}
