//! Ephemeral overlay manager — one cancellable expiry timer per ping.
//!
//! DESIGN
//! ======
//! Each scheduled ping gets a tokio task that sleeps until expiry and then
//! posts an [`Expiry`] back to the owning session over an unbounded channel.
//! The session is the single writer: it only removes the ping if
//! [`PingTimers::claim`] confirms the expiry still matches the pending entry.
//!
//! Explicit removal calls [`PingTimers::cancel`] before touching state. A
//! timer that already fired and is sitting in the channel then fails its
//! claim and becomes a no-op, so every ping is removed exactly once.
//! Generations keep a stale expiry from removing a ping that was re-added
//! under the same id.

#[cfg(test)]
#[path = "pings_test.rs"]
mod pings_test;

use std::collections::HashMap;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use uuid::Uuid;

use crate::error::SessionError;
use crate::events::Origin;
use crate::model::{ParticipantId, Ping, PingId};

/// Timer fired for a ping. Only meaningful to the `PingTimers` that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiry {
    pub id: PingId,
    generation: u64,
}

struct PendingExpiry {
    generation: u64,
    handle: AbortHandle,
    origin: Origin,
}

/// Pending expiry timers keyed by ping id.
pub struct PingTimers {
    pending: HashMap<PingId, PendingExpiry>,
    next_generation: u64,
    expiry_tx: mpsc::UnboundedSender<Expiry>,
    expiry_rx: mpsc::UnboundedReceiver<Expiry>,
}

impl PingTimers {
    #[must_use]
    pub fn new() -> Self {
        let (expiry_tx, expiry_rx) = mpsc::unbounded_channel();
        Self { pending: HashMap::new(), next_generation: 0, expiry_tx, expiry_rx }
    }

    /// Schedule removal of `id` after `after`. Replaces any pending timer for
    /// the same id.
    ///
    /// # Errors
    ///
    /// Returns `NoRuntime` when called outside a tokio runtime; nothing is
    /// scheduled or cancelled in that case.
    pub fn schedule(&mut self, id: PingId, after: Duration, origin: Origin) -> Result<(), SessionError> {
        let runtime = Handle::try_current().map_err(|_| SessionError::NoRuntime)?;
        self.cancel(id);
        self.next_generation += 1;
        let generation = self.next_generation;
        let tx = self.expiry_tx.clone();
        let task = runtime.spawn(async move {
            tokio::time::sleep(after).await;
            if tx.send(Expiry { id, generation }).is_err() {
                tracing::trace!(ping_id = %id, "ping timer fired after session closed");
            }
        });
        self.pending.insert(id, PendingExpiry { generation, handle: task.abort_handle(), origin });
        Ok(())
    }

    /// Cancel the pending timer for `id`. Returns whether one was pending.
    pub fn cancel(&mut self, id: PingId) -> bool {
        match self.pending.remove(&id) {
            Some(pending) => {
                pending.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Consume a fired expiry. Returns the origin the timer was scheduled
    /// with exactly once per timer, and `None` if it was cancelled or
    /// superseded meanwhile.
    pub fn claim(&mut self, expiry: Expiry) -> Option<Origin> {
        match self.pending.get(&expiry.id) {
            Some(pending) if pending.generation == expiry.generation => {
                self.pending.remove(&expiry.id).map(|pending| pending.origin)
            }
            _ => None,
        }
    }

    /// Wait for the next timer to fire.
    pub async fn next_expiry(&mut self) -> Option<Expiry> {
        self.expiry_rx.recv().await
    }

    /// Take an already fired expiry without waiting.
    pub fn try_next_expiry(&mut self) -> Option<Expiry> {
        match self.expiry_rx.try_recv() {
            Ok(expiry) => Some(expiry),
            Err(_) => None,
        }
    }

    #[must_use]
    pub fn is_pending(&self, id: &PingId) -> bool {
        self.pending.contains_key(id)
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Abort every pending timer.
    pub fn cancel_all(&mut self) {
        for (_, pending) in self.pending.drain() {
            pending.handle.abort();
        }
    }
}

impl Default for PingTimers {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PingTimers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

// =============================================================================
// PING CONSTRUCTION
// =============================================================================

/// Build a locally created ping expiring `ttl` after `now_ms`.
#[must_use]
pub fn new_ping(created_by: ParticipantId, x: f64, y: f64, color: String, now_ms: i64, ttl: Duration) -> Ping {
    let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
    Ping {
        id: Uuid::new_v4(),
        x,
        y,
        color,
        created_by,
        created_at: now_ms,
        expires_at: now_ms.saturating_add(ttl_ms),
    }
}

/// Time left before `ping` expires, measured against `now_ms`. `None` once
/// the expiry time has passed.
#[must_use]
pub fn remaining(ping: &Ping, now_ms: i64) -> Option<Duration> {
    match u64::try_from(ping.expires_at.saturating_sub(now_ms)) {
        Ok(ms) if ms > 0 => Some(Duration::from_millis(ms)),
        _ => None,
    }
}
