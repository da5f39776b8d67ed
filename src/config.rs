//! Session tuning parsed from environment variables.

use std::time::Duration;

use crate::consts::{DEFAULT_COMMAND_QUEUE_CAPACITY, DEFAULT_EVENT_QUEUE_CAPACITY, DEFAULT_PING_TTL_MS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Lifetime of a locally created ping.
    pub ping_ttl: Duration,
    /// Bounded capacity of the session actor's command queue.
    pub command_queue_capacity: usize,
    /// Bounded capacity of event forwarding queues created for the session.
    pub event_queue_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ping_ttl: Duration::from_millis(DEFAULT_PING_TTL_MS),
            command_queue_capacity: DEFAULT_COMMAND_QUEUE_CAPACITY,
            event_queue_capacity: DEFAULT_EVENT_QUEUE_CAPACITY,
        }
    }
}

impl SessionConfig {
    /// Build config from environment variables, falling back to defaults for
    /// anything missing or unparsable.
    ///
    /// Optional:
    /// - `VTT_PING_TTL_MS`: default 3000
    /// - `VTT_COMMAND_QUEUE_CAPACITY`: default 256
    /// - `VTT_EVENT_QUEUE_CAPACITY`: default 1024
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            ping_ttl: Duration::from_millis(env_parse("VTT_PING_TTL_MS", DEFAULT_PING_TTL_MS)),
            command_queue_capacity: env_parse("VTT_COMMAND_QUEUE_CAPACITY", DEFAULT_COMMAND_QUEUE_CAPACITY).max(1),
            event_queue_capacity: env_parse("VTT_EVENT_QUEUE_CAPACITY", DEFAULT_EVENT_QUEUE_CAPACITY).max(1),
        }
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, raw = %raw, "ignoring unparsable config value");
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
