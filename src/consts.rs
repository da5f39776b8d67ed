//! Shared numeric constants for the session core.

// ── Virtual canvas ──────────────────────────────────────────────

/// Width of the fixed virtual canvas in pixels.
pub const CANVAS_WIDTH: f64 = 800.0;

/// Height of the fixed virtual canvas in pixels.
pub const CANVAS_HEIGHT: f64 = 600.0;

// ── Viewport ────────────────────────────────────────────────────

/// Smallest allowed viewport scale.
pub const MIN_SCALE: f64 = 0.25;

/// Largest allowed viewport scale.
pub const MAX_SCALE: f64 = 4.0;

/// Multiplicative step applied by zoom in / zoom out.
pub const ZOOM_STEP: f64 = 1.2;

// ── Pings ───────────────────────────────────────────────────────

/// Default ping lifetime in milliseconds.
pub const DEFAULT_PING_TTL_MS: u64 = 3000;

/// Default ping color when the caller does not pick one.
pub const DEFAULT_PING_COLOR: &str = "#F5C542";

// ── Queues ──────────────────────────────────────────────────────

/// Default bounded capacity of the session actor's command queue.
pub const DEFAULT_COMMAND_QUEUE_CAPACITY: usize = 256;

/// Default bounded capacity of an event forwarding queue.
pub const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 1024;
