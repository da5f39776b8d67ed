//! Shared session state core for a virtual tabletop.
//!
//! One [`session::VttSession`] per map holds the tokens, fog of war,
//! drawings and pings every participant sees, and decides which participant
//! may change what. The Seer (game master) has full authoring rights;
//! players move the tokens they control, draw on the shared layer and ping.
//! Accepted mutations produce exactly one [`events::SessionEvent`], which an
//! external realtime transport broadcasts and persists. This crate performs
//! no network I/O or persistence itself.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`session`] | The session object and its mutation entry points |
//! | [`actor`] | Session task and cloneable [`actor::SessionHandle`] |
//! | [`model`] | Map, token, drawing, fog and ping types |
//! | [`store`] | Pure copy-on-write state transitions |
//! | [`auth`] | Seer/player authorization guard |
//! | [`pings`] | Cancellable per-ping expiry timers |
//! | [`history`] | Local drawing undo stack |
//! | [`grid`] | Grid/pixel coordinate conversions |
//! | [`viewport`] | Local pan/zoom state |
//! | [`measure`] | Ruler tool |
//! | [`events`] | Typed events, listeners and forwarding |
//! | [`config`] | Environment-driven tuning |
//! | [`error`] | [`error::SessionError`] and error codes |
//! | [`consts`] | Canvas size, zoom limits and defaults |

pub mod actor;
pub mod auth;
pub mod config;
pub mod consts;
pub mod error;
pub mod events;
pub mod grid;
pub mod history;
pub mod measure;
pub mod model;
pub mod pings;
pub mod session;
pub mod store;
pub mod viewport;
