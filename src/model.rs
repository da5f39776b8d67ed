//! Data model: map geometry, tokens, drawings, fog, pings, and the
//! per-session snapshot that owns them.
//!
//! DESIGN
//! ======
//! `SessionMapState` holds each collection behind an `Arc<Vec<_>>`. A
//! mutation builds a fresh vector for the collection it touches and leaves
//! the others shared, so a reader holding an older snapshot never sees a
//! partially applied change and cloning a snapshot is O(1).
//!
//! All types serialize with serde; the external session layer seeds
//! `GridMap` and `SessionMapState` as JSON.

#[cfg(test)]
#[path = "model_test.rs"]
mod model_test;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{SessionError, ensure_finite, ensure_positive};

// =============================================================================
// IDS
// =============================================================================

pub type TokenId = Uuid;
pub type DrawingId = Uuid;
pub type FogId = Uuid;
pub type PingId = Uuid;

/// Opaque identifier of a session participant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ParticipantId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Current time as milliseconds since Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

// =============================================================================
// MAP
// =============================================================================

/// Static map geometry. Immutable once loaded into a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridMap {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    /// Number of grid columns.
    pub grid_columns: u32,
    /// Number of grid rows.
    pub grid_rows: u32,
    /// Horizontal offset of the grid origin in canvas pixels.
    #[serde(default)]
    pub grid_offset_x: f64,
    /// Vertical offset of the grid origin in canvas pixels.
    #[serde(default)]
    pub grid_offset_y: f64,
    #[serde(default = "default_grid_color")]
    pub grid_color: String,
    #[serde(default = "default_grid_opacity")]
    pub grid_opacity: f64,
    /// Reference to the background image, resolved by the asset layer.
    #[serde(default)]
    pub image_url: Option<String>,
}

fn default_grid_color() -> String {
    "#000000".into()
}

fn default_grid_opacity() -> f64 {
    0.3
}

impl GridMap {
    /// A bare map with default styling.
    #[must_use]
    pub fn new(grid_columns: u32, grid_rows: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            grid_columns,
            grid_rows,
            grid_offset_x: 0.0,
            grid_offset_y: 0.0,
            grid_color: default_grid_color(),
            grid_opacity: default_grid_opacity(),
            image_url: None,
        }
    }

    /// Check geometry before the map is accepted by a session.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMap` for empty grids, non-finite offsets, or an opacity
    /// outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.grid_columns == 0 || self.grid_rows == 0 {
            return Err(SessionError::InvalidMap(format!(
                "grid must have at least one column and row (got {}x{})",
                self.grid_columns, self.grid_rows
            )));
        }
        if !self.grid_offset_x.is_finite() || !self.grid_offset_y.is_finite() {
            return Err(SessionError::InvalidMap("grid offset must be finite".into()));
        }
        if !(0.0..=1.0).contains(&self.grid_opacity) {
            return Err(SessionError::InvalidMap(format!(
                "grid opacity must be within [0, 1] (got {})",
                self.grid_opacity
            )));
        }
        Ok(())
    }
}

// =============================================================================
// TOKENS
// =============================================================================

/// A game piece positioned on the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    /// Column of the token's top-left cell.
    pub x: f64,
    /// Row of the token's top-left cell.
    pub y: f64,
    /// Footprint width in cells.
    #[serde(default = "one")]
    pub width: f64,
    /// Footprint height in cells.
    #[serde(default = "one")]
    pub height: f64,
    /// Participants allowed to move this token besides the Seer. Empty means
    /// Seer-only.
    #[serde(default)]
    pub controlled_by: BTreeSet<ParticipantId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    /// Open-ended display metadata (conditions, hp bars, etc.).
    #[serde(default)]
    pub props: serde_json::Value,
}

fn one() -> f64 {
    1.0
}

impl Token {
    /// A 1×1 token at `(x, y)` with a fresh id and no controllers.
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            x,
            y,
            width: 1.0,
            height: 1.0,
            controlled_by: BTreeSet::new(),
            name: String::new(),
            image_url: None,
            color: None,
            props: serde_json::Value::Null,
        }
    }

    /// Builder-style helper to add a controlling participant.
    #[must_use]
    pub fn with_controller(mut self, participant: impl Into<ParticipantId>) -> Self {
        self.controlled_by.insert(participant.into());
        self
    }

    /// Reject non-finite positions and non-positive sizes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCoordinate` naming the offending field.
    pub fn validate(&self) -> Result<(), SessionError> {
        ensure_finite("x", self.x)?;
        ensure_finite("y", self.y)?;
        ensure_positive("width", self.width)?;
        ensure_positive("height", self.height)?;
        Ok(())
    }
}

/// Sparse token update. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controlled_by: Option<BTreeSet<ParticipantId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<serde_json::Value>,
}

impl TokenPatch {
    /// Reject non-finite positions and non-positive sizes among present fields.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCoordinate` naming the offending field.
    pub fn validate(&self) -> Result<(), SessionError> {
        if let Some(x) = self.x {
            ensure_finite("x", x)?;
        }
        if let Some(y) = self.y {
            ensure_finite("y", y)?;
        }
        if let Some(w) = self.width {
            ensure_positive("width", w)?;
        }
        if let Some(h) = self.height {
            ensure_positive("height", h)?;
        }
        Ok(())
    }

    /// Apply present fields onto `token`.
    pub fn apply_to(&self, token: &mut Token) {
        if let Some(x) = self.x {
            token.x = x;
        }
        if let Some(y) = self.y {
            token.y = y;
        }
        if let Some(w) = self.width {
            token.width = w;
        }
        if let Some(h) = self.height {
            token.height = h;
        }
        if let Some(c) = &self.controlled_by {
            token.controlled_by.clone_from(c);
        }
        if let Some(n) = &self.name {
            token.name.clone_from(n);
        }
        if let Some(i) = &self.image_url {
            token.image_url = Some(i.clone());
        }
        if let Some(c) = &self.color {
            token.color = Some(c.clone());
        }
        if let Some(p) = &self.props {
            token.props = p.clone();
        }
    }
}

// =============================================================================
// DRAWINGS
// =============================================================================

/// Layer a drawing lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawingLayer {
    /// Seer-only annotations, hidden from players.
    Gm,
    /// Shared annotations anyone may draw.
    Drawings,
}

impl std::fmt::Display for DrawingLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gm => f.write_str("gm"),
            Self::Drawings => f.write_str("drawings"),
        }
    }
}

/// A freehand or shape annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    pub id: DrawingId,
    pub layer: DrawingLayer,
    /// Shape payload interpreted by the renderer (points, stroke, fill...).
    pub shape: serde_json::Value,
    pub created_by: ParticipantId,
    /// Milliseconds since Unix epoch.
    pub created_at: i64,
}

impl Drawing {
    #[must_use]
    pub fn new(layer: DrawingLayer, shape: serde_json::Value, created_by: ParticipantId) -> Self {
        Self { id: Uuid::new_v4(), layer, shape, created_by, created_at: now_ms() }
    }
}

// =============================================================================
// FOG
// =============================================================================

/// Shape of a revealed area, in grid units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FogShape {
    Rect { x: f64, y: f64, width: f64, height: f64 },
    Polygon { points: Vec<[f64; 2]> },
}

/// A revealed area of the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FogRegion {
    pub id: FogId,
    pub shape: FogShape,
}

impl FogRegion {
    #[must_use]
    pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { id: Uuid::new_v4(), shape: FogShape::Rect { x, y, width, height } }
    }

    #[must_use]
    pub fn polygon(points: Vec<[f64; 2]>) -> Self {
        Self { id: Uuid::new_v4(), shape: FogShape::Polygon { points } }
    }

    /// Reject non-finite geometry, empty rectangles, and degenerate polygons.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCoordinate` naming the offending field.
    pub fn validate(&self) -> Result<(), SessionError> {
        match &self.shape {
            FogShape::Rect { x, y, width, height } => {
                ensure_finite("x", *x)?;
                ensure_finite("y", *y)?;
                ensure_positive("width", *width)?;
                ensure_positive("height", *height)?;
            }
            FogShape::Polygon { points } => {
                if points.len() < 3 {
                    #[allow(clippy::cast_precision_loss)]
                    let count = points.len() as f64;
                    return Err(SessionError::InvalidCoordinate { field: "points", value: count });
                }
                for [px, py] in points {
                    ensure_finite("x", *px)?;
                    ensure_finite("y", *py)?;
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// PINGS
// =============================================================================

/// A transient marker that disappears at `expires_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ping {
    pub id: PingId,
    /// Canvas pixel position.
    pub x: f64,
    pub y: f64,
    pub color: String,
    pub created_by: ParticipantId,
    /// Milliseconds since Unix epoch.
    pub created_at: i64,
    /// Milliseconds since Unix epoch. Every participant removes the ping at
    /// this wall-clock time.
    pub expires_at: i64,
}

// =============================================================================
// SESSION MAP STATE
// =============================================================================

/// Canonical per-session snapshot. Cloning is cheap; collections are shared
/// until a mutation replaces them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionMapState {
    #[serde(default)]
    pub tokens: Arc<Vec<Token>>,
    #[serde(default)]
    pub drawings: Arc<Vec<Drawing>>,
    #[serde(default)]
    pub fog: Arc<Vec<FogRegion>>,
    #[serde(default)]
    pub pings: Arc<Vec<Ping>>,
}

impl SessionMapState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn token(&self, id: &TokenId) -> Option<&Token> {
        self.tokens.iter().find(|t| t.id == *id)
    }

    #[must_use]
    pub fn drawing(&self, id: &DrawingId) -> Option<&Drawing> {
        self.drawings.iter().find(|d| d.id == *id)
    }

    #[must_use]
    pub fn ping(&self, id: &PingId) -> Option<&Ping> {
        self.pings.iter().find(|p| p.id == *id)
    }

    /// Validate every entity in a seed before it replaces live state.
    ///
    /// # Errors
    ///
    /// Returns the first validation error encountered.
    pub fn validate(&self) -> Result<(), SessionError> {
        for token in self.tokens.iter() {
            token.validate()?;
        }
        for region in self.fog.iter() {
            region.validate()?;
        }
        for ping in self.pings.iter() {
            ensure_finite("x", ping.x)?;
            ensure_finite("y", ping.y)?;
        }
        Ok(())
    }
}
