//! Local pan and zoom.
//!
//! The viewport maps canvas pixels to screen pixels as
//! `screen = canvas * scale + pan`. It belongs to one participant and is
//! never shared or broadcast.

#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use crate::consts::{CANVAS_HEIGHT, CANVAS_WIDTH, MAX_SCALE, MIN_SCALE, ZOOM_STEP};
use crate::error::{SessionError, ensure_finite, ensure_positive};
use crate::grid::Point;

/// Pan/zoom state of the local view. Independent of map content.
///
/// `pan_x` / `pan_y` are in screen pixels.
/// `scale` is clamped to `[MIN_SCALE, MAX_SCALE]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub pan_x: f64,
    pub pan_y: f64,
    pub scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { pan_x: 0.0, pan_y: 0.0, scale: 1.0 }
    }
}

impl Viewport {
    pub fn zoom_in(&mut self) {
        self.scale = clamp_scale(self.scale * ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.scale = clamp_scale(self.scale / ZOOM_STEP);
    }

    /// # Errors
    ///
    /// Returns `InvalidCoordinate` for a non-finite or non-positive scale.
    pub fn set_scale(&mut self, scale: f64) -> Result<(), SessionError> {
        self.scale = clamp_scale(ensure_positive("scale", scale)?);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `InvalidCoordinate` for non-finite pan values.
    pub fn set_pan(&mut self, x: f64, y: f64) -> Result<(), SessionError> {
        let (x, y) = (ensure_finite("pan_x", x)?, ensure_finite("pan_y", y)?);
        self.pan_x = x;
        self.pan_y = y;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `InvalidCoordinate` for non-finite deltas.
    pub fn pan_by(&mut self, dx: f64, dy: f64) -> Result<(), SessionError> {
        let (dx, dy) = (ensure_finite("dx", dx)?, ensure_finite("dy", dy)?);
        self.pan_x += dx;
        self.pan_y += dy;
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Pan so that canvas point `target` lands on the canvas center at the
    /// current scale.
    pub fn center_on(&mut self, target: Point) {
        self.pan_x = CANVAS_WIDTH / 2.0 - target.x * self.scale;
        self.pan_y = CANVAS_HEIGHT / 2.0 - target.y * self.scale;
    }

    /// Convert a screen-space point to canvas coordinates.
    #[must_use]
    pub fn screen_to_canvas(&self, screen: Point) -> Point {
        Point { x: (screen.x - self.pan_x) / self.scale, y: (screen.y - self.pan_y) / self.scale }
    }

    /// Convert a canvas point to screen coordinates.
    #[must_use]
    pub fn canvas_to_screen(&self, canvas: Point) -> Point {
        Point { x: canvas.x * self.scale + self.pan_x, y: canvas.y * self.scale + self.pan_y }
    }
}

fn clamp_scale(scale: f64) -> f64 {
    scale.clamp(MIN_SCALE, MAX_SCALE)
}
