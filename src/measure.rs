//! Transient ruler between two canvas points.
//!
//! Distance is straight-line Euclidean. Tabletop diagonal-cost rules are not
//! applied.

#[cfg(test)]
#[path = "measure_test.rs"]
mod measure_test;

use crate::error::{SessionError, ensure_finite};
use crate::grid::Point;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub start: Point,
    pub end: Point,
    /// Pixel distance from `start` to `end`.
    pub distance: f64,
}

impl Measurement {
    /// # Errors
    ///
    /// Returns `InvalidCoordinate` for non-finite input.
    pub fn start(x: f64, y: f64) -> Result<Self, SessionError> {
        let point = Point::new(ensure_finite("x", x)?, ensure_finite("y", y)?);
        Ok(Self { start: point, end: point, distance: 0.0 })
    }

    /// Move the end point and recompute distance from the start.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCoordinate` for non-finite input.
    pub fn update(&mut self, x: f64, y: f64) -> Result<(), SessionError> {
        self.end = Point::new(ensure_finite("x", x)?, ensure_finite("y", y)?);
        self.distance = self.start.distance_to(self.end);
        Ok(())
    }

    /// Distance expressed in grid cells of size `cell_size` pixels.
    #[must_use]
    pub fn distance_in_cells(&self, cell_size: f64) -> f64 {
        self.distance / cell_size
    }
}
