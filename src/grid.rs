//! Grid ↔ pixel coordinate conversion on the fixed virtual canvas.
//!
//! DESIGN
//! ======
//! Every participant renders the map into the same 800×600 virtual canvas,
//! so cell size is derived from the map alone:
//! `cell = min(W / columns, H / rows)`, which keeps cells square.
//!
//! `pixel_to_grid` floors, so a pixel exactly on a cell boundary belongs to
//! the higher-index cell. Hit-testing must agree across participants; do not
//! switch to rounding.

#[cfg(test)]
#[path = "grid_test.rs"]
mod grid_test;

use crate::consts::{CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::model::{GridMap, Token};

/// A point in canvas pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance_to(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Integer grid cell address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCell {
    pub col: i64,
    pub row: i64,
}

impl GridCell {
    #[must_use]
    pub fn new(col: i64, row: i64) -> Self {
        Self { col, row }
    }
}

/// Converts between grid cells and canvas pixels for one map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridTransform {
    cell_size: f64,
    offset_x: f64,
    offset_y: f64,
    columns: u32,
    rows: u32,
}

impl GridTransform {
    /// Build a transform for `map`. Callers validate the map first; a map
    /// with zero columns or rows yields an infinite cell size.
    #[must_use]
    pub fn new(map: &GridMap) -> Self {
        let cell_size = (CANVAS_WIDTH / f64::from(map.grid_columns)).min(CANVAS_HEIGHT / f64::from(map.grid_rows));
        Self {
            cell_size,
            offset_x: map.grid_offset_x,
            offset_y: map.grid_offset_y,
            columns: map.grid_columns,
            rows: map.grid_rows,
        }
    }

    /// Side length of one square cell in pixels.
    #[must_use]
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Pixel width covered by the grid.
    #[must_use]
    pub fn grid_width_px(&self) -> f64 {
        f64::from(self.columns) * self.cell_size
    }

    /// Pixel height covered by the grid.
    #[must_use]
    pub fn grid_height_px(&self) -> f64 {
        f64::from(self.rows) * self.cell_size
    }

    /// Top-left pixel of the (possibly fractional) grid position.
    #[must_use]
    pub fn grid_to_pixel(&self, gx: f64, gy: f64) -> Point {
        Point { x: gx * self.cell_size + self.offset_x, y: gy * self.cell_size + self.offset_y }
    }

    /// Cell containing the pixel. Boundary pixels go to the higher-index cell.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn pixel_to_grid(&self, px: f64, py: f64) -> GridCell {
        GridCell {
            col: ((px - self.offset_x) / self.cell_size).floor() as i64,
            row: ((py - self.offset_y) / self.cell_size).floor() as i64,
        }
    }

    /// Top-left pixel of a cell.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cell_origin(&self, cell: GridCell) -> Point {
        self.grid_to_pixel(cell.col as f64, cell.row as f64)
    }

    /// Pixel center of a cell.
    #[must_use]
    pub fn cell_center(&self, cell: GridCell) -> Point {
        let origin = self.cell_origin(cell);
        let half = self.cell_size / 2.0;
        Point { x: origin.x + half, y: origin.y + half }
    }

    /// Pixel center of a token's whole footprint.
    #[must_use]
    pub fn token_center(&self, token: &Token) -> Point {
        self.grid_to_pixel(token.x + token.width / 2.0, token.y + token.height / 2.0)
    }

    /// True when the cell lies on the map.
    #[must_use]
    pub fn contains(&self, cell: GridCell) -> bool {
        (0..i64::from(self.columns)).contains(&cell.col) && (0..i64::from(self.rows)).contains(&cell.row)
    }

    /// Convert a pixel distance to a distance in cells.
    #[must_use]
    pub fn px_to_cells(&self, distance_px: f64) -> f64 {
        distance_px / self.cell_size
    }
}
