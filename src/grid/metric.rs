//! Square-grid distance metric with paired diagonal costs
//!
//! Positions live in scene pixel space and are snapped to cell indices
//! before measuring. Diagonal steps pair up: the first costs one cell,
//! the second costs two, alternating (1-2-1-2...), which approximates
//! true diagonal length without leaving integer arithmetic.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Scale of a scene's grid: pixel size of one cell and its length in meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridScale {
    pub cell_px: f64,
    pub meters_per_cell: f64,
}

impl Default for GridScale {
    fn default() -> Self {
        // One cell is one meter unless the scene says otherwise
        Self { cell_px: 100.0, meters_per_cell: 1.0 }
    }
}

impl GridScale {
    pub fn new(cell_px: f64, meters_per_cell: f64) -> Self {
        Self { cell_px, meters_per_cell }
    }

    /// Snap a pixel-space position to its cell index
    pub fn snap(&self, pos: DVec2) -> CellCoord {
        CellCoord {
            col: (pos.x / self.cell_px).round() as i64,
            row: (pos.y / self.cell_px).round() as i64,
        }
    }

    /// Measure the grid distance between two pixel-space positions
    pub fn distance(&self, a: DVec2, b: DVec2) -> GridDistance {
        let cells = self.snap(a).cell_distance(&self.snap(b));
        GridDistance {
            cells,
            meters: cells as f64 * self.meters_per_cell,
        }
    }

    /// Convert a cell count to meters under this scale
    pub fn cells_to_meters(&self, cells: u32) -> f64 {
        cells as f64 * self.meters_per_cell
    }
}

/// Integer cell index on a scene grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct CellCoord {
    pub col: i64,
    pub row: i64,
}

impl CellCoord {
    pub fn new(col: i64, row: i64) -> Self {
        Self { col, row }
    }

    /// Cell distance with paired diagonals
    ///
    /// `diag` diagonal steps cover the shorter axis; the remainder is
    /// straight movement. Every second diagonal costs an extra cell.
    pub fn cell_distance(&self, other: &Self) -> u32 {
        let dx = (self.col - other.col).unsigned_abs();
        let dy = (self.row - other.row).unsigned_abs();
        let diag = dx.min(dy);
        let straight = dx.max(dy) - diag;
        (straight + diag + diag / 2) as u32
    }
}

/// A measured distance in both grid and world units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridDistance {
    pub cells: u32,
    pub meters: f64,
}
