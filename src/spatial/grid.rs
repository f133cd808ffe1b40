//! Normalized-space grid mapping
//!
//! Maps positions in `[0, 1]²` onto a `cols × rows` grid. Positions are
//! clamped before mapping and the resulting indices are clamped again so
//! the `x = 1.0` edge lands in the last column instead of one past it.

use crate::frame::types::Position;
use serde::{Deserialize, Serialize};

/// Grid dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridConfig {
    pub cols: u32,
    pub rows: u32,
}

impl GridConfig {
    pub const COARSE: GridConfig = GridConfig { cols: 6, rows: 4 };
    pub const MEDIUM: GridConfig = GridConfig { cols: 12, rows: 8 };
    pub const FINE: GridConfig = GridConfig { cols: 24, rows: 16 };

    pub const fn new(cols: u32, rows: u32) -> Self {
        Self { cols, rows }
    }

    /// Reject zero-sized grids
    pub fn validate(&self) -> crate::Result<()> {
        if self.cols == 0 || self.rows == 0 {
            return Err(crate::Error::InvalidGrid(format!(
                "grid dimensions must be positive, got {}x{}",
                self.cols, self.rows
            )));
        }
        Ok(())
    }

    /// Cell width and height in normalized units
    pub fn cell_size(&self) -> (f64, f64) {
        (1.0 / self.safe_cols() as f64, 1.0 / self.safe_rows() as f64)
    }

    /// Total number of cells
    pub fn cell_count(&self) -> usize {
        self.safe_cols() as usize * self.safe_rows() as usize
    }

    // Matching never fails, so a zero dimension that slipped past
    // validation is read as one.
    fn safe_cols(&self) -> u32 {
        self.cols.max(1)
    }

    fn safe_rows(&self) -> u32 {
        self.rows.max(1)
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self::MEDIUM
    }
}

/// Standard grid resolutions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GridPreset {
    Coarse,
    #[default]
    Medium,
    Fine,
}

impl GridPreset {
    pub const ALL: [GridPreset; 3] = [GridPreset::Coarse, GridPreset::Medium, GridPreset::Fine];

    /// Built-in dimensions for this preset
    pub fn config(&self) -> GridConfig {
        match self {
            GridPreset::Coarse => GridConfig::COARSE,
            GridPreset::Medium => GridConfig::MEDIUM,
            GridPreset::Fine => GridConfig::FINE,
        }
    }
}

/// Configurable dimensions for the three presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPresets {
    pub coarse: GridConfig,
    pub medium: GridConfig,
    pub fine: GridConfig,
}

impl GridPresets {
    pub fn get(&self, preset: GridPreset) -> GridConfig {
        match preset {
            GridPreset::Coarse => self.coarse,
            GridPreset::Medium => self.medium,
            GridPreset::Fine => self.fine,
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        self.coarse.validate()?;
        self.medium.validate()?;
        self.fine.validate()
    }
}

impl Default for GridPresets {
    fn default() -> Self {
        Self {
            coarse: GridConfig::COARSE,
            medium: GridConfig::MEDIUM,
            fine: GridConfig::FINE,
        }
    }
}

/// A grid cell address
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Cell {
    pub col: u32,
    pub row: u32,
}

impl Cell {
    pub const fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }

    /// Row-major index of this cell
    pub fn index(&self, grid: &GridConfig) -> usize {
        self.row as usize * grid.safe_cols() as usize + self.col as usize
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

/// Normalized bounds of a cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl CellBounds {
    pub fn contains(&self, position: &Position) -> bool {
        position.x >= self.min_x
            && position.x <= self.max_x
            && position.y >= self.min_y
            && position.y <= self.max_y
    }
}

/// Map a normalized position to its grid cell
pub fn normalized_to_cell(position: Position, grid: &GridConfig) -> Cell {
    let cols = grid.safe_cols();
    let rows = grid.safe_rows();
    // x / (1 / cols) written as a product to keep cell centers exact
    let col = ((clamp_unit(position.x) * cols as f64).floor() as u32).min(cols - 1);
    let row = ((clamp_unit(position.y) * rows as f64).floor() as u32).min(rows - 1);
    Cell::new(col, row)
}

/// Center of a cell in normalized coordinates
pub fn cell_to_normalized(cell: Cell, grid: &GridConfig) -> Position {
    Position::new(
        (cell.col as f64 + 0.5) / grid.safe_cols() as f64,
        (cell.row as f64 + 0.5) / grid.safe_rows() as f64,
    )
}

/// Normalized bounds of a cell
pub fn cell_bounds(cell: Cell, grid: &GridConfig) -> CellBounds {
    let (cell_w, cell_h) = grid.cell_size();
    CellBounds {
        min_x: cell.col as f64 * cell_w,
        min_y: cell.row as f64 * cell_h,
        max_x: (cell.col + 1) as f64 * cell_w,
        max_y: (cell.row + 1) as f64 * cell_h,
    }
}

/// The up-to-eight in-grid neighbors of a cell, row-major order
pub fn neighbors(cell: Cell, grid: &GridConfig) -> Vec<Cell> {
    let mut result = Vec::with_capacity(8);
    let max_col = grid.safe_cols() as i64 - 1;
    let max_row = grid.safe_rows() as i64 - 1;
    for dr in -1i64..=1 {
        for dc in -1i64..=1 {
            if dr == 0 && dc == 0 {
                continue;
            }
            let c = cell.col as i64 + dc;
            let r = cell.row as i64 + dr;
            if (0..=max_col).contains(&c) && (0..=max_row).contains(&r) {
                result.push(Cell::new(c as u32, r as u32));
            }
        }
    }
    result
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_dimensions() {
        assert_eq!(GridPreset::Coarse.config(), GridConfig::new(6, 4));
        assert_eq!(GridPreset::Medium.config(), GridConfig::new(12, 8));
        assert_eq!(GridPreset::Fine.config(), GridConfig::new(24, 16));
        assert_eq!(GridPresets::default().get(GridPreset::Fine), GridConfig::FINE);
    }

    #[test]
    fn test_normalized_to_cell_basic() {
        let grid = GridConfig::COARSE;
        assert_eq!(normalized_to_cell(Position::new(0.0, 0.0), &grid), Cell::new(0, 0));
        assert_eq!(normalized_to_cell(Position::new(0.5, 0.5), &grid), Cell::new(3, 2));
        assert_eq!(normalized_to_cell(Position::new(0.17, 0.26), &grid), Cell::new(1, 1));
    }

    #[test]
    fn test_boundary_edge_clamped_to_last_cell() {
        let grid = GridConfig::MEDIUM;
        assert_eq!(normalized_to_cell(Position::new(1.0, 1.0), &grid), Cell::new(11, 7));
        assert_eq!(normalized_to_cell(Position::new(1.7, -0.3), &grid), Cell::new(11, 0));
        assert_eq!(normalized_to_cell(Position::new(f64::NAN, 0.5), &grid), Cell::new(0, 4));
    }

    #[test]
    fn test_round_trip_through_center() {
        let grids = [
            GridConfig::COARSE,
            GridConfig::MEDIUM,
            GridConfig::FINE,
            GridConfig::new(1, 1),
            GridConfig::new(7, 3),
            GridConfig::new(100, 37),
        ];
        let probes = [0.0, 0.013, 0.25, 0.333, 0.5, 0.61, 0.999, 1.0];
        for grid in grids {
            for &x in &probes {
                for &y in &probes {
                    let cell = normalized_to_cell(Position::new(x, y), &grid);
                    let center = cell_to_normalized(cell, &grid);
                    assert!(cell_bounds(cell, &grid).contains(&center));
                    assert_eq!(normalized_to_cell(center, &grid), cell, "grid {:?}", grid);
                }
            }
        }
    }

    #[test]
    fn test_cell_bounds_and_index() {
        let grid = GridConfig::new(4, 2);
        let bounds = cell_bounds(Cell::new(1, 1), &grid);
        assert!((bounds.min_x - 0.25).abs() < 1e-12);
        assert!((bounds.max_y - 1.0).abs() < 1e-12);
        assert_eq!(Cell::new(1, 1).index(&grid), 5);
        assert_eq!(grid.cell_count(), 8);
    }

    #[test]
    fn test_neighbors_respect_edges() {
        let grid = GridConfig::COARSE;
        assert_eq!(neighbors(Cell::new(0, 0), &grid).len(), 3);
        assert_eq!(neighbors(Cell::new(2, 1), &grid).len(), 8);
        assert_eq!(neighbors(Cell::new(5, 3), &grid).len(), 3);
    }

    #[test]
    fn test_validate_rejects_zero_dimensions() {
        assert!(GridConfig::new(0, 4).validate().is_err());
        assert!(GridConfig::new(4, 0).validate().is_err());
        assert!(GridConfig::new(1, 1).validate().is_ok());
    }

    #[test]
    fn test_zero_dimension_does_not_panic() {
        let grid = GridConfig::new(0, 0);
        assert_eq!(normalized_to_cell(Position::new(0.7, 0.7), &grid), Cell::new(0, 0));
    }
}
