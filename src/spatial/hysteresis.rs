//! Stable-cell hysteresis
//!
//! A tracked entity keeps its current ("stable") cell while its position
//! stays within `threshold` of that cell's center, even if the raw grid
//! mapping already places it in a neighbor. The stable cell only moves
//! once the position strays further than the threshold.
//!
//! Distances are Euclidean in normalized frame units, so a threshold of
//! 0.1 means "within a tenth of the frame width of the stable center".
//! The threshold is not scaled by the grid: on the fine 24x16 grid a
//! cell is about 0.042 wide, so 0.1 lets a position sit two cells away
//! before the stable cell moves. Pick smaller thresholds for fine grids
//! when that reach is too sticky.

use super::grid::{cell_to_normalized, normalized_to_cell, Cell, GridConfig};
use crate::frame::types::Position;
use std::collections::BTreeMap;

/// Default stickiness radius
pub const DEFAULT_HYSTERESIS_THRESHOLD: f64 = 0.1;

/// Cell assignment for `position` given the previous stable cell.
///
/// Pure: the result depends only on the arguments.
pub fn apply_hysteresis(
    position: Position,
    stable: Option<Cell>,
    grid: &GridConfig,
    threshold: f64,
) -> Cell {
    let raw = normalized_to_cell(position, grid);
    match stable {
        None => raw,
        Some(cell) if cell == raw => cell,
        Some(cell) => {
            let center = cell_to_normalized(cell, grid);
            if position.distance_to(&center) <= threshold {
                cell
            } else {
                raw
            }
        }
    }
}

/// Per-entity stable cell tracking
#[derive(Debug, Clone)]
pub struct HysteresisTracker<K: Ord> {
    grid: GridConfig,
    threshold: f64,
    stable: BTreeMap<K, Cell>,
}

impl<K: Ord> HysteresisTracker<K> {
    pub fn new(grid: GridConfig, threshold: f64) -> Self {
        Self {
            grid,
            threshold,
            stable: BTreeMap::new(),
        }
    }

    /// Feed a new position for `key` and return its stable cell
    pub fn update(&mut self, key: K, position: Position) -> Cell {
        let previous = self.stable.get(&key).copied();
        let cell = apply_hysteresis(position, previous, &self.grid, self.threshold);
        self.stable.insert(key, cell);
        cell
    }

    pub fn stable_cell(&self, key: &K) -> Option<Cell> {
        self.stable.get(key).copied()
    }

    /// Forget an entity
    pub fn remove(&mut self, key: &K) -> Option<Cell> {
        self.stable.remove(key)
    }

    pub fn clear(&mut self) {
        self.stable.clear();
    }

    pub fn len(&self) -> usize {
        self.stable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stable.is_empty()
    }
}
