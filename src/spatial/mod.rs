//! Spatial primitives
//!
//! This module maps normalized positions onto grids:
//! - Grid mapping at three standard resolutions (coarse, medium, fine)
//! - Cell-bucketed spatial hashing for radius queries
//! - Hysteresis to keep cell assignment stable at boundaries

pub mod grid;
pub mod hash;
pub mod hysteresis;

pub use grid::{
    cell_bounds, cell_to_normalized, neighbors, normalized_to_cell, Cell, CellBounds, GridConfig,
    GridPreset, GridPresets,
};
pub use hash::{MultiResolutionHash, Neighbor, SpatialHash};
pub use hysteresis::{apply_hysteresis, HysteresisTracker, DEFAULT_HYSTERESIS_THRESHOLD};
