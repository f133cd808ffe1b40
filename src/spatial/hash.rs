//! Cell-bucketed spatial hash
//!
//! Items are bucketed by grid cell so a radius query only touches the
//! cells overlapping the query circle's bounding box rather than every
//! stored item. `MultiResolutionHash` keeps one hash per grid preset and
//! answers each query from the resolution whose cells best fit the radius.

use super::grid::{normalized_to_cell, Cell, GridConfig, GridPreset, GridPresets};
use crate::frame::types::Position;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Entry<T> {
    sequence: u64,
    position: Position,
    item: T,
}

/// A query hit
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor<'a, T> {
    pub item: &'a T,
    pub position: Position,
    pub distance: f64,
}

/// Spatial hash over a single grid
#[derive(Debug, Clone)]
pub struct SpatialHash<T> {
    grid: GridConfig,
    buckets: HashMap<Cell, Vec<Entry<T>>>,
    next_sequence: u64,
    len: usize,
}

impl<T> SpatialHash<T> {
    pub fn new(grid: GridConfig) -> Self {
        Self {
            grid,
            buckets: HashMap::new(),
            next_sequence: 0,
            len: 0,
        }
    }

    pub fn grid(&self) -> &GridConfig {
        &self.grid
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert an item at a position; returns the cell it was bucketed in
    pub fn insert(&mut self, position: Position, item: T) -> Cell {
        let cell = normalized_to_cell(position, &self.grid);
        let entry = Entry {
            sequence: self.next_sequence,
            position,
            item,
        };
        self.next_sequence += 1;
        self.len += 1;
        self.buckets.entry(cell).or_default().push(entry);
        cell
    }

    /// Remove every item
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.len = 0;
    }

    /// Items stored in a single cell, in insertion order
    pub fn items_in_cell(&self, cell: Cell) -> Vec<&T> {
        self.buckets
            .get(&cell)
            .map(|entries| entries.iter().map(|e| &e.item).collect())
            .unwrap_or_default()
    }

    /// Every item within `radius` of `center`, nearest first. Equal
    /// distances keep insertion order.
    pub fn query_radius(&self, center: Position, radius: f64) -> Vec<Neighbor<'_, T>> {
        if radius < 0.0 || radius.is_nan() {
            return Vec::new();
        }
        let min_cell = normalized_to_cell(Position::new(center.x - radius, center.y - radius), &self.grid);
        let max_cell = normalized_to_cell(Position::new(center.x + radius, center.y + radius), &self.grid);

        let mut hits: Vec<(u64, Neighbor<'_, T>)> = Vec::new();
        for row in min_cell.row..=max_cell.row {
            for col in min_cell.col..=max_cell.col {
                let Some(entries) = self.buckets.get(&Cell::new(col, row)) else {
                    continue;
                };
                for entry in entries {
                    let distance = entry.position.distance_to(&center);
                    if distance <= radius {
                        hits.push((
                            entry.sequence,
                            Neighbor {
                                item: &entry.item,
                                position: entry.position,
                                distance,
                            },
                        ));
                    }
                }
            }
        }
        hits.sort_by(|a, b| a.1.distance.total_cmp(&b.1.distance).then(a.0.cmp(&b.0)));
        hits.into_iter().map(|(_, n)| n).collect()
    }

    /// Nearest item within `radius`
    pub fn nearest(&self, center: Position, radius: f64) -> Option<Neighbor<'_, T>> {
        self.query_radius(center, radius).into_iter().next()
    }
}

/// One spatial hash per grid preset
#[derive(Debug, Clone)]
pub struct MultiResolutionHash<T> {
    coarse: SpatialHash<T>,
    medium: SpatialHash<T>,
    fine: SpatialHash<T>,
}

impl<T: Clone> MultiResolutionHash<T> {
    pub fn new(presets: &GridPresets) -> Self {
        Self {
            coarse: SpatialHash::new(presets.coarse),
            medium: SpatialHash::new(presets.medium),
            fine: SpatialHash::new(presets.fine),
        }
    }

    /// Insert into all three resolutions
    pub fn insert(&mut self, position: Position, item: T) {
        self.coarse.insert(position, item.clone());
        self.medium.insert(position, item.clone());
        self.fine.insert(position, item);
    }

    pub fn clear(&mut self) {
        self.coarse.clear();
        self.medium.clear();
        self.fine.clear();
    }

    pub fn len(&self) -> usize {
        self.fine.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fine.is_empty()
    }

    pub fn level(&self, preset: GridPreset) -> &SpatialHash<T> {
        match preset {
            GridPreset::Coarse => &self.coarse,
            GridPreset::Medium => &self.medium,
            GridPreset::Fine => &self.fine,
        }
    }

    /// Finest resolution whose cells are at least as large as `radius`.
    /// Falls back to coarse for large radii.
    pub fn resolution_for(&self, radius: f64) -> GridPreset {
        [GridPreset::Fine, GridPreset::Medium]
            .into_iter()
            .find(|&preset| {
                let (w, h) = self.level(preset).grid().cell_size();
                w.min(h) >= radius
            })
            .unwrap_or(GridPreset::Coarse)
    }

    /// Radius query answered from the best-fitting resolution
    pub fn query_radius(&self, center: Position, radius: f64) -> Vec<Neighbor<'_, T>> {
        self.level(self.resolution_for(radius)).query_radius(center, radius)
    }

    pub fn nearest(&self, center: Position, radius: f64) -> Option<Neighbor<'_, T>> {
        self.query_radius(center, radius).into_iter().next()
    }
}
