//! Dense quantized occupancy grid.

use thiserror::Error;

use crate::core::Point2D;

use super::limits::{CellDims, CellIndex, MapLimits};
use super::probability::{
    probability_to_value, value_to_probability, MIN_PROBABILITY, UNKNOWN_VALUE, UPDATE_MARKER,
};

/// Errors from mutating grid accesses.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// The cell lies outside the grid limits.
    #[error("cell ({x}, {y}) is outside the grid limits")]
    OutOfBounds {
        /// Column index of the offending access.
        x: i32,
        /// Row index of the offending access.
        y: i32,
    },

    /// `set_probability` may only paint unknown cells.
    #[error("cell ({x}, {y}) is already known")]
    AlreadyKnown {
        /// Column index of the offending access.
        x: i32,
        /// Row index of the offending access.
        y: i32,
    },
}

/// A 2D occupancy grid over quantized probabilities.
///
/// Cells hold `u16` values: 0 unknown, 1..=32767 a quantized probability,
/// and bit 15 the per-scan "already updated" marker (see
/// [`super::probability`]). The grid tracks which cells were touched
/// since the last [`ProbabilityGrid::finish_update`] so markers can be
/// cleared in one pass.
#[derive(Debug, Clone)]
pub struct ProbabilityGrid {
    limits: MapLimits,
    cells: Vec<u16>,
    update_indices: Vec<usize>,
}

impl ProbabilityGrid {
    /// Create a grid with all cells unknown.
    pub fn new(limits: MapLimits) -> Self {
        let count = limits.cell_dims().count();
        Self {
            limits,
            cells: vec![UNKNOWN_VALUE; count],
            update_indices: Vec::new(),
        }
    }

    /// The grid's extents.
    #[inline]
    pub fn limits(&self) -> &MapLimits {
        &self.limits
    }

    /// Raw value of a cell with the update marker stripped.
    /// Returns [`UNKNOWN_VALUE`] outside the limits.
    #[inline]
    fn value(&self, cell: CellIndex) -> u16 {
        match self.limits.to_flat_index(cell) {
            Some(i) => self.cells[i] & !UPDATE_MARKER,
            None => UNKNOWN_VALUE,
        }
    }

    /// Whether a cell has ever been observed.
    #[inline]
    pub fn is_known(&self, cell: CellIndex) -> bool {
        self.limits.contains(cell) && self.value(cell) != UNKNOWN_VALUE
    }

    /// Occupancy probability of a cell.
    ///
    /// Unknown cells read 0.5; cells outside the limits read
    /// [`MIN_PROBABILITY`] so the matcher can probe offsets freely.
    #[inline]
    pub fn get_probability(&self, cell: CellIndex) -> f32 {
        if !self.limits.contains(cell) {
            return MIN_PROBABILITY;
        }
        match self.value(cell) {
            UNKNOWN_VALUE => 0.5,
            value => value_to_probability(value),
        }
    }

    /// Paint an unknown cell with an initial probability.
    ///
    /// Calling this on a known cell is an invariant violation; Bayesian
    /// updates go through [`ProbabilityGrid::apply_lookup_table`].
    pub fn set_probability(&mut self, cell: CellIndex, probability: f32) -> Result<(), GridError> {
        let index = self
            .limits
            .to_flat_index(cell)
            .ok_or(GridError::OutOfBounds { x: cell.x, y: cell.y })?;
        if self.cells[index] != UNKNOWN_VALUE {
            return Err(GridError::AlreadyKnown { x: cell.x, y: cell.y });
        }
        self.cells[index] = probability_to_value(probability);
        Ok(())
    }

    /// Apply a precomputed Bayesian update table to a cell.
    ///
    /// Returns `Ok(false)` when the cell already carries the update
    /// marker, so repeated applications within one scan are no-ops.
    pub fn apply_lookup_table(
        &mut self,
        cell: CellIndex,
        table: &[u16],
    ) -> Result<bool, GridError> {
        debug_assert_eq!(table.len(), UPDATE_MARKER as usize);
        let index = self
            .limits
            .to_flat_index(cell)
            .ok_or(GridError::OutOfBounds { x: cell.x, y: cell.y })?;
        let value = self.cells[index];
        if value >= UPDATE_MARKER {
            return Ok(false);
        }
        self.update_indices.push(index);
        self.cells[index] = table[value as usize];
        debug_assert!(self.cells[index] >= UPDATE_MARKER);
        Ok(true)
    }

    /// Clear the update markers left by the current scan.
    pub fn finish_update(&mut self) {
        for index in self.update_indices.drain(..) {
            debug_assert!(self.cells[index] >= UPDATE_MARKER);
            self.cells[index] &= !UPDATE_MARKER;
        }
    }

    /// Grow the grid so that `point` falls within its limits, preserving
    /// cell alignment and every known cell.
    pub fn grow_limits(&mut self, point: Point2D) {
        let cell = self.limits.cell_index(point);
        if self.limits.contains(cell) {
            return;
        }

        let dims = self.limits.cell_dims();
        // Cells added on the max-corner side shift existing indices.
        let shift_x = (-cell.x).max(0);
        let shift_y = (-cell.y).max(0);
        let grow_x = (cell.x - (dims.nx - 1)).max(0);
        let grow_y = (cell.y - (dims.ny - 1)).max(0);

        let new_dims = CellDims::new(dims.nx + shift_x + grow_x, dims.ny + shift_y + grow_y);
        let resolution = self.limits.resolution();
        let new_max = Point2D::new(
            self.limits.max().x + shift_x as f32 * resolution,
            self.limits.max().y + shift_y as f32 * resolution,
        );

        let mut new_cells = vec![UNKNOWN_VALUE; new_dims.count()];
        let old_nx = dims.nx as usize;
        let new_nx = new_dims.nx as usize;
        for y in 0..dims.ny as usize {
            let old_start = y * old_nx;
            let new_start = (y + shift_y as usize) * new_nx + shift_x as usize;
            new_cells[new_start..new_start + old_nx]
                .copy_from_slice(&self.cells[old_start..old_start + old_nx]);
        }

        for index in &mut self.update_indices {
            let x = *index % old_nx;
            let y = *index / old_nx;
            *index = (y + shift_y as usize) * new_nx + x + shift_x as usize;
        }

        self.cells = new_cells;
        self.limits = MapLimits::new(resolution, new_max, new_dims);
    }

    /// Smallest grid containing every known cell of this one.
    ///
    /// Known cells keep their exact quantized value; a grid with no
    /// known cells crops to a single unknown cell.
    pub fn compute_cropped_grid(&self) -> ProbabilityGrid {
        let dims = self.limits.cell_dims();
        let mut bounds: Option<(i32, i32, i32, i32)> = None;
        for y in 0..dims.ny {
            for x in 0..dims.nx {
                let value = self.cells[y as usize * dims.nx as usize + x as usize] & !UPDATE_MARKER;
                if value == UNKNOWN_VALUE {
                    continue;
                }
                bounds = Some(match bounds {
                    None => (x, x, y, y),
                    Some((min_x, max_x, min_y, max_y)) => {
                        (min_x.min(x), max_x.max(x), min_y.min(y), max_y.max(y))
                    }
                });
            }
        }

        let resolution = self.limits.resolution();
        let Some((min_x, max_x, min_y, max_y)) = bounds else {
            return ProbabilityGrid::new(MapLimits::new(
                resolution,
                self.limits.max(),
                CellDims::new(1, 1),
            ));
        };

        let new_max = Point2D::new(
            self.limits.max().x - min_x as f32 * resolution,
            self.limits.max().y - min_y as f32 * resolution,
        );
        let new_dims = CellDims::new(max_x - min_x + 1, max_y - min_y + 1);
        let mut cropped = ProbabilityGrid::new(MapLimits::new(resolution, new_max, new_dims));
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let value = self.cells[y as usize * dims.nx as usize + x as usize] & !UPDATE_MARKER;
                if value != UNKNOWN_VALUE {
                    let index =
                        (y - min_y) as usize * new_dims.nx as usize + (x - min_x) as usize;
                    cropped.cells[index] = value;
                }
            }
        }
        cropped
    }

    /// Iterate over known cells as `(cell, probability)`.
    pub fn known_cells(&self) -> impl Iterator<Item = (CellIndex, f32)> + '_ {
        let nx = self.limits.cell_dims().nx as usize;
        self.cells.iter().enumerate().filter_map(move |(i, &raw)| {
            let value = raw & !UPDATE_MARKER;
            if value == UNKNOWN_VALUE {
                return None;
            }
            let cell = CellIndex::new((i % nx) as i32, (i / nx) as i32);
            Some((cell, value_to_probability(value)))
        })
    }
}
