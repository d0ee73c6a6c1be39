//! Grid extents and the world-to-cell affine.

use serde::{Deserialize, Serialize};

use crate::core::Point2D;

/// Index of a cell in a probability grid.
///
/// Indices grow as world coordinates shrink: cell (0, 0) sits at the
/// grid's max corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellIndex {
    /// Column index.
    pub x: i32,
    /// Row index.
    pub y: i32,
}

impl CellIndex {
    /// Create a new cell index.
    #[inline]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Offset this index by whole cells.
    #[inline]
    pub fn offset(&self, dx: i32, dy: i32) -> CellIndex {
        CellIndex::new(self.x + dx, self.y + dy)
    }
}

/// Number of cells along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellDims {
    /// Cell count along x.
    pub nx: i32,
    /// Cell count along y.
    pub ny: i32,
}

impl CellDims {
    /// Create new cell dimensions.
    #[inline]
    pub fn new(nx: i32, ny: i32) -> Self {
        Self { nx, ny }
    }

    /// Total number of cells.
    #[inline]
    pub fn count(&self) -> usize {
        self.nx as usize * self.ny as usize
    }
}

/// The affine between world coordinates and cell indices.
///
/// `max` is the world coordinate of the corner of cell (0, 0); indices
/// increase toward smaller world coordinates:
/// `ix = floor((max.x − wx)/resolution)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapLimits {
    resolution: f32,
    inv_resolution: f32,
    max: Point2D,
    cell_dims: CellDims,
}

impl MapLimits {
    /// Create new limits. `resolution` must be positive.
    pub fn new(resolution: f32, max: Point2D, cell_dims: CellDims) -> Self {
        debug_assert!(resolution > 0.0);
        Self {
            resolution,
            inv_resolution: 1.0 / resolution,
            max,
            cell_dims,
        }
    }

    /// Cell edge length in meters.
    #[inline]
    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    /// World coordinate of the corner of cell (0, 0).
    #[inline]
    pub fn max(&self) -> Point2D {
        self.max
    }

    /// Grid dimensions in cells.
    #[inline]
    pub fn cell_dims(&self) -> CellDims {
        self.cell_dims
    }

    /// Cell containing the given world point. The result may lie outside
    /// the grid; check with [`MapLimits::contains`].
    #[inline]
    pub fn cell_index(&self, point: Point2D) -> CellIndex {
        CellIndex::new(
            ((self.max.x - point.x) * self.inv_resolution).floor() as i32,
            ((self.max.y - point.y) * self.inv_resolution).floor() as i32,
        )
    }

    /// World coordinates of a cell's center.
    #[inline]
    pub fn cell_center(&self, cell: CellIndex) -> Point2D {
        Point2D::new(
            self.max.x - (cell.x as f32 + 0.5) * self.resolution,
            self.max.y - (cell.y as f32 + 0.5) * self.resolution,
        )
    }

    /// Check whether a cell index lies within the grid.
    #[inline]
    pub fn contains(&self, cell: CellIndex) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.cell_dims.nx && cell.y < self.cell_dims.ny
    }

    /// Flat storage index of a cell, if it is in bounds.
    #[inline]
    pub fn to_flat_index(&self, cell: CellIndex) -> Option<usize> {
        if self.contains(cell) {
            Some(cell.y as usize * self.cell_dims.nx as usize + cell.x as usize)
        } else {
            None
        }
    }
}
