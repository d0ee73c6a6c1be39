//! Scan insertion: hits, free-space rays, and the per-scan update cycle.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::core::RangeData;

use super::probability::{
    compute_lookup_table_to_apply_odds, odds, MAX_PROBABILITY, MIN_PROBABILITY,
};
use super::probability_grid::{GridError, ProbabilityGrid};
use super::raycast::ray_cells;

/// Configuration for [`RangeDataInserter`].
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RangeDataInserterConfig {
    /// Probability applied to a cell containing a beam return.
    /// Must lie in (0.5, 0.9].
    #[serde(default = "default_hit_probability")]
    pub hit_probability: f32,

    /// Probability applied to cells a beam passed through.
    /// Must lie in [0.1, 0.5).
    #[serde(default = "default_miss_probability")]
    pub miss_probability: f32,

    /// Whether to trace free space at all. When false only returns are
    /// applied and untouched cells stay unknown.
    #[serde(default = "default_insert_free_space")]
    pub insert_free_space: bool,
}

fn default_hit_probability() -> f32 {
    0.55
}
fn default_miss_probability() -> f32 {
    0.49
}
fn default_insert_free_space() -> bool {
    true
}

impl Default for RangeDataInserterConfig {
    fn default() -> Self {
        Self {
            hit_probability: default_hit_probability(),
            miss_probability: default_miss_probability(),
            insert_free_space: default_insert_free_space(),
        }
    }
}

impl RangeDataInserterConfig {
    /// Validate the probability ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.hit_probability > 0.5 && self.hit_probability <= MAX_PROBABILITY) {
            return Err(ConfigError::InvalidHitProbability(self.hit_probability));
        }
        if !(self.miss_probability >= MIN_PROBABILITY && self.miss_probability < 0.5) {
            return Err(ConfigError::InvalidMissProbability(self.miss_probability));
        }
        Ok(())
    }
}

/// Writes one [`RangeData`] into a grid as hit and miss updates.
///
/// Both Bayesian update tables are precomputed at construction; insertion
/// itself is cell lookups only. The tables are immutable afterwards and
/// safe to share across threads.
#[derive(Debug, Clone)]
pub struct RangeDataInserter {
    hit_table: Vec<u16>,
    miss_table: Vec<u16>,
    insert_free_space: bool,
}

impl RangeDataInserter {
    /// Build an inserter, rejecting out-of-range probabilities.
    pub fn new(config: RangeDataInserterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            hit_table: compute_lookup_table_to_apply_odds(odds(config.hit_probability)),
            miss_table: compute_lookup_table_to_apply_odds(odds(config.miss_probability)),
            insert_free_space: config.insert_free_space,
        })
    }

    /// Insert `range_data` into `grid`.
    ///
    /// Grows the grid to cover the scan, applies the hit table to every
    /// return cell, then (when free space is enabled) the miss table
    /// along each ray. Hits go first: the per-scan marker keeps a
    /// crossing ray from weakening a cell that took a return.
    pub fn insert(&self, range_data: &RangeData, grid: &mut ProbabilityGrid) -> Result<(), GridError> {
        grid.grow_limits(range_data.origin);
        for point in range_data.returns.iter() {
            grid.grow_limits(*point);
        }
        for point in range_data.misses.iter() {
            grid.grow_limits(*point);
        }

        for point in range_data.returns.iter() {
            let cell = grid.limits().cell_index(*point);
            grid.apply_lookup_table(cell, &self.hit_table)?;
        }

        if self.insert_free_space {
            let origin_cell = grid.limits().cell_index(range_data.origin);
            for point in range_data.returns.iter() {
                let hit_cell = grid.limits().cell_index(*point);
                for cell in ray_cells(origin_cell, hit_cell) {
                    if cell == hit_cell {
                        break;
                    }
                    grid.apply_lookup_table(cell, &self.miss_table)?;
                }
            }
            for point in range_data.misses.iter() {
                let end_cell = grid.limits().cell_index(*point);
                for cell in ray_cells(origin_cell, end_cell) {
                    grid.apply_lookup_table(cell, &self.miss_table)?;
                }
            }
        }

        grid.finish_update();
        Ok(())
    }
}
