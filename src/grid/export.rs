//! Log-odds byte encoding for grid export.
//!
//! One byte per cell: 0 is unknown, 1..=255 quantizes the logit of the
//! cell probability over [logit(0.1), logit(0.9)].

use super::limits::CellIndex;
use super::probability::{clamp_probability, MAX_PROBABILITY, MIN_PROBABILITY};
use super::probability_grid::ProbabilityGrid;

/// Natural log odds of a probability.
#[inline]
pub fn logit(probability: f32) -> f32 {
    (probability / (1.0 - probability)).ln()
}

fn min_log_odds() -> f32 {
    logit(MIN_PROBABILITY)
}

fn max_log_odds() -> f32 {
    logit(MAX_PROBABILITY)
}

/// Encode a probability as a log-odds byte in 1..=255.
#[inline]
pub fn probability_to_log_odds_integer(probability: f32) -> u8 {
    let p = clamp_probability(probability);
    let value = ((logit(p) - min_log_odds()) * 254.0 / (max_log_odds() - min_log_odds()))
        .round() as i32
        + 1;
    debug_assert!((1..=255).contains(&value));
    value as u8
}

/// Decode a log-odds byte. 0 decodes to the unknown probability 0.5.
#[inline]
pub fn log_odds_integer_to_probability(value: u8) -> f32 {
    if value == 0 {
        return 0.5;
    }
    let log_odds =
        min_log_odds() + (value - 1) as f32 * (max_log_odds() - min_log_odds()) / 254.0;
    1.0 / (1.0 + (-log_odds).exp())
}

/// Serialize a grid's cells as log-odds bytes, row-major over
/// `(nx, ny)`; unknown cells encode as 0.
pub fn to_log_odds_bytes(grid: &ProbabilityGrid) -> Vec<u8> {
    let dims = grid.limits().cell_dims();
    let mut bytes = Vec::with_capacity(dims.count());
    for y in 0..dims.ny {
        for x in 0..dims.nx {
            let cell = CellIndex::new(x, y);
            if grid.is_known(cell) {
                bytes.push(probability_to_log_odds_integer(grid.get_probability(cell)));
            } else {
                bytes.push(0);
            }
        }
    }
    bytes
}
