//! Probability quantization and Bayesian update tables.
//!
//! Cell values are `u16`: 0 is unknown, 1..=32767 encodes a probability
//! in [`MIN_PROBABILITY`, `MAX_PROBABILITY`], and bit 15 marks a cell as
//! already updated within the current scan. A Bayesian update by a fixed
//! hit or miss probability is precomputed as a value-to-value lookup
//! table so insertion is table lookups only.

/// Smallest representable occupancy probability.
pub const MIN_PROBABILITY: f32 = 0.1;

/// Largest representable occupancy probability.
pub const MAX_PROBABILITY: f32 = 0.9;

/// Cell value meaning "never observed".
pub const UNKNOWN_VALUE: u16 = 0;

/// Largest quantized probability value.
pub const MAX_CELL_VALUE: u16 = 32767;

/// Bit set on a cell that has already been updated this scan.
pub const UPDATE_MARKER: u16 = 1 << 15;

/// Clamp a probability to the representable range.
#[inline]
pub fn clamp_probability(probability: f32) -> f32 {
    probability.clamp(MIN_PROBABILITY, MAX_PROBABILITY)
}

/// Quantize a probability to a cell value in 1..=32767.
#[inline]
pub fn probability_to_value(probability: f32) -> u16 {
    let p = clamp_probability(probability);
    let value = 1 + ((p - MIN_PROBABILITY) / (MAX_PROBABILITY - MIN_PROBABILITY) * 32766.0)
        .round() as u16;
    value.clamp(1, MAX_CELL_VALUE)
}

/// Dequantize a cell value in 1..=32767 back to a probability.
///
/// The caller handles [`UNKNOWN_VALUE`] and strips [`UPDATE_MARKER`].
#[inline]
pub fn value_to_probability(value: u16) -> f32 {
    debug_assert!(value >= 1 && value <= MAX_CELL_VALUE);
    MIN_PROBABILITY
        + (value - 1) as f32 * ((MAX_PROBABILITY - MIN_PROBABILITY) / 32766.0)
}

/// Odds of a probability: p / (1 − p).
#[inline]
pub fn odds(probability: f32) -> f32 {
    probability / (1.0 - probability)
}

/// Probability corresponding to the given odds.
#[inline]
pub fn probability_from_odds(odds: f32) -> f32 {
    odds / (odds + 1.0)
}

/// Precompute the table applying one Bayesian update with the given odds.
///
/// Index is the current cell value (marker bit clear); the entry is the
/// updated value with [`UPDATE_MARKER`] already set, so a single lookup
/// both updates the cell and flags it for this scan. Index 0 maps the
/// unknown cell straight to the update probability.
pub fn compute_lookup_table_to_apply_odds(update_odds: f32) -> Vec<u16> {
    let mut table = Vec::with_capacity(UPDATE_MARKER as usize);
    table.push(UPDATE_MARKER + probability_to_value(probability_from_odds(update_odds)));
    for value in 1..UPDATE_MARKER {
        let prior = value_to_probability(value);
        let updated = probability_from_odds(update_odds * odds(prior));
        table.push(UPDATE_MARKER + probability_to_value(updated));
    }
    table
}
