//! Submap grid storage: limits, quantized probabilities, insertion.

pub mod export;
mod inserter;
mod limits;
pub mod probability;
mod probability_grid;
pub mod raycast;

pub use inserter::{RangeDataInserter, RangeDataInserterConfig};
pub use limits::{CellDims, CellIndex, MapLimits};
pub use probability_grid::{GridError, ProbabilityGrid};
