//! Scan-to-map alignment.

mod correlative;
mod search;

pub use correlative::{
    RealTimeCorrelativeScanMatcher, RealTimeCorrelativeScanMatcherConfig, ScanMatch,
};
pub use search::{
    discretize_scans, generate_rotated_scans, Candidate, DiscreteScan, LinearBounds,
    SearchParameters,
};
