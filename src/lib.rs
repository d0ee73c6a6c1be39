//! # AntaraSLAM
//!
//! Local 2D LiDAR SLAM front-end: a rolling pair of submap occupancy
//! grids fed by ray insertion, with a real-time correlative scan matcher
//! refining each pose before insertion.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                     slam/                           │  ← Orchestration
//! │     (local trajectory builder, odometry tracker)    │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │              submap/        matching/               │  ← Submap rotation,
//! │   (active submaps)   (correlative matcher)          │    scan-to-map search
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     grid/                           │  ← Quantized occupancy
//! │    (limits, probability grid, inserter, raycast)    │    grids
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     core/                           │  ← Foundation
//! │                 (types, math)                       │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Pipeline
//!
//! Per scan: the odometry tracker predicts a pose, the matcher
//! exhaustively searches a small SE(2) window around it on the matching
//! submap's grid, and the refined pose places the scan into every active
//! submap. After a configured number of scans the newest submap takes
//! over matching and the oldest is finished — immutable from then on,
//! still readable through its shared handle.
//!
//! ## Quick start
//!
//! ```rust
//! use antara_slam::{LocalSlamConfig, LocalTrajectoryBuilder};
//!
//! let mut builder = LocalTrajectoryBuilder::new(LocalSlamConfig::default()).unwrap();
//! let points = vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [-1.0, 0.0, 0.0]];
//! let result = builder.add_rangefinder_data(0, [0.0; 3], &points).unwrap();
//! println!("pose: {:?}", result.local_pose);
//! ```
//!
//! ## Coordinate conventions
//!
//! World x/y in meters, yaw CCW positive from +x. Grid cell indices grow
//! toward smaller world coordinates from the grid's max corner.

#![warn(missing_docs)]

// Layer 1: core foundation (no internal deps)
pub mod core;

// Layer 2: grid storage and insertion
pub mod grid;

// Layer 3: scan matching
pub mod matching;

// Layer 3: submap rotation
pub mod submap;

// Layer 4: orchestration
pub mod slam;

// Unified configuration
pub mod config;

// Re-export commonly used types
pub use crate::core::{OdometryData, Point2D, PointCloud2D, Pose2D, RangeData};

pub use config::{ConfigError, LocalSlamConfig};

pub use grid::{
    CellDims, CellIndex, GridError, MapLimits, ProbabilityGrid, RangeDataInserter,
    RangeDataInserterConfig,
};

pub use matching::{
    RealTimeCorrelativeScanMatcher, RealTimeCorrelativeScanMatcherConfig, ScanMatch,
    SearchParameters,
};

pub use submap::{ActiveSubmaps, Submap, SubmapError};

pub use slam::{LocalTrajectoryBuilder, OdometryTracker, ScanResult};
