//! Core foundation: types and math primitives.

pub mod math;
pub mod types;

pub use types::{OdometryData, Point2D, PointCloud2D, Pose2D, RangeData};
