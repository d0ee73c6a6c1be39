//! Local SLAM orchestration.

mod local_trajectory_builder;
mod odometry_tracker;

pub use local_trajectory_builder::{LocalTrajectoryBuilder, ScanResult};
pub use odometry_tracker::OdometryTracker;
