//! Odometry intake types.

use serde::{Deserialize, Serialize};

use super::pose::Pose2D;

/// One wheel-odometry sample: the odometer's pose estimate at a point
/// in time, in the odometry frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OdometryData {
    /// Timestamp in microseconds since epoch.
    pub timestamp_us: u64,
    /// Odometer pose estimate.
    pub pose: Pose2D,
}

impl OdometryData {
    /// Create a new odometry sample.
    #[inline]
    pub fn new(timestamp_us: u64, pose: Pose2D) -> Self {
        Self { timestamp_us, pose }
    }
}
