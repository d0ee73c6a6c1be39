//! Pose prediction from wheel odometry.

use crate::core::{OdometryData, Pose2D};

/// Accumulates odometry deltas between scans to predict the sensor pose
/// in the local frame.
///
/// Odometry poses live in their own drifting frame; only deltas between
/// consecutive samples are used, composed onto the last scan-matched
/// pose. With no odometry the prediction is the last pose (constant
/// position model).
#[derive(Debug, Clone, Default)]
pub struct OdometryTracker {
    last_odometry: Option<OdometryData>,
    pending_delta: Pose2D,
    last_pose: Pose2D,
}

impl OdometryTracker {
    /// Create a tracker at the identity pose.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one odometry sample.
    ///
    /// Samples older than the newest one seen are dropped.
    pub fn add_odometry(&mut self, odometry: OdometryData) {
        if let Some(last) = self.last_odometry {
            if odometry.timestamp_us < last.timestamp_us {
                log::warn!(
                    "dropping out-of-order odometry ({} < {})",
                    odometry.timestamp_us,
                    last.timestamp_us
                );
                return;
            }
            let delta = last.pose.inverse().compose(&odometry.pose);
            self.pending_delta = self.pending_delta.compose(&delta);
        }
        self.last_odometry = Some(odometry);
    }

    /// Predicted pose for the next scan.
    pub fn predict_pose(&self) -> Pose2D {
        self.last_pose.compose(&self.pending_delta)
    }

    /// Record the scan-matched pose, resetting the pending delta.
    pub fn add_pose(&mut self, pose: Pose2D) {
        self.last_pose = pose;
        self.pending_delta = Pose2D::identity();
    }
}
