//! The per-scan match → insert → advance pipeline.

use std::sync::Arc;

use crate::config::{ConfigError, LocalSlamConfig};
use crate::core::{OdometryData, Point2D, PointCloud2D, Pose2D, RangeData};
use crate::matching::RealTimeCorrelativeScanMatcher;
use crate::submap::{ActiveSubmaps, Submap, SubmapError};

use super::odometry_tracker::OdometryTracker;

/// Outcome of processing one scan.
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Scan timestamp in microseconds since epoch.
    pub timestamp_us: u64,
    /// Sensor pose in the local frame used for insertion.
    pub local_pose: Pose2D,
    /// Matcher score, or `None` when there was nothing to match against
    /// or the match was rejected as ambiguous.
    pub match_score: Option<f32>,
    /// Handles to the submaps the scan was inserted into.
    pub insertion_submaps: Vec<Arc<Submap>>,
}

/// Sequences local SLAM for one sensor: predicts a pose from odometry,
/// refines it against the matching submap, and inserts the scan into the
/// active submaps.
///
/// All methods run on the single ingest context; readers obtain submap
/// handles through [`LocalTrajectoryBuilder::submaps`] and snapshot
/// grids on their own threads.
pub struct LocalTrajectoryBuilder {
    options: LocalSlamConfig,
    active_submaps: ActiveSubmaps,
    matcher: RealTimeCorrelativeScanMatcher,
    tracker: OdometryTracker,
}

impl LocalTrajectoryBuilder {
    /// Build the pipeline, rejecting invalid configuration.
    pub fn new(options: LocalSlamConfig) -> Result<Self, ConfigError> {
        options.validate()?;
        Ok(Self {
            active_submaps: ActiveSubmaps::new(&options)?,
            matcher: RealTimeCorrelativeScanMatcher::new(options.matcher)?,
            tracker: OdometryTracker::new(),
            options,
        })
    }

    /// Feed one odometry sample for pose prediction.
    pub fn add_odometry_data(&mut self, odometry: OdometryData) {
        self.tracker.add_odometry(odometry);
    }

    /// Process one rangefinder revolution.
    ///
    /// `origin` and `points` are in the sensor frame with extrinsics
    /// already applied; the z components are dropped. Beams longer than
    /// `max_range` become misses truncated to `missing_data_ray_length`.
    pub fn add_rangefinder_data(
        &mut self,
        timestamp_us: u64,
        origin: [f32; 3],
        points: &[[f32; 3]],
    ) -> Result<ScanResult, SubmapError> {
        let sensor_origin = Point2D::new(origin[0], origin[1]);
        let sensor_range_data = self.assemble_range_data(sensor_origin, points);

        let predicted_pose = self.tracker.predict_pose();
        let mut pose_estimate = predicted_pose;
        let mut match_score = None;

        let matching = self
            .active_submaps
            .matching_submap()
            .filter(|s| s.num_range_data() > 0)
            .cloned();
        if let Some(submap) = matching {
            let result = submap.with_grid(|grid| {
                self.matcher
                    .match_scan(predicted_pose, &sensor_range_data.returns, grid)
            });
            if result.is_ambiguous() {
                log::warn!(
                    "scan at {} us rejected as ambiguous; keeping odometry prediction",
                    timestamp_us
                );
            } else {
                pose_estimate = result.pose;
                match_score = Some(result.score);
            }
        }

        self.tracker.add_pose(pose_estimate);

        let range_data_local = sensor_range_data.transform(&pose_estimate);
        let insertion_submaps = self.active_submaps.insert_range_data(&range_data_local)?;

        Ok(ScanResult {
            timestamp_us,
            local_pose: pose_estimate,
            match_score,
            insertion_submaps,
        })
    }

    /// Shared handles to the currently active submaps.
    pub fn submaps(&self) -> &[Arc<Submap>] {
        self.active_submaps.submaps()
    }

    /// Index of the submap scans are matched against.
    pub fn matching_index(&self) -> usize {
        self.active_submaps.matching_index()
    }

    /// The active configuration.
    pub fn options(&self) -> &LocalSlamConfig {
        &self.options
    }

    fn assemble_range_data(&self, origin: Point2D, points: &[[f32; 3]]) -> RangeData {
        let mut returns = PointCloud2D::with_capacity(points.len());
        let mut misses = PointCloud2D::new();
        for point in points {
            let p = Point2D::new(point[0], point[1]);
            let range = p.distance(&origin);
            if !range.is_finite() || range == 0.0 {
                continue;
            }
            if range <= self.options.max_range {
                returns.push(p);
            } else {
                let scale = self.options.missing_data_ray_length / range;
                misses.push(Point2D::new(
                    origin.x + (p.x - origin.x) * scale,
                    origin.y + (p.y - origin.y) * scale,
                ));
            }
        }
        RangeData {
            origin,
            returns,
            misses,
        }
    }
}
