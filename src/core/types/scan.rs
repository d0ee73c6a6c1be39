//! Point cloud and range data types.

use serde::{Deserialize, Serialize};

use super::pose::{Point2D, Pose2D};

/// A collection of 2D points in some common frame.
///
/// Output of scan assembly and input to scan matching and insertion.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PointCloud2D {
    /// The points in meters.
    pub points: Vec<Point2D>,
}

impl PointCloud2D {
    /// Create an empty point cloud.
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Create a point cloud with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Create from a vector of points.
    pub fn from_points(points: Vec<Point2D>) -> Self {
        Self { points }
    }

    /// Add a point.
    #[inline]
    pub fn push(&mut self, point: Point2D) {
        self.points.push(point);
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterate over the points.
    pub fn iter(&self) -> impl Iterator<Item = &Point2D> {
        self.points.iter()
    }

    /// Axis-aligned bounding box, or `None` when empty.
    pub fn bounds(&self) -> Option<(Point2D, Point2D)> {
        let first = self.points.first()?;
        let mut min = *first;
        let mut max = *first;
        for p in &self.points[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some((min, max))
    }

    /// Largest point distance from the given origin.
    pub fn max_distance_from(&self, origin: &Point2D) -> f32 {
        self.points
            .iter()
            .map(|p| p.distance(origin))
            .fold(0.0f32, f32::max)
    }

    /// Transform all points by a pose: p' = R(θ)·p + t.
    pub fn transform(&self, pose: &Pose2D) -> PointCloud2D {
        let (sin_t, cos_t) = pose.theta.sin_cos();
        let points = self
            .points
            .iter()
            .map(|p| {
                Point2D::new(
                    pose.x + p.x * cos_t - p.y * sin_t,
                    pose.y + p.x * sin_t + p.y * cos_t,
                )
            })
            .collect();
        PointCloud2D { points }
    }

    /// Rotate all points around the origin by `angle` radians.
    pub fn rotated(&self, angle: f32) -> PointCloud2D {
        self.transform(&Pose2D::new(0.0, 0.0, angle))
    }
}

/// One LiDAR revolution expressed in a common frame.
///
/// `returns` are points where the beam hit an obstacle; `misses` are
/// synthetic endpoints for beams that saw nothing within range. Both are
/// traced from `origin` when free space is inserted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RangeData {
    /// Sensor origin at scan time.
    pub origin: Point2D,
    /// Beam endpoints that hit an obstacle.
    pub returns: PointCloud2D,
    /// Endpoints of beams that did not return within range.
    pub misses: PointCloud2D,
}

impl RangeData {
    /// Transform origin, returns and misses into another frame.
    pub fn transform(&self, pose: &Pose2D) -> RangeData {
        RangeData {
            origin: pose.transform_point(&self.origin),
            returns: self.returns.transform(pose),
            misses: self.misses.transform(pose),
        }
    }
}
