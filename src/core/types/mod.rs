//! Foundation types shared by every layer.

mod odometry;
mod pose;
mod scan;

pub use odometry::OdometryData;
pub use pose::{Point2D, Pose2D};
pub use scan::{PointCloud2D, RangeData};
