//! Search space construction for the correlative matcher.

use crate::core::{Point2D, PointCloud2D};
use crate::grid::{CellIndex, MapLimits};

/// Linear cell-offset bounds for one rotated scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearBounds {
    /// Smallest x cell offset.
    pub min_x: i32,
    /// Largest x cell offset.
    pub max_x: i32,
    /// Smallest y cell offset.
    pub min_y: i32,
    /// Largest y cell offset.
    pub max_y: i32,
}

/// Discrete search space derived from the search windows and the scan.
///
/// The angular step is chosen so that at the farthest scan point one
/// step moves the point by at most one cell.
#[derive(Debug, Clone)]
pub struct SearchParameters {
    /// Angular perturbations on each side of the initial rotation.
    pub num_angular_perturbations: i32,
    /// Angular step between adjacent rotated scans in radians.
    pub angular_step: f32,
    /// Total number of rotated scans, `2·n + 1`.
    pub num_scans: usize,
    /// Linear offset bounds per rotated scan.
    pub linear_bounds: Vec<LinearBounds>,
    /// Grid resolution the offsets are expressed in.
    pub resolution: f32,
}

impl SearchParameters {
    /// Derive search bounds from the windows, the (already rotated)
    /// point cloud, and the grid resolution.
    pub fn new(
        linear_search_window: f32,
        angular_search_window: f32,
        point_cloud: &PointCloud2D,
        resolution: f32,
    ) -> Self {
        // Keep acos() defined even for degenerate scans.
        let max_scan_range = point_cloud
            .max_distance_from(&Point2D::new(0.0, 0.0))
            .max(3.0 * resolution);
        let safety_margin = 1.0 - 1e-3;
        let angular_step = safety_margin
            * (1.0 - resolution * resolution / (2.0 * max_scan_range * max_scan_range)).acos();

        let num_angular_perturbations = (angular_search_window / angular_step).ceil() as i32;
        let num_scans = (2 * num_angular_perturbations + 1) as usize;

        let num_linear_perturbations = (linear_search_window / resolution).ceil() as i32;
        let linear_bounds = vec![
            LinearBounds {
                min_x: -num_linear_perturbations,
                max_x: num_linear_perturbations,
                min_y: -num_linear_perturbations,
                max_y: num_linear_perturbations,
            };
            num_scans
        ];

        Self {
            num_angular_perturbations,
            angular_step,
            num_scans,
            linear_bounds,
            resolution,
        }
    }

    /// Yaw offset of the rotated scan at `scan_index`.
    #[inline]
    pub fn orientation(&self, scan_index: usize) -> f32 {
        (scan_index as i32 - self.num_angular_perturbations) as f32 * self.angular_step
    }
}

/// Rotate the cloud into each angular perturbation of the search space.
pub fn generate_rotated_scans(
    point_cloud: &PointCloud2D,
    params: &SearchParameters,
) -> Vec<PointCloud2D> {
    (0..params.num_scans)
        .map(|i| point_cloud.rotated(params.orientation(i)))
        .collect()
}

/// One rotated scan as grid cell indices at offset (0, 0).
pub type DiscreteScan = Vec<CellIndex>;

/// Translate each rotated scan by the initial estimate and quantize every
/// point to its cell index.
pub fn discretize_scans(
    limits: &MapLimits,
    scans: &[PointCloud2D],
    translation: Point2D,
) -> Vec<DiscreteScan> {
    scans
        .iter()
        .map(|scan| {
            scan.iter()
                .map(|p| limits.cell_index(Point2D::new(p.x + translation.x, p.y + translation.y)))
                .collect()
        })
        .collect()
}

/// One pose hypothesis in the discrete search space.
///
/// `x` and `y` are the continuous world displacement the cell offsets
/// correspond to; with the max-corner cell convention a positive index
/// offset shifts the scan toward smaller world coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Index into the rotated scans.
    pub scan_index: usize,
    /// Cell offset applied along x.
    pub x_index_offset: i32,
    /// Cell offset applied along y.
    pub y_index_offset: i32,
    /// Continuous x displacement in meters.
    pub x: f32,
    /// Continuous y displacement in meters.
    pub y: f32,
    /// Yaw offset in radians.
    pub orientation: f32,
    /// Match score in (0, 1]; 0 until scored.
    pub score: f32,
}

impl Candidate {
    /// Build a candidate from its discrete offsets.
    pub fn new(
        scan_index: usize,
        x_index_offset: i32,
        y_index_offset: i32,
        params: &SearchParameters,
    ) -> Self {
        Self {
            scan_index,
            x_index_offset,
            y_index_offset,
            x: -x_index_offset as f32 * params.resolution,
            y: -y_index_offset as f32 * params.resolution,
            orientation: params.orientation(scan_index),
            score: 0.0,
        }
    }

    /// Ordering key: score first, ties broken lexicographically by the
    /// discrete offsets so the argmax is deterministic.
    pub fn cmp_by_score(&self, other: &Candidate) -> std::cmp::Ordering {
        self.score
            .partial_cmp(&other.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| self.scan_index.cmp(&other.scan_index))
            .then_with(|| self.x_index_offset.cmp(&other.x_index_offset))
            .then_with(|| self.y_index_offset.cmp(&other.y_index_offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::CellDims;
    use approx::assert_relative_eq;

    fn cloud_with_max_range(range: f32) -> PointCloud2D {
        PointCloud2D::from_points(vec![Point2D::new(range, 0.0), Point2D::new(0.3, 0.1)])
    }

    #[test]
    fn test_angular_step_moves_farthest_point_one_cell() {
        let resolution = 0.05;
        let range = 5.0;
        let params = SearchParameters::new(0.1, 0.5, &cloud_with_max_range(range), resolution);

        // One angular step displaces the farthest point by at most one cell.
        let displacement = 2.0 * range * (params.angular_step / 2.0).sin();
        assert!(displacement <= resolution + 1e-6);
        assert!(displacement > 0.9 * resolution, "step is not overly conservative");
    }

    #[test]
    fn test_zero_angular_window_gives_single_scan() {
        let params = SearchParameters::new(0.1, 0.0, &cloud_with_max_range(2.0), 0.05);
        assert_eq!(params.num_angular_perturbations, 0);
        assert_eq!(params.num_scans, 1);
        assert_relative_eq!(params.orientation(0), 0.0);
    }

    #[test]
    fn test_linear_bounds_from_window() {
        let params = SearchParameters::new(0.1, 0.0, &cloud_with_max_range(2.0), 0.05);
        let bounds = params.linear_bounds[0];
        assert_eq!(bounds.min_x, -2);
        assert_eq!(bounds.max_x, 2);
        assert_eq!(bounds.min_y, -2);
        assert_eq!(bounds.max_y, 2);
    }

    #[test]
    fn test_rotated_scans_cover_symmetric_offsets() {
        let cloud = cloud_with_max_range(2.0);
        let params = SearchParameters::new(0.05, 0.2, &cloud, 0.05);
        let scans = generate_rotated_scans(&cloud, &params);
        assert_eq!(scans.len(), params.num_scans);

        let mid = params.num_angular_perturbations as usize;
        assert_relative_eq!(scans[mid].points[0].x, cloud.points[0].x, epsilon = 1e-6);
        // First and last scans are rotated by opposite extremes.
        assert_relative_eq!(
            params.orientation(0),
            -params.orientation(params.num_scans - 1),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_discretize_applies_translation() {
        let limits = MapLimits::new(0.05, Point2D::new(1.0, 1.0), CellDims::new(40, 40));
        let cloud = PointCloud2D::from_points(vec![Point2D::new(0.2, 0.0)]);
        let params = SearchParameters::new(0.0, 0.0, &cloud, 0.05);
        let scans = generate_rotated_scans(&cloud, &params);

        let discrete = discretize_scans(&limits, &scans, Point2D::new(0.3, 0.5));
        assert_eq!(discrete.len(), 1);
        assert_eq!(discrete[0][0], limits.cell_index(Point2D::new(0.5, 0.5)));
    }

    #[test]
    fn test_candidate_continuous_offsets() {
        let params = SearchParameters::new(0.1, 0.0, &cloud_with_max_range(2.0), 0.05);
        let candidate = Candidate::new(0, 2, -1, &params);
        // Positive index offsets move the pose toward smaller world
        // coordinates under the max-corner convention.
        assert_relative_eq!(candidate.x, -0.1, epsilon = 1e-6);
        assert_relative_eq!(candidate.y, 0.05, epsilon = 1e-6);
    }

    #[test]
    fn test_candidate_ordering_deterministic_ties() {
        let params = SearchParameters::new(0.1, 0.0, &cloud_with_max_range(2.0), 0.05);
        let mut a = Candidate::new(0, 0, 0, &params);
        let mut b = Candidate::new(0, 1, 0, &params);
        a.score = 0.5;
        b.score = 0.5;
        assert_eq!(a.cmp_by_score(&b), std::cmp::Ordering::Less);
    }
}
