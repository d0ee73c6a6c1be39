//! Real-time correlative scan matching.
//!
//! Exhaustively evaluates every pose in a discretized SE(2) window
//! around the initial estimate, scoring each candidate by the mean map
//! probability under the shifted scan, weighted by how far the candidate
//! strays from the prediction. Robust to large initial errors; the
//! search cost is fixed by the window sizes.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::core::{PointCloud2D, Pose2D};
use crate::grid::ProbabilityGrid;

use super::search::{
    discretize_scans, generate_rotated_scans, Candidate, DiscreteScan, SearchParameters,
};

/// Configuration for [`RealTimeCorrelativeScanMatcher`].
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RealTimeCorrelativeScanMatcherConfig {
    /// Half-width of the translational search window in meters.
    #[serde(default = "default_linear_search_window")]
    pub linear_search_window: f32,

    /// Half-width of the rotational search window in radians.
    #[serde(default = "default_angular_search_window")]
    pub angular_search_window: f32,

    /// Penalty weight on translational deviation from the prediction.
    #[serde(default = "default_translation_delta_cost_weight")]
    pub translation_delta_cost_weight: f32,

    /// Penalty weight on rotational deviation from the prediction.
    #[serde(default = "default_rotation_delta_cost_weight")]
    pub rotation_delta_cost_weight: f32,

    /// Runner-up candidates scoring at least this fraction of the best
    /// score take part in the ambiguity check.
    #[serde(default = "default_score_ratio_threshold")]
    pub score_ratio_threshold: f32,

    /// A near-best candidate at least this far away (meters) makes the
    /// match ambiguous.
    #[serde(default = "default_ambiguity_distance")]
    pub ambiguity_distance: f32,
}

fn default_linear_search_window() -> f32 {
    0.1
}
fn default_angular_search_window() -> f32 {
    20.0_f32.to_radians()
}
fn default_translation_delta_cost_weight() -> f32 {
    0.1
}
fn default_rotation_delta_cost_weight() -> f32 {
    0.1
}
fn default_score_ratio_threshold() -> f32 {
    0.95
}
fn default_ambiguity_distance() -> f32 {
    0.2
}

impl Default for RealTimeCorrelativeScanMatcherConfig {
    fn default() -> Self {
        Self {
            linear_search_window: default_linear_search_window(),
            angular_search_window: default_angular_search_window(),
            translation_delta_cost_weight: default_translation_delta_cost_weight(),
            rotation_delta_cost_weight: default_rotation_delta_cost_weight(),
            score_ratio_threshold: default_score_ratio_threshold(),
            ambiguity_distance: default_ambiguity_distance(),
        }
    }
}

impl RealTimeCorrelativeScanMatcherConfig {
    /// Validate windows and weights.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.linear_search_window < 0.0 {
            return Err(ConfigError::NegativeSearchWindow(self.linear_search_window));
        }
        if self.angular_search_window < 0.0 {
            return Err(ConfigError::NegativeSearchWindow(
                self.angular_search_window,
            ));
        }
        if self.translation_delta_cost_weight < 0.0 {
            return Err(ConfigError::NegativeCostWeight(
                self.translation_delta_cost_weight,
            ));
        }
        if self.rotation_delta_cost_weight < 0.0 {
            return Err(ConfigError::NegativeCostWeight(
                self.rotation_delta_cost_weight,
            ));
        }
        Ok(())
    }
}

/// Result of one correlative match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanMatch {
    /// Refined pose estimate; equals the initial estimate when rejected.
    pub pose: Pose2D,
    /// Best candidate score in (0, 1], or 0 for a rejected match.
    pub score: f32,
}

impl ScanMatch {
    /// Whether the match was rejected as ambiguous (or unmatchable).
    #[inline]
    pub fn is_ambiguous(&self) -> bool {
        self.score == 0.0
    }
}

/// Exhaustive SE(2) matcher against a probability grid.
///
/// Reads the grid, never writes it.
#[derive(Debug, Clone)]
pub struct RealTimeCorrelativeScanMatcher {
    config: RealTimeCorrelativeScanMatcherConfig,
}

impl RealTimeCorrelativeScanMatcher {
    /// Create a matcher, rejecting invalid configuration.
    pub fn new(config: RealTimeCorrelativeScanMatcherConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active configuration.
    pub fn config(&self) -> &RealTimeCorrelativeScanMatcherConfig {
        &self.config
    }

    /// Match `point_cloud` (sensor frame) against `grid` around
    /// `initial_pose`.
    ///
    /// Returns the refined pose with the winning score, or score 0 when
    /// the best pose is ambiguous: a candidate scoring within the
    /// configured ratio of the best lies farther than the ambiguity
    /// distance, so the caller should not trust either.
    pub fn match_scan(
        &self,
        initial_pose: Pose2D,
        point_cloud: &PointCloud2D,
        grid: &ProbabilityGrid,
    ) -> ScanMatch {
        if point_cloud.is_empty() {
            return ScanMatch {
                pose: initial_pose,
                score: 0.0,
            };
        }

        let rotated_cloud = point_cloud.rotated(initial_pose.theta);
        let params = SearchParameters::new(
            self.config.linear_search_window,
            self.config.angular_search_window,
            &rotated_cloud,
            grid.limits().resolution(),
        );

        let rotated_scans = generate_rotated_scans(&rotated_cloud, &params);
        let discrete_scans = discretize_scans(grid.limits(), &rotated_scans, initial_pose.translation());

        let mut candidates = generate_exhaustive_search_candidates(&params);
        self.score_candidates(grid, &discrete_scans, &mut candidates);

        candidates.sort_by(|a, b| b.cmp_by_score(a));
        let best = &candidates[0];

        for candidate in &candidates {
            if candidate.score < self.config.score_ratio_threshold * best.score {
                break;
            }
            let dx = candidate.x - best.x;
            let dy = candidate.y - best.y;
            if (dx * dx + dy * dy).sqrt() >= self.config.ambiguity_distance {
                return ScanMatch {
                    pose: initial_pose,
                    score: 0.0,
                };
            }
        }

        ScanMatch {
            pose: Pose2D::new(
                initial_pose.x + best.x,
                initial_pose.y + best.y,
                initial_pose.theta + best.orientation,
            ),
            score: best.score,
        }
    }

    fn score_candidates(
        &self,
        grid: &ProbabilityGrid,
        discrete_scans: &[DiscreteScan],
        candidates: &mut [Candidate],
    ) {
        for candidate in candidates.iter_mut() {
            let scan = &discrete_scans[candidate.scan_index];
            let mut sum = 0.0f32;
            for cell in scan {
                sum += grid
                    .get_probability(cell.offset(candidate.x_index_offset, candidate.y_index_offset));
            }
            let mean = sum / scan.len() as f32;

            let delta = (candidate.x * candidate.x + candidate.y * candidate.y).sqrt()
                * self.config.translation_delta_cost_weight
                + candidate.orientation.abs() * self.config.rotation_delta_cost_weight;
            candidate.score = mean * (-(delta * delta)).exp();
            debug_assert!(candidate.score > 0.0);
        }
    }
}

/// Cartesian product over (scan index, x offset, y offset).
fn generate_exhaustive_search_candidates(params: &SearchParameters) -> Vec<Candidate> {
    let mut count = 0usize;
    for bounds in &params.linear_bounds {
        count += ((bounds.max_x - bounds.min_x + 1) * (bounds.max_y - bounds.min_y + 1)) as usize;
    }

    let mut candidates = Vec::with_capacity(count);
    for scan_index in 0..params.num_scans {
        let bounds = params.linear_bounds[scan_index];
        for x_index_offset in bounds.min_x..=bounds.max_x {
            for y_index_offset in bounds.min_y..=bounds.max_y {
                candidates.push(Candidate::new(
                    scan_index,
                    x_index_offset,
                    y_index_offset,
                    params,
                ));
            }
        }
    }
    debug_assert_eq!(candidates.len(), count);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Point2D, RangeData};
    use crate::grid::{CellDims, MapLimits, RangeDataInserter, RangeDataInserterConfig};
    use approx::assert_relative_eq;

    /// An L-shaped wall as seen from the origin.
    fn l_shape_cloud(n: usize, length: f32) -> PointCloud2D {
        let mut cloud = PointCloud2D::with_capacity(2 * n);
        for i in 0..n {
            let t = i as f32 / (n - 1) as f32;
            cloud.push(Point2D::new(1.0 + t * length, 0.5));
        }
        for i in 1..n {
            let t = i as f32 / (n - 1) as f32;
            cloud.push(Point2D::new(1.0, 0.5 + t * length));
        }
        cloud
    }

    fn grid_with_cloud_at(cloud: &PointCloud2D, pose: Pose2D, hit_probability: f32) -> ProbabilityGrid {
        let mut grid = ProbabilityGrid::new(MapLimits::new(
            0.05,
            Point2D::new(5.0, 5.0),
            CellDims::new(200, 200),
        ));
        let inserter = RangeDataInserter::new(RangeDataInserterConfig {
            hit_probability,
            miss_probability: 0.49,
            insert_free_space: false,
        })
        .unwrap();
        let rd = RangeData {
            origin: pose.translation(),
            returns: cloud.transform(&pose),
            misses: PointCloud2D::new(),
        };
        inserter.insert(&rd, &mut grid).unwrap();
        grid
    }

    fn matcher(config: RealTimeCorrelativeScanMatcherConfig) -> RealTimeCorrelativeScanMatcher {
        RealTimeCorrelativeScanMatcher::new(config).unwrap()
    }

    #[test]
    fn test_rejects_negative_weights() {
        let config = RealTimeCorrelativeScanMatcherConfig {
            rotation_delta_cost_weight: -0.1,
            ..Default::default()
        };
        assert!(matches!(
            RealTimeCorrelativeScanMatcher::new(config),
            Err(ConfigError::NegativeCostWeight(_))
        ));
    }

    #[test]
    fn test_identity_match_scores_high() {
        let cloud = l_shape_cloud(30, 1.5);
        let truth = Pose2D::identity();
        let grid = grid_with_cloud_at(&cloud, truth, 0.9);

        let m = matcher(RealTimeCorrelativeScanMatcherConfig {
            linear_search_window: 0.1,
            angular_search_window: 0.0,
            translation_delta_cost_weight: 0.0,
            rotation_delta_cost_weight: 0.0,
            ..Default::default()
        });
        let result = m.match_scan(truth, &cloud, &grid);

        assert!(!result.is_ambiguous());
        assert!(result.score > 0.5, "score = {}", result.score);
        assert!(result.pose.distance(&truth) <= 0.05 + 1e-6);
    }

    #[test]
    fn test_recovers_translation_offset() {
        let cloud = l_shape_cloud(30, 1.5);
        let truth = Pose2D::identity();
        let grid = grid_with_cloud_at(&cloud, truth, 0.9);

        let m = matcher(RealTimeCorrelativeScanMatcherConfig {
            linear_search_window: 0.1,
            angular_search_window: 0.0,
            translation_delta_cost_weight: 0.0,
            rotation_delta_cost_weight: 0.0,
            ..Default::default()
        });
        // Perturbed initial estimate; the true pose is at the origin.
        let result = m.match_scan(Pose2D::new(0.05, 0.0, 0.0), &cloud, &grid);

        assert!(!result.is_ambiguous());
        assert!(
            result.pose.translation().norm() <= 0.05 + 1e-6,
            "recovered pose {:?} should be within one cell of the origin",
            result.pose
        );
    }

    #[test]
    fn test_recovers_rotation_offset() {
        let cloud = l_shape_cloud(40, 1.5);
        let truth = Pose2D::new(0.0, 0.0, 0.1);
        let grid = grid_with_cloud_at(&cloud, truth, 0.9);

        let m = matcher(RealTimeCorrelativeScanMatcherConfig {
            linear_search_window: 0.05,
            angular_search_window: 0.2,
            translation_delta_cost_weight: 0.0,
            rotation_delta_cost_weight: 0.0,
            ..Default::default()
        });
        let result = m.match_scan(Pose2D::identity(), &cloud, &grid);

        assert!(!result.is_ambiguous());
        assert_relative_eq!(result.pose.theta, 0.1, epsilon = 0.03);
    }

    #[test]
    fn test_translation_weight_monotonicity() {
        let cloud = l_shape_cloud(30, 1.5);
        let grid = grid_with_cloud_at(&cloud, Pose2D::identity(), 0.9);
        let initial = Pose2D::identity();

        let score_candidates = |weight: f32| {
            let m = matcher(RealTimeCorrelativeScanMatcherConfig {
                linear_search_window: 0.1,
                angular_search_window: 0.0,
                translation_delta_cost_weight: weight,
                rotation_delta_cost_weight: 0.0,
                ..Default::default()
            });
            let rotated = cloud.rotated(initial.theta);
            let params = SearchParameters::new(0.1, 0.0, &rotated, grid.limits().resolution());
            let scans = generate_rotated_scans(&rotated, &params);
            let discrete = discretize_scans(grid.limits(), &scans, initial.translation());
            let mut candidates = generate_exhaustive_search_candidates(&params);
            m.score_candidates(&grid, &discrete, &mut candidates);
            candidates
        };

        let unweighted = score_candidates(0.0);
        let weighted = score_candidates(2.0);

        for (a, b) in unweighted.iter().zip(weighted.iter()) {
            assert!(b.score <= a.score + 1e-7, "weights never raise a score");
            if a.x != 0.0 || a.y != 0.0 {
                assert!(
                    b.score < a.score,
                    "nonzero-offset candidate must be strictly penalized"
                );
            }
        }
    }

    #[test]
    fn test_symmetric_environment_is_ambiguous() {
        // The same wall segment twice, 0.5 m apart: two equally good
        // alignments inside the window.
        let segment: Vec<Point2D> = (0..20).map(|i| Point2D::new(1.0, i as f32 * 0.02)).collect();
        let mut both = segment.clone();
        both.extend(segment.iter().map(|p| Point2D::new(p.x + 0.5, p.y)));
        let grid = grid_with_cloud_at(
            &PointCloud2D::from_points(both),
            Pose2D::identity(),
            0.9,
        );

        let m = matcher(RealTimeCorrelativeScanMatcherConfig {
            linear_search_window: 0.6,
            angular_search_window: 0.0,
            translation_delta_cost_weight: 0.0,
            rotation_delta_cost_weight: 0.0,
            ..Default::default()
        });
        let result = m.match_scan(
            Pose2D::new(0.25, 0.0, 0.0),
            &PointCloud2D::from_points(segment),
            &grid,
        );

        assert!(result.is_ambiguous(), "score = {}", result.score);
        assert_eq!(result.pose, Pose2D::new(0.25, 0.0, 0.0));
    }

    #[test]
    fn test_empty_cloud_rejected() {
        let grid = ProbabilityGrid::new(MapLimits::new(
            0.05,
            Point2D::new(1.0, 1.0),
            CellDims::new(20, 20),
        ));
        let m = matcher(RealTimeCorrelativeScanMatcherConfig::default());
        let result = m.match_scan(Pose2D::identity(), &PointCloud2D::new(), &grid);
        assert!(result.is_ambiguous());
    }

    #[test]
    fn test_score_positive_on_unknown_grid() {
        let grid = ProbabilityGrid::new(MapLimits::new(
            0.05,
            Point2D::new(1.0, 1.0),
            CellDims::new(40, 40),
        ));
        let cloud = PointCloud2D::from_points(vec![Point2D::new(0.3, 0.3)]);
        let m = matcher(RealTimeCorrelativeScanMatcherConfig {
            linear_search_window: 0.05,
            angular_search_window: 0.0,
            ..Default::default()
        });
        let result = m.match_scan(Pose2D::new(0.2, 0.2, 0.0), &cloud, &grid);
        assert!(result.score > 0.0);
    }
}
