//! End-to-end tests of the match → insert → advance pipeline.

mod common;

use antara_slam::grid::export::to_log_odds_bytes;
use antara_slam::{
    LocalSlamConfig, LocalTrajectoryBuilder, OdometryData, Pose2D,
};
use common::{assert_poses_close, room_beams, straight_trajectory};
use std::sync::Arc;

fn pipeline_config(num_range_data: u32) -> LocalSlamConfig {
    let mut config = LocalSlamConfig {
        resolution: 0.05,
        num_range_data,
        max_range: 15.0,
        ..Default::default()
    };
    config.inserter.hit_probability = 0.65;
    config.matcher.linear_search_window = 0.15;
    config.matcher.angular_search_window = 0.1;
    config
}

#[test]
fn stationary_robot_keeps_its_pose() {
    let mut builder = LocalTrajectoryBuilder::new(pipeline_config(10)).unwrap();

    let truth = Pose2D::identity();
    for i in 0..5u64 {
        let result = builder
            .add_rangefinder_data(i * 100_000, [0.0; 3], &room_beams(truth, 2.0, 2.0, 180))
            .unwrap();
        assert_poses_close(&result.local_pose, &truth, 0.08, 0.05);
    }
}

#[test]
fn matcher_absorbs_odometry_drift_along_trajectory() {
    let mut builder = LocalTrajectoryBuilder::new(pipeline_config(20)).unwrap();

    let trajectory = straight_trajectory(8, 0.04);
    let mut timestamp = 0u64;
    let mut last_result = None;
    for (i, truth) in trajectory.iter().enumerate() {
        // Odometry overshoots each step by 25%.
        let drifted = Pose2D::new(truth.x * 1.25, truth.y, truth.theta);
        builder.add_odometry_data(OdometryData::new(timestamp, drifted));
        timestamp += 50_000;

        let result = builder
            .add_rangefinder_data(timestamp, [0.0; 3], &room_beams(*truth, 2.0, 2.0, 240))
            .unwrap();
        timestamp += 50_000;

        if i > 0 {
            assert!(result.match_score.is_some(), "scan {} should match", i);
        }
        last_result = Some(result);
    }

    // The matcher keeps the estimate near the truth despite the biased
    // odometry (grid resolution is 5 cm).
    let final_pose = last_result.unwrap().local_pose;
    assert_poses_close(&final_pose, trajectory.last().unwrap(), 0.11, 0.06);
}

#[test]
fn submap_rotation_preserves_retired_handles() {
    let n = 3;
    let mut builder = LocalTrajectoryBuilder::new(pipeline_config(n)).unwrap();
    let truth = Pose2D::identity();

    builder
        .add_rangefinder_data(0, [0.0; 3], &room_beams(truth, 2.0, 2.0, 120))
        .unwrap();
    let first = Arc::clone(&builder.submaps()[0]);

    for i in 1..(2 * n as u64) {
        builder
            .add_rangefinder_data(i * 100_000, [0.0; 3], &room_beams(truth, 2.0, 2.0, 120))
            .unwrap();
    }

    // After 2N scans the first submap retired with all 2N insertions.
    assert!(first.finished());
    assert_eq!(first.num_range_data(), 2 * n);
    assert_eq!(builder.matching_index(), 1);
    assert_eq!(builder.submaps().len(), 2);
    assert_eq!(builder.submaps()[0].num_range_data(), n);
    assert!(builder
        .submaps()
        .iter()
        .all(|s| !std::ptr::eq(Arc::as_ptr(s), Arc::as_ptr(&first))));

    // The retired submap stays readable and immutable.
    let before = first.grid_copy();
    builder
        .add_rangefinder_data(1_000_000, [0.0; 3], &room_beams(truth, 2.0, 2.0, 120))
        .unwrap();
    let after = first.grid_copy();
    assert_eq!(before.known_cells().count(), after.known_cells().count());
}

#[test]
fn retired_submap_exports_log_odds_bytes() {
    let n = 2;
    let mut builder = LocalTrajectoryBuilder::new(pipeline_config(n)).unwrap();
    let truth = Pose2D::identity();

    builder
        .add_rangefinder_data(0, [0.0; 3], &room_beams(truth, 1.5, 1.5, 120))
        .unwrap();
    let first = Arc::clone(&builder.submaps()[0]);
    for i in 1..=(2 * n as u64) {
        builder
            .add_rangefinder_data(i * 100_000, [0.0; 3], &room_beams(truth, 1.5, 1.5, 120))
            .unwrap();
    }
    assert!(first.finished());

    let cropped = first.grid_copy().compute_cropped_grid();
    let bytes = to_log_odds_bytes(&cropped);
    let dims = cropped.limits().cell_dims();
    assert_eq!(bytes.len(), dims.count());

    // Walls encode above the unknown midpoint, free space below.
    assert!(bytes.iter().any(|&b| b > 128));
    assert!(bytes.iter().any(|&b| (1..128).contains(&b)));
    // Cropping keeps every known cell.
    assert_eq!(
        cropped.known_cells().count(),
        first.grid_copy().known_cells().count()
    );
}

#[test]
fn pipeline_in_a_larger_room_with_motion_and_rotation() {
    let mut config = pipeline_config(40);
    config.matcher.angular_search_window = 0.15;
    let mut builder = LocalTrajectoryBuilder::new(config).unwrap();

    let mut timestamp = 0u64;
    let mut worst_error = 0.0f32;
    for i in 0..10 {
        let truth = Pose2D::new(i as f32 * 0.03, i as f32 * 0.02, i as f32 * 0.01);
        builder.add_odometry_data(OdometryData::new(timestamp, truth));
        timestamp += 50_000;
        let result = builder
            .add_rangefinder_data(timestamp, [0.0; 3], &room_beams(truth, 3.0, 2.5, 240))
            .unwrap();
        timestamp += 50_000;
        worst_error = worst_error.max(result.local_pose.distance(&truth));
    }
    assert!(
        worst_error < 0.12,
        "pose error stayed bounded, worst was {}",
        worst_error
    );
}
