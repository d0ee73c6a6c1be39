//! Test utilities shared by the integration tests.

#![allow(dead_code)]

use antara_slam::Pose2D;

/// Beams from `pose` to the walls of a rectangular room spanning
/// `[-half_width, half_width] x [-half_height, half_height]`, returned as
/// sensor-frame points the way the rangefinder intake expects them.
pub fn room_beams(
    pose: Pose2D,
    half_width: f32,
    half_height: f32,
    num_beams: usize,
) -> Vec<[f32; 3]> {
    let mut points = Vec::with_capacity(num_beams);
    for i in 0..num_beams {
        let sensor_angle = i as f32 / num_beams as f32 * std::f32::consts::TAU;
        let world_angle = pose.theta + sensor_angle;
        let (sin_a, cos_a) = world_angle.sin_cos();

        let mut range = f32::MAX;
        if cos_a.abs() > 1e-6 {
            let wall_x = if cos_a > 0.0 { half_width } else { -half_width };
            range = range.min((wall_x - pose.x) / cos_a);
        }
        if sin_a.abs() > 1e-6 {
            let wall_y = if sin_a > 0.0 { half_height } else { -half_height };
            range = range.min((wall_y - pose.y) / sin_a);
        }

        points.push([
            range * sensor_angle.cos(),
            range * sensor_angle.sin(),
            0.0,
        ]);
    }
    points
}

/// A straight trajectory of `n` poses spaced `spacing` meters apart.
pub fn straight_trajectory(n: usize, spacing: f32) -> Vec<Pose2D> {
    (0..n)
        .map(|i| Pose2D::new(i as f32 * spacing, 0.0, 0.0))
        .collect()
}

/// Assert two poses agree within the given tolerances.
pub fn assert_poses_close(a: &Pose2D, b: &Pose2D, trans_tol: f32, rot_tol: f32) {
    let trans_error = a.distance(b);
    let rot_error = antara_slam::core::math::angle_diff(a.theta, b.theta).abs();

    assert!(
        trans_error < trans_tol,
        "translation error {} exceeds tolerance {} ({:?} vs {:?})",
        trans_error,
        trans_tol,
        a,
        b
    );
    assert!(
        rot_error < rot_tol,
        "rotation error {} exceeds tolerance {} ({:?} vs {:?})",
        rot_error,
        rot_tol,
        a,
        b
    );
}
