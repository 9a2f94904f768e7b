// Accuracy properties of spline trajectory reconstruction

#[cfg(test)]
mod tests {
    use armopt_rs::motion::TrajectoryReconstructor;
    use nalgebra::Vector3;

    fn helix(count: usize) -> Vec<Vector3<f64>> {
        (0..count)
            .map(|k| {
                let t = 2.0 * k as f64 / (count - 1) as f64;
                Vector3::new(0.3 * t.cos(), 0.3 * t.sin(), 0.4 + 0.1 * t)
            })
            .collect()
    }

    #[test]
    fn test_waypoints_are_interpolated_at_knot_parameters() {
        let waypoints = helix(9);
        for degree in [1, 3, 5] {
            let path = TrajectoryReconstructor::new(0.1)
                .with_degree(degree)
                .reconstruct(&waypoints)
                .unwrap();
            for (p, w) in path.positions.iter().zip(&waypoints) {
                assert!((p - w).norm() < 1e-9, "degree {} misses a waypoint", degree);
            }
        }
    }

    /// Largest gap between finite-difference and analytic velocity.
    fn finite_difference_error(num_samples: usize) -> f64 {
        let dt = 0.2;
        let path = TrajectoryReconstructor::new(dt)
            .with_num_samples(num_samples)
            .reconstruct(&helix(9))
            .unwrap();
        let du = 1.0 / (num_samples - 1) as f64;
        (0..num_samples - 1)
            .map(|i| {
                let fd = (path.positions[i + 1] - path.positions[i]) / (du * dt);
                let mid = (path.velocities[i] + path.velocities[i + 1]) / 2.0;
                (fd - mid).norm()
            })
            .fold(0.0, f64::max)
    }

    #[test]
    fn test_finite_differences_converge_to_velocity() {
        let coarse = finite_difference_error(20);
        let medium = finite_difference_error(80);
        let fine = finite_difference_error(320);
        assert!(medium < coarse);
        assert!(fine < medium);
        assert!(fine < 1e-3);
    }

    #[test]
    fn test_smooth_path_passes_continuity_check() {
        let path = TrajectoryReconstructor::new(1.0)
            .with_num_samples(100)
            .reconstruct(&helix(9))
            .unwrap();
        assert!(path.continuity.is_continuous());
        assert_eq!(path.num_samples(), 100);
    }
}
