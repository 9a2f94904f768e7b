// src/fitness/constraints.rs - Feasibility margins and the folded penalty
use std::f64::consts::PI;

use nalgebra::Vector3;

use crate::config::ProblemConfig;

/// Multiplier applied to the summed positive margins.
pub const PENALTY_FACTOR: f64 = 1000.0;

/// Signed constraint margins; a positive value is a violation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConstraintMargins {
    /// Peak Cartesian speed minus `v_max`
    pub speed: f64,
    /// Peak acceleration norm minus `a_max`
    pub acceleration: f64,
    /// Largest absolute joint angle minus π
    pub joint_limit: f64,
    /// Number of samples whose height leaves `z_range`
    pub workspace: f64,
}

impl ConstraintMargins {
    pub fn compute(
        velocities: &[Vector3<f64>],
        accelerations: &[Vector3<f64>],
        joint_angles: &[Vec<f64>],
        positions: &[Vector3<f64>],
        problem: &ProblemConfig,
    ) -> Self {
        let peak = |vs: &[Vector3<f64>]| vs.iter().map(|v| v.norm()).fold(0.0, f64::max);
        let max_angle = joint_angles
            .iter()
            .flat_map(|q| q.iter())
            .map(|q| q.abs())
            .fold(0.0, f64::max);
        let (z_min, z_max) = problem.z_range;
        let outside = positions.iter().filter(|p| p.z < z_min || p.z > z_max).count();

        Self {
            speed: peak(velocities) - problem.v_max,
            acceleration: peak(accelerations) - problem.a_max,
            joint_limit: max_angle - PI,
            workspace: outside as f64,
        }
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.speed, self.acceleration, self.joint_limit, self.workspace]
    }

    pub fn penalty(&self) -> f64 {
        penalty(&self.as_array())
    }

    pub fn is_feasible(&self) -> bool {
        self.penalty() == 0.0
    }
}

/// `PENALTY_FACTOR · Σ max(0, m)`
pub fn penalty(margins: &[f64]) -> f64 {
    PENALTY_FACTOR * margins.iter().map(|m| m.max(0.0)).sum::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_penalty_ignores_satisfied_margins() {
        assert_eq!(penalty(&[-1.0, -0.5, 0.0, -3.0]), 0.0);
        assert_relative_eq!(penalty(&[0.2, -1.0, 0.0, 2.0]), 2200.0, epsilon = 1e-9);
    }

    #[test]
    fn test_penalty_is_monotone_in_each_margin() {
        let base = [-0.5, 0.25, -0.75, 0.0];
        for i in 0..4 {
            let mut previous = penalty(&base);
            for step in 1..=10 {
                let mut m = base;
                m[i] += 0.25 * step as f64;
                let current = penalty(&m);
                if m[i] > 0.0 {
                    assert!(current > previous, "margin {} at {}", i, m[i]);
                } else {
                    assert_eq!(current, previous);
                }
                previous = current;
            }
        }
    }

    #[test]
    fn test_margins_from_samples() {
        let problem = ProblemConfig {
            v_max: 1.0,
            a_max: 2.0,
            z_range: (0.0, 1.0),
            ..ProblemConfig::default()
        };
        let velocities = vec![Vector3::new(0.5, 0.0, 0.0), Vector3::new(0.0, 1.5, 0.0)];
        let accelerations = vec![Vector3::new(0.0, 0.0, 1.0)];
        let joints = vec![vec![0.1, -3.5], vec![2.0, 0.0]];
        let positions = vec![Vector3::new(0.0, 0.0, 0.5), Vector3::new(0.0, 0.0, -0.1), Vector3::new(0.0, 0.0, 1.2)];
        let m = ConstraintMargins::compute(&velocities, &accelerations, &joints, &positions, &problem);
        assert_relative_eq!(m.speed, 0.5);
        assert_relative_eq!(m.acceleration, -1.0);
        assert_relative_eq!(m.joint_limit, 3.5 - PI);
        assert_eq!(m.workspace, 2.0);
        assert!(!m.is_feasible());
        assert_relative_eq!(m.penalty(), 1000.0 * (0.5 + 3.5 - PI + 2.0), epsilon = 1e-9);
    }
}
