// src/motion/trajectory.rs
/// Trajectory reconstruction from sparse waypoints
///
/// Waypoints are interpolated per axis by B-splines on a uniform parameter
/// grid, then resampled densely. Velocity, acceleration and jerk are the
/// spline's analytic derivatives converted to time derivatives by dividing by
/// `dt`, `dt²` and `dt³`.
use nalgebra::{DMatrix, Vector3};
use thiserror::Error;

use super::spline::BSpline;

/// Default spline degree (quintic: continuous through jerk)
pub const DEFAULT_DEGREE: usize = 5;

/// Adjacent-sample jump in velocity or acceleration that triggers a warning
pub const CONTINUITY_THRESHOLD: f64 = 1.0;

#[derive(Debug, Error)]
pub enum ReconstructionError {
    #[error("At least 2 waypoints are required, got {0}")]
    TooFewWaypoints(usize),
    #[error("At least 2 samples are required, got {0}")]
    TooFewSamples(usize),
    #[error("Time step must be positive, got {0}")]
    NonPositiveTimeStep(f64),
    #[error("Waypoint {index} has {actual} axes, expected {expected}")]
    RaggedWaypoints { index: usize, expected: usize, actual: usize },
    #[error("Waypoint {0} is not finite")]
    NonFiniteWaypoint(usize),
    #[error("Spline collocation system is singular")]
    SingularSystem,
}

/// Result of the continuity diagnostic on a reconstructed path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContinuityReport {
    pub velocity_jumps: usize,
    pub acceleration_jumps: usize,
    pub max_velocity_jump: f64,
    pub max_acceleration_jump: f64,
}

impl ContinuityReport {
    pub fn is_continuous(&self) -> bool {
        self.velocity_jumps == 0 && self.acceleration_jumps == 0
    }
}

/// Densely sampled Cartesian path.
#[derive(Debug, Clone)]
pub struct CartesianTrajectory {
    /// Position at each sample (m)
    pub positions: Vec<Vector3<f64>>,
    /// Velocity at each sample (m/s)
    pub velocities: Vec<Vector3<f64>>,
    /// Acceleration at each sample (m/s²)
    pub accelerations: Vec<Vector3<f64>>,
    /// Jerk at each sample (m/s³)
    pub jerks: Vec<Vector3<f64>>,
    /// Spline parameter of each sample in `[0, 1]`
    pub params: Vec<f64>,
    pub continuity: ContinuityReport,
}

impl CartesianTrajectory {
    pub fn num_samples(&self) -> usize {
        self.positions.len()
    }
}

/// Densely sampled path with an arbitrary number of axes (e.g. joints).
#[derive(Debug, Clone)]
pub struct AxisTrajectory {
    pub positions: Vec<Vec<f64>>,
    pub velocities: Vec<Vec<f64>>,
    pub accelerations: Vec<Vec<f64>>,
    pub jerks: Vec<Vec<f64>>,
    pub params: Vec<f64>,
}

impl AxisTrajectory {
    pub fn num_samples(&self) -> usize {
        self.positions.len()
    }
}

/// Joint angles, rates and accelerations at each dense sample.
#[derive(Debug, Clone)]
pub struct JointKinematics {
    pub angles: Vec<Vec<f64>>,
    pub rates: Vec<Vec<f64>>,
    pub accelerations: Vec<Vec<f64>>,
}

impl JointKinematics {
    pub fn num_samples(&self) -> usize {
        self.angles.len()
    }
}

/// Spline-based reconstructor with a fixed time step and degree.
#[derive(Debug, Clone)]
pub struct TrajectoryReconstructor {
    dt: f64,
    degree: usize,
    num_samples: Option<usize>,
}

impl TrajectoryReconstructor {
    pub fn new(dt: f64) -> Self {
        Self {
            dt,
            degree: DEFAULT_DEGREE,
            num_samples: None,
        }
    }

    pub fn with_degree(mut self, degree: usize) -> Self {
        self.degree = degree;
        self
    }

    /// Fix the dense sample count; by default it equals the waypoint count.
    pub fn with_num_samples(mut self, num_samples: usize) -> Self {
        self.num_samples = Some(num_samples);
        self
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Reconstruct a Cartesian path and run the continuity diagnostic.
    pub fn reconstruct(&self, waypoints: &[Vector3<f64>]) -> Result<CartesianTrajectory, ReconstructionError> {
        let rows: Vec<&[f64]> = waypoints.iter().map(|w| w.as_slice()).collect();
        let dense = self.reconstruct_rows(&rows)?;

        let to_vectors = |rows: Vec<Vec<f64>>| -> Vec<Vector3<f64>> {
            rows.into_iter().map(|r| Vector3::new(r[0], r[1], r[2])).collect()
        };
        let positions = to_vectors(dense.positions);
        let velocities = to_vectors(dense.velocities);
        let accelerations = to_vectors(dense.accelerations);
        let jerks = to_vectors(dense.jerks);

        let continuity = check_continuity(&velocities, &accelerations);
        if !continuity.is_continuous() {
            tracing::warn!(
                "Continuity warning: {} velocity jumps (max {:.3}), {} acceleration jumps (max {:.3}) above {}",
                continuity.velocity_jumps,
                continuity.max_velocity_jump,
                continuity.acceleration_jumps,
                continuity.max_acceleration_jump,
                CONTINUITY_THRESHOLD
            );
        }

        Ok(CartesianTrajectory {
            positions,
            velocities,
            accelerations,
            jerks,
            params: dense.params,
            continuity,
        })
    }

    /// Reconstruct a path with one spline per axis of each waypoint row.
    pub fn reconstruct_axes(&self, waypoints: &[Vec<f64>]) -> Result<AxisTrajectory, ReconstructionError> {
        let rows: Vec<&[f64]> = waypoints.iter().map(|w| w.as_slice()).collect();
        self.reconstruct_rows(&rows)
    }

    /// Reconstruct joint-space kinematics from joint-angle waypoints.
    pub fn reconstruct_joints(&self, waypoints: &[Vec<f64>]) -> Result<JointKinematics, ReconstructionError> {
        let dense = self.reconstruct_axes(waypoints)?;
        Ok(JointKinematics {
            angles: dense.positions,
            rates: dense.velocities,
            accelerations: dense.accelerations,
        })
    }

    fn reconstruct_rows(&self, waypoints: &[&[f64]]) -> Result<AxisTrajectory, ReconstructionError> {
        if !(self.dt > 0.0) {
            return Err(ReconstructionError::NonPositiveTimeStep(self.dt));
        }
        let count = waypoints.len();
        if count < 2 {
            return Err(ReconstructionError::TooFewWaypoints(count));
        }
        let num_samples = self.num_samples.unwrap_or(count);
        if num_samples < 2 {
            return Err(ReconstructionError::TooFewSamples(num_samples));
        }

        let axes = waypoints[0].len();
        let mut values = DMatrix::<f64>::zeros(count, axes);
        for (index, row) in waypoints.iter().enumerate() {
            if row.len() != axes {
                return Err(ReconstructionError::RaggedWaypoints {
                    index,
                    expected: axes,
                    actual: row.len(),
                });
            }
            if row.iter().any(|v| !v.is_finite()) {
                return Err(ReconstructionError::NonFiniteWaypoint(index));
            }
            for (axis, v) in row.iter().enumerate() {
                values[(index, axis)] = *v;
            }
        }

        let splines = BSpline::interpolate_columns(&values, self.degree)?;
        // Derivative order k is scaled by dt^k to convert d/du into d/dt.
        let derivatives: Vec<[BSpline; 4]> = splines
            .iter()
            .map(|s| {
                let d1 = s.derivative();
                let d2 = d1.derivative();
                let d3 = d2.derivative();
                [s.clone(), d1, d2, d3]
            })
            .collect();
        let scales = [1.0, self.dt, self.dt * self.dt, self.dt * self.dt * self.dt];

        let params = BSpline::uniform_sites(num_samples);
        let sample = |order: usize| -> Vec<Vec<f64>> {
            params
                .iter()
                .map(|&u| {
                    derivatives
                        .iter()
                        .map(|d| d[order].evaluate(u) / scales[order])
                        .collect()
                })
                .collect()
        };

        Ok(AxisTrajectory {
            positions: sample(0),
            velocities: sample(1),
            accelerations: sample(2),
            jerks: sample(3),
            params,
        })
    }
}

/// Count adjacent-sample jumps in velocity and acceleration above the threshold.
pub fn check_continuity(velocities: &[Vector3<f64>], accelerations: &[Vector3<f64>]) -> ContinuityReport {
    let mut report = ContinuityReport::default();
    for pair in velocities.windows(2) {
        let jump = (pair[1] - pair[0]).norm();
        report.max_velocity_jump = report.max_velocity_jump.max(jump);
        if jump > CONTINUITY_THRESHOLD {
            report.velocity_jumps += 1;
        }
    }
    for pair in accelerations.windows(2) {
        let jump = (pair[1] - pair[0]).norm();
        report.max_acceleration_jump = report.max_acceleration_jump.max(jump);
        if jump > CONTINUITY_THRESHOLD {
            report.acceleration_jumps += 1;
        }
    }
    report
}
