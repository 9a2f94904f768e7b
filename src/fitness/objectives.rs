// src/fitness/objectives.rs - Raw objective terms
use nalgebra::{UnitQuaternion, Vector3};

use super::NUM_OBJECTIVES;

/// Normalization divisors for time, path length, smoothness, energy,
/// orientation and avoidance, in that order.
pub const OBJECTIVE_SCALES: [f64; NUM_OBJECTIVES] = [10.0, 1.0, 100.0, 50.0, 5.0, 1.0];

/// Unnormalized, unweighted objective values of one trajectory.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawObjectives {
    /// Duration (s)
    pub time: f64,
    /// Cartesian path length (m)
    pub path_length: f64,
    pub smoothness: f64,
    pub energy: f64,
    /// Accumulated orientation change (rad)
    pub orientation: f64,
    pub avoidance: f64,
}

impl RawObjectives {
    pub fn as_array(&self) -> [f64; NUM_OBJECTIVES] {
        [
            self.time,
            self.path_length,
            self.smoothness,
            self.energy,
            self.orientation,
            self.avoidance,
        ]
    }

    /// Divide by [`OBJECTIVE_SCALES`] and multiply by `weights`.
    pub fn normalized(&self, weights: &[f64; NUM_OBJECTIVES]) -> [f64; NUM_OBJECTIVES] {
        let mut out = self.as_array();
        for ((value, scale), weight) in out.iter_mut().zip(OBJECTIVE_SCALES).zip(weights) {
            *value = *value / scale * weight;
        }
        out
    }
}

pub fn path_length(positions: &[Vector3<f64>]) -> f64 {
    positions.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
}

/// Σ‖jerk‖² + Σ‖acc‖² + Σ‖v − v̄‖²
pub fn smoothness(velocities: &[Vector3<f64>], accelerations: &[Vector3<f64>], jerks: &[Vector3<f64>]) -> f64 {
    let jerk_term: f64 = jerks.iter().map(|j| j.norm_squared()).sum();
    let accel_term: f64 = accelerations.iter().map(|a| a.norm_squared()).sum();
    let velocity_term = if velocities.is_empty() {
        0.0
    } else {
        let mean = velocities.iter().sum::<Vector3<f64>>() / velocities.len() as f64;
        velocities.iter().map(|v| (v - mean).norm_squared()).sum()
    };
    jerk_term + accel_term + velocity_term
}

/// Mechanical work proxy: Σ over samples and joints of |τ| · |q̇|.
pub fn energy(torques: &[Vec<f64>], joint_rates: &[Vec<f64>]) -> f64 {
    torques
        .iter()
        .zip(joint_rates)
        .map(|(tau, rate)| tau.iter().zip(rate).map(|(t, r)| t.abs() * r.abs()).sum::<f64>())
        .sum()
}

/// Sum of rotation angles between consecutive orientations.
pub fn orientation_change(orientations: &[UnitQuaternion<f64>]) -> f64 {
    orientations.windows(2).map(|w| w[0].angle_to(&w[1])).sum()
}
