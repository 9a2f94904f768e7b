// src/surrogate/mod.rs - Learned approximations of the kinematics oracle
//!
//! A [`SurrogateModel`] is trained once per robot session from oracle samples
//! and then answers forward-kinematics and inverse-dynamics queries without
//! touching the oracle. Three independent regressors are kept: end-effector
//! position, end-effector orientation and joint torques.

pub mod regressor;

use std::f64::consts::PI;

use armopt_shared::{check_joint_count, KinematicsOracle, OracleError, Pose};
use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use thiserror::Error;

pub use regressor::{RandomFeatureRegressor, RegressorError, RegressorParams};

use crate::config::SurrogateConfig;
use crate::oracle::OracleSession;

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("Oracle query failed during training: {0}")]
    Oracle(#[from] OracleError),
    #[error("Oracle returned non-finite {what} for sample {sample}")]
    NonFiniteSample { sample: usize, what: &'static str },
    #[error("{num_samples} samples leave an empty split ({holdout} held out)")]
    EmptySplit { num_samples: usize, holdout: usize },
    #[error("Regression failed: {0}")]
    Regression(#[from] RegressorError),
    #[error("Validation MSE for {0} is not finite")]
    NonFiniteMse(&'static str),
}

/// Held-out accuracy of a trained surrogate.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub train_size: usize,
    pub holdout_size: usize,
    /// Mean squared position error (m²)
    pub position_mse: f64,
    /// Mean squared error of canonical `[w, x, y, z]` quaternion components
    pub orientation_mse: f64,
    /// Mean squared torque error (N²m²)
    pub torque_mse: f64,
}

/// One oracle-labelled training sample.
struct Sample {
    angles: Vec<f64>,
    velocities: Vec<f64>,
    accelerations: Vec<f64>,
    position: [f64; 3],
    orientation: [f64; 4],
    torques: Vec<f64>,
}

/// Trained forward-kinematics and inverse-dynamics approximators.
#[derive(Debug, Clone)]
pub struct SurrogateModel {
    num_joints: usize,
    position: RandomFeatureRegressor,
    orientation: RandomFeatureRegressor,
    torque: RandomFeatureRegressor,
    report: TrainingReport,
}

/// `(sin, cos)` embedding of joint angles.
fn angle_features(angles: &[f64], out: &mut Vec<f64>) {
    for q in angles {
        out.push(q.sin());
        out.push(q.cos());
    }
}

fn fk_input(angles: &[f64]) -> Vec<f64> {
    let mut input = Vec::with_capacity(2 * angles.len());
    angle_features(angles, &mut input);
    input
}

fn dynamics_input(angles: &[f64], velocities: &[f64], accelerations: &[f64]) -> Vec<f64> {
    let mut input = Vec::with_capacity(4 * angles.len());
    angle_features(angles, &mut input);
    input.extend_from_slice(velocities);
    input.extend_from_slice(accelerations);
    input
}

fn rows_to_matrix(rows: &[Vec<f64>]) -> DMatrix<f64> {
    let cols = rows.first().map_or(0, |r| r.len());
    DMatrix::from_fn(rows.len(), cols, |i, j| rows[i][j])
}

fn mean_squared_error(predicted: &[Vec<f64>], expected: &[Vec<f64>]) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for (p, e) in predicted.iter().zip(expected) {
        for (a, b) in p.iter().zip(e) {
            sum += (a - b).powi(2);
            count += 1;
        }
    }
    if count == 0 { f64::NAN } else { sum / count as f64 }
}

impl SurrogateModel {
    /// Sample the oracle, fit the three regressors and validate them on a held-out split.
    ///
    /// The oracle session is locked for the whole pass and reset before
    /// returning, whether or not training succeeded.
    pub fn train(session: &OracleSession, num_samples: usize, config: &SurrogateConfig) -> Result<Self, TrainingError> {
        let holdout = (num_samples as f64 * config.holdout_fraction).round() as usize;
        if holdout == 0 || holdout >= num_samples {
            return Err(TrainingError::EmptySplit { num_samples, holdout });
        }

        tracing::info!("Training surrogate on {} oracle samples", num_samples);
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut samples = {
            let mut oracle = session.lock()?;
            let collected = collect_samples(&mut **oracle, num_samples, &mut rng);
            let reset = oracle.reset_session();
            let collected = collected?;
            reset?;
            collected
        };

        samples.shuffle(&mut rng);
        let (held_out, training) = samples.split_at(holdout);
        let model = Self::fit(session.num_joints(), training, held_out, config)?;

        let report = &model.report;
        tracing::info!(
            "Surrogate trained: {} train / {} held out, MSE position {:.3e}, orientation {:.3e}, torque {:.3e}",
            report.train_size,
            report.holdout_size,
            report.position_mse,
            report.orientation_mse,
            report.torque_mse
        );
        Ok(model)
    }

    fn fit(
        num_joints: usize,
        training: &[Sample],
        held_out: &[Sample],
        config: &SurrogateConfig,
    ) -> Result<Self, TrainingError> {
        let params = |offset: u64| RegressorParams {
            hidden_units: config.hidden_units,
            ridge: config.ridge,
            seed: config.seed.wrapping_add(offset),
        };

        let fk_inputs: Vec<Vec<f64>> = training.iter().map(|s| fk_input(&s.angles)).collect();
        let dyn_inputs: Vec<Vec<f64>> = training
            .iter()
            .map(|s| dynamics_input(&s.angles, &s.velocities, &s.accelerations))
            .collect();
        let positions: Vec<Vec<f64>> = training.iter().map(|s| s.position.to_vec()).collect();
        let orientations: Vec<Vec<f64>> = training.iter().map(|s| s.orientation.to_vec()).collect();
        let torques: Vec<Vec<f64>> = training.iter().map(|s| s.torques.clone()).collect();

        let fk_matrix = rows_to_matrix(&fk_inputs);
        let mut model = Self {
            num_joints,
            position: RandomFeatureRegressor::fit(&fk_matrix, &rows_to_matrix(&positions), params(1))?,
            orientation: RandomFeatureRegressor::fit(&fk_matrix, &rows_to_matrix(&orientations), params(2))?,
            torque: RandomFeatureRegressor::fit(&rows_to_matrix(&dyn_inputs), &rows_to_matrix(&torques), params(3))?,
            report: TrainingReport {
                train_size: training.len(),
                holdout_size: held_out.len(),
                position_mse: 0.0,
                orientation_mse: 0.0,
                torque_mse: 0.0,
            },
        };

        let mut predicted_positions = Vec::with_capacity(held_out.len());
        let mut predicted_orientations = Vec::with_capacity(held_out.len());
        let mut predicted_torques = Vec::with_capacity(held_out.len());
        for s in held_out {
            let pose = model.predict_fk(&s.angles)?;
            predicted_positions.push(pose.position_array().to_vec());
            predicted_orientations.push(pose.orientation_wxyz().to_vec());
            predicted_torques.push(model.predict_torque(&s.angles, &s.velocities, &s.accelerations)?);
        }

        let expected_positions: Vec<Vec<f64>> = held_out.iter().map(|s| s.position.to_vec()).collect();
        let expected_orientations: Vec<Vec<f64>> = held_out.iter().map(|s| s.orientation.to_vec()).collect();
        let expected_torques: Vec<Vec<f64>> = held_out.iter().map(|s| s.torques.clone()).collect();

        model.report.position_mse = mean_squared_error(&predicted_positions, &expected_positions);
        model.report.orientation_mse = mean_squared_error(&predicted_orientations, &expected_orientations);
        model.report.torque_mse = mean_squared_error(&predicted_torques, &expected_torques);
        for (name, mse) in [
            ("position", model.report.position_mse),
            ("orientation", model.report.orientation_mse),
            ("torque", model.report.torque_mse),
        ] {
            if !mse.is_finite() {
                return Err(TrainingError::NonFiniteMse(name));
            }
        }
        Ok(model)
    }

    pub fn num_joints(&self) -> usize {
        self.num_joints
    }

    pub fn report(&self) -> &TrainingReport {
        &self.report
    }

    /// Predicted end-effector pose; the orientation is renormalized.
    pub fn predict_fk(&self, angles: &[f64]) -> Result<Pose, OracleError> {
        check_joint_count(self.num_joints, angles)?;
        let input = fk_input(angles);
        let position = self.position.predict(&input).map_err(|e| OracleError::InvalidQuery(e.to_string()))?;
        let orientation = self
            .orientation
            .predict(&input)
            .map_err(|e| OracleError::InvalidQuery(e.to_string()))?;
        Ok(Pose::from_arrays(
            [position[0], position[1], position[2]],
            [orientation[0], orientation[1], orientation[2], orientation[3]],
        ))
    }

    /// Predicted joint torques for a kinematic state.
    pub fn predict_torque(&self, angles: &[f64], velocities: &[f64], accelerations: &[f64]) -> Result<Vec<f64>, OracleError> {
        check_joint_count(self.num_joints, angles)?;
        check_joint_count(self.num_joints, velocities)?;
        check_joint_count(self.num_joints, accelerations)?;
        self.torque
            .predict(&dynamics_input(angles, velocities, accelerations))
            .map_err(|e| OracleError::InvalidQuery(e.to_string()))
    }
}

fn collect_samples(
    oracle: &mut dyn KinematicsOracle,
    num_samples: usize,
    rng: &mut StdRng,
) -> Result<Vec<Sample>, TrainingError> {
    let n = oracle.num_joints();
    let mut samples = Vec::with_capacity(num_samples);
    for index in 0..num_samples {
        let angles: Vec<f64> = (0..n).map(|_| rng.random_range(-PI..=PI)).collect();
        let velocities: Vec<f64> = (0..n).map(|_| rng.random_range(-1.0..=1.0)).collect();
        let accelerations: Vec<f64> = (0..n).map(|_| rng.random_range(-1.0..=1.0)).collect();

        let pose = oracle.forward_kinematics(&angles)?;
        if !pose.is_finite() {
            return Err(TrainingError::NonFiniteSample { sample: index, what: "pose" });
        }
        let torques = oracle.inverse_dynamics(&angles, &velocities, &accelerations)?;
        if torques.len() != n {
            return Err(OracleError::JointCount {
                expected: n,
                actual: torques.len(),
            }
            .into());
        }
        if torques.iter().any(|t| !t.is_finite()) {
            return Err(TrainingError::NonFiniteSample { sample: index, what: "torques" });
        }

        samples.push(Sample {
            position: pose.position_array(),
            orientation: pose.orientation_wxyz(),
            angles,
            velocities,
            accelerations,
            torques,
        });
    }
    tracing::debug!("Collected {} oracle samples", samples.len());
    Ok(samples)
}
