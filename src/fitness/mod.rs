// src/fitness/mod.rs - Decision vector to fitness vector
//!
//! [`FitnessEvaluator`] is the surface a population-based optimizer talks to.
//! Each decision vector is a flattened joint trajectory of `n_points`
//! waypoints. It is pushed through the surrogate, reconstructed into a dense
//! path, scored on six objectives and penalized for constraint violations.
//! The penalty is added to every objective; there is no separate constraint
//! channel.

pub mod constraints;
pub mod objectives;

use armopt_shared::OracleError;
use nalgebra::{UnitQuaternion, Vector3};
use rayon::prelude::*;
use thiserror::Error;

pub use constraints::{ConstraintMargins, PENALTY_FACTOR};
pub use objectives::{RawObjectives, OBJECTIVE_SCALES};

use crate::collision::CollisionChecker;
use crate::config::{ConfigError, ProblemConfig};
use crate::motion::{ReconstructionError, TrajectoryReconstructor};
use crate::obstacle::ObstacleField;
use crate::oracle::OracleSession;
use crate::surrogate::SurrogateModel;

/// Time, path length, smoothness, energy, orientation, avoidance.
pub const NUM_OBJECTIVES: usize = 6;

/// Fitness assigned to a member whose evaluation failed.
pub const WORST_CASE_FITNESS: [f64; NUM_OBJECTIVES] = [1e12; NUM_OBJECTIVES];

pub type FitnessVector = [f64; NUM_OBJECTIVES];

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("Decision vector has {actual} values, expected {expected}")]
    DecisionLength { expected: usize, actual: usize },
    #[error("Decision vector contains a non-finite value at index {0}")]
    NonFiniteDecision(usize),
    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),
    #[error("Reconstruction error: {0}")]
    Reconstruction(#[from] ReconstructionError),
    #[error("Evaluation produced a non-finite fitness")]
    NonFiniteFitness,
}

/// Fitness of one decision vector as handed to the optimizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitnessRecord {
    /// Normalized, weighted objectives with the penalty added
    pub objectives: FitnessVector,
    /// Aggregate constraint penalty
    pub penalty: f64,
}

/// Everything computed while scoring one decision vector.
#[derive(Debug, Clone, PartialEq)]
pub struct FitnessBreakdown {
    pub raw: RawObjectives,
    pub margins: ConstraintMargins,
    pub record: FitnessRecord,
    pub continuity_ok: bool,
}

/// Scores decision vectors against a validated problem.
///
/// The obstacle field is built from `problem.obstacles`. Other collaborators
/// are borrowed; the oracle session is reset after each collision pass.
pub struct FitnessEvaluator<'a> {
    problem: &'a ProblemConfig,
    surrogate: &'a SurrogateModel,
    obstacles: ObstacleField,
    session: &'a OracleSession,
    collision: CollisionChecker,
    reconstructor: TrajectoryReconstructor,
    weights: FitnessVector,
}

impl<'a> FitnessEvaluator<'a> {
    pub fn new(
        problem: &'a ProblemConfig,
        surrogate: &'a SurrogateModel,
        session: &'a OracleSession,
    ) -> Result<Self, ConfigError> {
        problem.validate()?;
        if surrogate.num_joints() != session.num_joints() {
            return Err(ConfigError::Invalid(format!(
                "surrogate was trained for {} joints but the oracle has {}",
                surrogate.num_joints(),
                session.num_joints()
            )));
        }
        let reconstructor = TrajectoryReconstructor::new(problem.dt)
            .with_degree(problem.spline_degree)
            .with_num_samples(problem.samples());

        Ok(Self {
            problem,
            surrogate,
            obstacles: ObstacleField::new(&problem.obstacles),
            session,
            collision: CollisionChecker::new(),
            reconstructor,
            weights: problem.weight_array(),
        })
    }

    pub fn obstacles(&self) -> &ObstacleField {
        &self.obstacles
    }

    pub fn num_joints(&self) -> usize {
        self.surrogate.num_joints()
    }

    /// Required decision vector length, `n_points × num_joints`.
    pub fn decision_len(&self) -> usize {
        self.problem.n_points * self.num_joints()
    }

    /// Score one decision vector and keep every intermediate term.
    pub fn evaluate_detailed(&self, decision: &[f64]) -> Result<FitnessBreakdown, EvaluationError> {
        let expected = self.decision_len();
        if decision.len() != expected {
            return Err(EvaluationError::DecisionLength {
                expected,
                actual: decision.len(),
            });
        }
        if let Some(index) = decision.iter().position(|v| !v.is_finite()) {
            return Err(EvaluationError::NonFiniteDecision(index));
        }

        let waypoints: Vec<Vec<f64>> = decision.chunks(self.num_joints()).map(|c| c.to_vec()).collect();

        let mut positions: Vec<Vector3<f64>> = Vec::with_capacity(waypoints.len());
        let mut orientations: Vec<UnitQuaternion<f64>> = Vec::with_capacity(waypoints.len());
        for angles in &waypoints {
            let pose = self.surrogate.predict_fk(angles)?;
            positions.push(pose.position);
            orientations.push(pose.orientation);
        }

        let path = self.reconstructor.reconstruct(&positions)?;
        let joints = self.reconstructor.reconstruct_joints(&waypoints)?;

        let mut torques = Vec::with_capacity(joints.num_samples());
        for i in 0..joints.num_samples() {
            torques.push(
                self.surrogate
                    .predict_torque(&joints.angles[i], &joints.rates[i], &joints.accelerations[i])?,
            );
        }

        let proximity = self.obstacles.penalty(&path.positions, self.problem.safe_dist);
        let contact = self.collision.has_collision(self.session, &path.positions)?;

        let raw = RawObjectives {
            time: self.problem.dt * (self.problem.n_points - 1) as f64,
            path_length: objectives::path_length(&path.positions),
            smoothness: objectives::smoothness(&path.velocities, &path.accelerations, &path.jerks),
            energy: objectives::energy(&torques, &joints.rates),
            orientation: objectives::orientation_change(&orientations),
            avoidance: proximity + contact,
        };

        let margins = ConstraintMargins::compute(
            &path.velocities,
            &path.accelerations,
            &waypoints,
            &path.positions,
            self.problem,
        );
        let penalty = margins.penalty();

        let mut fitness = raw.normalized(&self.weights);
        for value in fitness.iter_mut() {
            *value += penalty;
        }
        if fitness.iter().any(|v| !v.is_finite()) {
            return Err(EvaluationError::NonFiniteFitness);
        }

        tracing::debug!(
            "Evaluated trajectory: raw {:?}, margins {:?}, penalty {:.3}",
            raw.as_array(),
            margins.as_array(),
            penalty
        );

        Ok(FitnessBreakdown {
            raw,
            margins,
            record: FitnessRecord {
                objectives: fitness,
                penalty,
            },
            continuity_ok: path.continuity.is_continuous(),
        })
    }

    pub fn evaluate_one(&self, decision: &[f64]) -> Result<FitnessVector, EvaluationError> {
        Ok(self.evaluate_detailed(decision)?.record.objectives)
    }

    fn evaluate_member(&self, index: usize, decision: &[f64]) -> FitnessVector {
        match self.evaluate_one(decision) {
            Ok(fitness) => fitness,
            Err(e) => {
                tracing::warn!("Population member {} failed evaluation: {}", index, e);
                WORST_CASE_FITNESS
            }
        }
    }

    /// Evaluate a population in order. Failed members get [`WORST_CASE_FITNESS`].
    pub fn evaluate(&self, population: &[Vec<f64>]) -> Vec<FitnessVector> {
        population
            .iter()
            .enumerate()
            .map(|(i, x)| self.evaluate_member(i, x))
            .collect()
    }

    /// Like [`FitnessEvaluator::evaluate`], spread over the rayon pool.
    ///
    /// Oracle access is still serialized by the session, so only the
    /// surrogate and reconstruction work runs concurrently.
    pub fn evaluate_parallel(&self, population: &[Vec<f64>]) -> Vec<FitnessVector> {
        population
            .par_iter()
            .enumerate()
            .map(|(i, x)| self.evaluate_member(i, x))
            .collect()
    }
}
