// armopt_shared: oracle contract and wire types shared by the evaluator, simulator and robot drivers

pub mod protocol;

use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use thiserror::Error;

/// End-effector pose reported by an oracle or predicted by a surrogate.
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    /// Cartesian position (m)
    pub position: Vector3<f64>,
    /// Unit quaternion orientation
    pub orientation: UnitQuaternion<f64>,
}

impl Pose {
    pub fn new(position: Vector3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Self { position, orientation }
    }

    /// Build a pose from raw `[x, y, z]` and `[w, x, y, z]` arrays.
    /// The quaternion is renormalized; a degenerate one maps to identity.
    pub fn from_arrays(position: [f64; 3], wxyz: [f64; 4]) -> Self {
        let q = Quaternion::new(wxyz[0], wxyz[1], wxyz[2], wxyz[3]);
        let orientation = if q.norm() > 1e-12 && q.coords.iter().all(|c| c.is_finite()) {
            UnitQuaternion::from_quaternion(q)
        } else {
            UnitQuaternion::identity()
        };
        Self {
            position: Vector3::new(position[0], position[1], position[2]),
            orientation,
        }
    }

    /// Orientation as `[w, x, y, z]`, sign-canonicalized so that `w >= 0`.
    pub fn orientation_wxyz(&self) -> [f64; 4] {
        let q = self.orientation.quaternion();
        let sign = if q.w < 0.0 { -1.0 } else { 1.0 };
        [sign * q.w, sign * q.i, sign * q.j, sign * q.k]
    }

    pub fn position_array(&self) -> [f64; 3] {
        [self.position.x, self.position.y, self.position.z]
    }

    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|v| v.is_finite())
            && self.orientation.quaternion().coords.iter().all(|v| v.is_finite())
    }
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Joint count mismatch: expected {expected}, got {actual}")]
    JointCount { expected: usize, actual: usize },
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    #[error("Simulation error: {0}")]
    Simulation(String),
    #[error("Link error: {0}")]
    Link(String),
    #[error("Protocol error: {0}")]
    Protocol(String),
    #[error("Robot reported error: {0}")]
    Robot(String),
    #[error("Oracle session lock poisoned")]
    Poisoned,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Authoritative source of kinematics, dynamics and contact data.
///
/// Implementations are stateful sessions: forward kinematics may move the
/// joints, contact queries move the base. Callers are expected to serialize
/// access and call [`KinematicsOracle::reset_session`] when they are done.
pub trait KinematicsOracle: Send {
    /// Degrees of freedom of the underlying robot.
    fn num_joints(&self) -> usize;

    /// Pose of the end effector for the given joint angles.
    fn forward_kinematics(&mut self, joint_angles: &[f64]) -> Result<Pose, OracleError>;

    /// Joint torques required to realize the given kinematic state.
    fn inverse_dynamics(
        &mut self,
        angles: &[f64],
        velocities: &[f64],
        accelerations: &[f64],
    ) -> Result<Vec<f64>, OracleError>;

    /// Place the robot base at `position` and report whether any contact exists.
    fn set_pose_and_query_contacts(&mut self, position: &Vector3<f64>) -> Result<bool, OracleError>;

    /// Restore the home base pose and zero joint state.
    fn reset_session(&mut self) -> Result<(), OracleError>;
}

impl<T: KinematicsOracle + ?Sized> KinematicsOracle for Box<T> {
    fn num_joints(&self) -> usize {
        (**self).num_joints()
    }

    fn forward_kinematics(&mut self, joint_angles: &[f64]) -> Result<Pose, OracleError> {
        (**self).forward_kinematics(joint_angles)
    }

    fn inverse_dynamics(
        &mut self,
        angles: &[f64],
        velocities: &[f64],
        accelerations: &[f64],
    ) -> Result<Vec<f64>, OracleError> {
        (**self).inverse_dynamics(angles, velocities, accelerations)
    }

    fn set_pose_and_query_contacts(&mut self, position: &Vector3<f64>) -> Result<bool, OracleError> {
        (**self).set_pose_and_query_contacts(position)
    }

    fn reset_session(&mut self) -> Result<(), OracleError> {
        (**self).reset_session()
    }
}

/// Reject a joint vector whose length does not match the robot.
pub fn check_joint_count(expected: usize, values: &[f64]) -> Result<(), OracleError> {
    if values.len() != expected {
        return Err(OracleError::JointCount {
            expected,
            actual: values.len(),
        });
    }
    Ok(())
}
