//! Simulation-backed kinematics oracle.
//!
//! [`SimulatedArm`] stands in for a physics engine session: it keeps a joint
//! state and a base pose, answers forward kinematics, inverse dynamics and
//! contact queries, and can be reset to its home state.

pub mod arm;
pub mod contact;
pub mod dynamics;
pub mod responder;

use std::path::Path;

use armopt_shared::{check_joint_count, KinematicsOracle, OracleError, Pose};
use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use arm::{ArmModel, DhLink};
pub use contact::SphereObstacle;
pub use responder::ProtocolResponder;

#[derive(Debug, Error)]
pub enum SimConfigError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Invalid simulation config: {0}")]
    Invalid(String),
}

/// Description of the simulated robot and its static environment.
///
/// ```toml
/// link_radius = 0.04
/// ground_height = -0.5
///
/// [[links]]
/// a = 0.0
/// d = 0.089
/// alpha = 1.5707963
/// mass = 3.7
///
/// [[obstacles]]
/// center = [0.4, 0.0, 0.3]
/// radius = 0.05
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimConfig {
    #[serde(default = "default_links")]
    pub links: Vec<DhLink>,
    #[serde(default)]
    pub obstacles: Vec<SphereObstacle>,
    #[serde(default)]
    pub ground_height: Option<f64>,
    #[serde(default = "default_link_radius")]
    pub link_radius: f64,
    #[serde(default = "default_gravity")]
    pub gravity: [f64; 3],
    #[serde(default)]
    pub home_position: [f64; 3],
}

fn default_links() -> Vec<DhLink> {
    ArmModel::default_6dof().links
}

fn default_link_radius() -> f64 {
    0.04
}

fn default_gravity() -> [f64; 3] {
    [0.0, 0.0, -9.81]
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            links: default_links(),
            obstacles: Vec::new(),
            ground_height: None,
            link_radius: default_link_radius(),
            gravity: default_gravity(),
            home_position: [0.0; 3],
        }
    }
}

impl SimConfig {
    /// Load a simulation description from a TOML (or any `config`-supported) file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SimConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .build()?;
        let sim_config: SimConfig = settings.try_deserialize()?;
        sim_config.validate()?;
        Ok(sim_config)
    }

    pub fn validate(&self) -> Result<(), SimConfigError> {
        if self.links.is_empty() {
            return Err(SimConfigError::Invalid("at least one link is required".to_string()));
        }
        if self.link_radius < 0.0 {
            return Err(SimConfigError::Invalid("link_radius must be non-negative".to_string()));
        }
        if self.links.iter().any(|l| l.mass < 0.0 || l.armature < 0.0) {
            return Err(SimConfigError::Invalid("link masses and armatures must be non-negative".to_string()));
        }
        if self.obstacles.iter().any(|o| o.radius < 0.0) {
            return Err(SimConfigError::Invalid("obstacle radii must be non-negative".to_string()));
        }
        Ok(())
    }
}

/// A single stateful simulation session.
#[derive(Debug, Clone)]
pub struct SimulatedArm {
    model: ArmModel,
    joint_angles: Vec<f64>,
    base_position: Vector3<f64>,
    home_position: Vector3<f64>,
    obstacles: Vec<SphereObstacle>,
    ground_height: Option<f64>,
    link_radius: f64,
    gravity: Vector3<f64>,
    query_count: u64,
}

impl SimulatedArm {
    pub fn new(config: SimConfig) -> Self {
        let model = ArmModel::new(config.links);
        let home = Vector3::new(config.home_position[0], config.home_position[1], config.home_position[2]);
        Self {
            joint_angles: vec![0.0; model.num_joints()],
            model,
            base_position: home,
            home_position: home,
            obstacles: config.obstacles,
            ground_height: config.ground_height,
            link_radius: config.link_radius,
            gravity: Vector3::new(config.gravity[0], config.gravity[1], config.gravity[2]),
            query_count: 0,
        }
    }

    /// The default 6-DOF arm in free space.
    pub fn default_6dof() -> Self {
        Self::new(SimConfig::default())
    }

    pub fn model(&self) -> &ArmModel {
        &self.model
    }

    pub fn joint_angles(&self) -> &[f64] {
        &self.joint_angles
    }

    pub fn base_position(&self) -> Vector3<f64> {
        self.base_position
    }

    /// Total number of oracle queries answered by this session.
    pub fn query_count(&self) -> u64 {
        self.query_count
    }

    fn base_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::from(self.base_position), UnitQuaternion::identity())
    }

    fn check_finite(values: &[f64], what: &str) -> Result<(), OracleError> {
        if values.iter().any(|v| !v.is_finite()) {
            return Err(OracleError::InvalidQuery(format!("non-finite {}", what)));
        }
        Ok(())
    }
}

impl KinematicsOracle for SimulatedArm {
    fn num_joints(&self) -> usize {
        self.model.num_joints()
    }

    fn forward_kinematics(&mut self, joint_angles: &[f64]) -> Result<Pose, OracleError> {
        check_joint_count(self.num_joints(), joint_angles)?;
        Self::check_finite(joint_angles, "joint angles")?;
        self.query_count += 1;
        self.joint_angles.copy_from_slice(joint_angles);
        let flange = self.model.forward_kinematics(&self.base_isometry(), &self.joint_angles);
        Ok(Pose::new(flange.translation.vector, flange.rotation))
    }

    fn inverse_dynamics(
        &mut self,
        angles: &[f64],
        velocities: &[f64],
        accelerations: &[f64],
    ) -> Result<Vec<f64>, OracleError> {
        let n = self.num_joints();
        check_joint_count(n, angles)?;
        check_joint_count(n, velocities)?;
        check_joint_count(n, accelerations)?;
        Self::check_finite(angles, "joint angles")?;
        Self::check_finite(velocities, "joint velocities")?;
        Self::check_finite(accelerations, "joint accelerations")?;
        self.query_count += 1;
        Ok(dynamics::inverse_dynamics(
            &self.model,
            angles,
            velocities,
            accelerations,
            &self.gravity,
        ))
    }

    fn set_pose_and_query_contacts(&mut self, position: &Vector3<f64>) -> Result<bool, OracleError> {
        if position.iter().any(|v| !v.is_finite()) {
            return Err(OracleError::InvalidQuery("non-finite base position".to_string()));
        }
        self.query_count += 1;
        self.base_position = *position;
        let frames = self.model.link_frames(&self.base_isometry(), &self.joint_angles);
        Ok(contact::chain_in_contact(
            &frames,
            self.link_radius,
            &self.obstacles,
            self.ground_height,
        ))
    }

    fn reset_session(&mut self) -> Result<(), OracleError> {
        self.base_position = self.home_position;
        self.joint_angles.iter_mut().for_each(|q| *q = 0.0);
        tracing::trace!("Simulation session reset");
        Ok(())
    }
}
