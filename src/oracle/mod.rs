// src/oracle/mod.rs - Oracle backends and backend selection

pub mod driver;
pub mod serial;
pub mod session;

use std::time::Duration;

pub use armopt_shared::{KinematicsOracle, OracleError, Pose};
use armopt_simulator::{SimConfig, SimulatedArm};
pub use driver::{RobotDriverOracle, RobotLink};
pub use serial::SerialLink;
pub use session::OracleSession;

use crate::config::{OracleBackend, OracleConfig};

/// Build the oracle selected by `config.backend`.
pub fn create_oracle(config: &OracleConfig) -> Result<Box<dyn KinematicsOracle>, OracleError> {
    match config.backend {
        OracleBackend::Simulation => {
            let sim_config = match &config.sim_config {
                Some(path) => {
                    tracing::info!("Loading simulation description from {}", path.display());
                    SimConfig::load(path).map_err(|e| OracleError::Simulation(e.to_string()))?
                }
                None => SimConfig::default(),
            };
            let arm = SimulatedArm::new(sim_config);
            tracing::info!("Using simulation oracle with {} joints", arm.num_joints());
            Ok(Box::new(arm))
        }
        OracleBackend::Robot => {
            let port = config
                .port
                .as_deref()
                .ok_or_else(|| OracleError::Link("Robot backend requires a serial port".to_string()))?;
            let oracle =
                RobotDriverOracle::open_serial(port, config.baud, Duration::from_millis(config.timeout_ms))?;
            Ok(Box::new(oracle))
        }
    }
}
