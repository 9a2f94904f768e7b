// src/collision.rs - Hard-contact check against the oracle's geometry
use armopt_shared::{KinematicsOracle, OracleError};
use nalgebra::Vector3;

use crate::oracle::OracleSession;

/// Collision indicator backed by the oracle's contact queries.
///
/// Only the robot base is moved to each sample position; the joint state is
/// whatever the oracle currently holds. This is a coarse proxy for sweeping
/// the full arm along the path.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollisionChecker;

impl CollisionChecker {
    pub fn new() -> Self {
        Self
    }

    /// `1.0` if any sample is in contact, `0.0` otherwise.
    ///
    /// Holds the session for the whole pass and resets it before returning,
    /// on both the success and the error path.
    pub fn has_collision(&self, session: &OracleSession, positions: &[Vector3<f64>]) -> Result<f64, OracleError> {
        let mut oracle = session.lock()?;
        let result = Self::scan(&mut **oracle, positions);
        let reset = oracle.reset_session();
        let hit = result?;
        reset?;
        Ok(hit)
    }

    fn scan(oracle: &mut dyn KinematicsOracle, positions: &[Vector3<f64>]) -> Result<f64, OracleError> {
        for (i, p) in positions.iter().enumerate() {
            if oracle.set_pose_and_query_contacts(p)? {
                tracing::debug!("Contact at sample {} ({:.3}, {:.3}, {:.3})", i, p.x, p.y, p.z);
                return Ok(1.0);
            }
        }
        Ok(0.0)
    }
}
