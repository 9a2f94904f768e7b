// src/oracle/session.rs - Serialized access to a single oracle
use std::sync::{Mutex, MutexGuard};

use armopt_shared::{KinematicsOracle, OracleError};

/// Owns one oracle behind a mutex.
///
/// Every core component reaches the oracle through a session. A caller that
/// needs a consistent sequence of queries (a collision pass, a training run)
/// holds the guard from [`OracleSession::lock`] for the whole sequence.
pub struct OracleSession {
    oracle: Mutex<Box<dyn KinematicsOracle>>,
    num_joints: usize,
}

impl OracleSession {
    pub fn new(oracle: Box<dyn KinematicsOracle>) -> Self {
        let num_joints = oracle.num_joints();
        Self {
            oracle: Mutex::new(oracle),
            num_joints,
        }
    }

    pub fn num_joints(&self) -> usize {
        self.num_joints
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, Box<dyn KinematicsOracle>>, OracleError> {
        self.oracle.lock().map_err(|_| OracleError::Poisoned)
    }

    /// Run `f` with exclusive access to the oracle.
    pub fn with_oracle<T>(
        &self,
        f: impl FnOnce(&mut dyn KinematicsOracle) -> Result<T, OracleError>,
    ) -> Result<T, OracleError> {
        let mut guard = self.lock()?;
        f(&mut **guard)
    }

    pub fn reset(&self) -> Result<(), OracleError> {
        self.with_oracle(|oracle| oracle.reset_session())
    }

    pub fn into_inner(self) -> Result<Box<dyn KinematicsOracle>, OracleError> {
        self.oracle.into_inner().map_err(|_| OracleError::Poisoned)
    }
}

impl std::fmt::Debug for OracleSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleSession")
            .field("num_joints", &self.num_joints)
            .finish_non_exhaustive()
    }
}
