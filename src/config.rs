//! # Problem, Surrogate and Oracle Configuration
//!
//! All construction-time options for an evaluation session live here. Values
//! are validated once, when the file is loaded or the evaluator is built, and
//! are never recomputed during evaluation.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [problem]
//! n_points = 12
//! dt = 0.2
//! v_max = 2.0
//! a_max = 8.0
//! tau_max = 150.0
//! z_range = [0.0, 1.2]
//! obstacles = [[0.4, 0.2, 0.3], [0.1, -0.3, 0.5]]
//! weights = [1.0, 1.0, 1.0, 1.0, 1.0, 2.0]
//!
//! [surrogate]
//! num_samples = 2000
//! hidden_units = 256
//!
//! [oracle]
//! backend = "simulation"
//! sim_config = "arm.toml"
//! ```
//!
//! - Every section is optional and falls back to defaults.
//! - `[oracle] backend = "robot"` expects `port` and `baud` instead of `sim_config`.

// src/config.rs - Single configuration file
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::fitness::NUM_OBJECTIVES;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("n_points must be at least 2, got {0}")]
    TooFewPoints(usize),
    #[error("dt must be positive, got {0}")]
    NonPositiveTimeStep(f64),
    #[error("{name} must be positive, got {value}")]
    NonPositiveLimit { name: &'static str, value: f64 },
    #[error("weights must have exactly {expected} entries, got {actual}")]
    WeightCount { expected: usize, actual: usize },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub problem: ProblemConfig,
    #[serde(default)]
    pub surrogate: SurrogateConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub run: RunConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.problem.validate()?;
        self.surrogate.validate()?;
        Ok(())
    }
}

/// Trajectory problem definition handed to the fitness evaluator.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProblemConfig {
    /// Waypoints per candidate trajectory
    #[serde(default = "default_n_points")]
    pub n_points: usize,
    /// Time between waypoints (s)
    #[serde(default = "default_dt")]
    pub dt: f64,
    /// Cartesian speed limit (m/s)
    #[serde(default = "default_v_max")]
    pub v_max: f64,
    /// Cartesian acceleration limit (m/s²)
    #[serde(default = "default_a_max")]
    pub a_max: f64,
    /// Joint torque limit (N·m)
    #[serde(default = "default_tau_max")]
    pub tau_max: f64,
    /// Allowed end-effector height band (m)
    #[serde(default = "default_z_range")]
    pub z_range: (f64, f64),
    /// Obstacle points (m)
    #[serde(default)]
    pub obstacles: Vec<[f64; 3]>,
    /// Per-objective multipliers: time, length, smoothness, energy, orientation, avoidance
    #[serde(default = "default_weights")]
    pub weights: Vec<f64>,
    /// Clearance below which the obstacle barrier is active (m)
    #[serde(default = "default_safe_dist")]
    pub safe_dist: f64,
    #[serde(default = "default_spline_degree")]
    pub spline_degree: usize,
    /// Dense samples per reconstructed path; defaults to `n_points`
    #[serde(default)]
    pub num_samples: Option<usize>,
}

impl Default for ProblemConfig {
    fn default() -> Self {
        Self {
            n_points: default_n_points(),
            dt: default_dt(),
            v_max: default_v_max(),
            a_max: default_a_max(),
            tau_max: default_tau_max(),
            z_range: default_z_range(),
            obstacles: Vec::new(),
            weights: default_weights(),
            safe_dist: default_safe_dist(),
            spline_degree: default_spline_degree(),
            num_samples: None,
        }
    }
}

impl ProblemConfig {
    /// Reject parameters the evaluator cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_points < 2 {
            return Err(ConfigError::TooFewPoints(self.n_points));
        }
        if !(self.dt > 0.0) {
            return Err(ConfigError::NonPositiveTimeStep(self.dt));
        }
        for (name, value) in [("v_max", self.v_max), ("a_max", self.a_max), ("tau_max", self.tau_max)] {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositiveLimit { name, value });
            }
        }
        if self.weights.len() != NUM_OBJECTIVES {
            return Err(ConfigError::WeightCount {
                expected: NUM_OBJECTIVES,
                actual: self.weights.len(),
            });
        }
        if self.weights.iter().any(|w| !w.is_finite()) {
            return Err(ConfigError::Invalid("weights must be finite".to_string()));
        }
        if self.z_range.0 > self.z_range.1 {
            return Err(ConfigError::Invalid(format!(
                "z_range lower bound {} exceeds upper bound {}",
                self.z_range.0, self.z_range.1
            )));
        }
        if self.safe_dist < 0.0 {
            return Err(ConfigError::Invalid("safe_dist must be non-negative".to_string()));
        }
        if self.spline_degree == 0 {
            return Err(ConfigError::Invalid("spline_degree must be at least 1".to_string()));
        }
        if matches!(self.num_samples, Some(n) if n < 2) {
            return Err(ConfigError::Invalid("num_samples must be at least 2".to_string()));
        }
        if self.obstacles.iter().flatten().any(|c| !c.is_finite()) {
            return Err(ConfigError::Invalid("obstacle coordinates must be finite".to_string()));
        }
        Ok(())
    }

    /// Dense sample count used by trajectory reconstruction.
    pub fn samples(&self) -> usize {
        self.num_samples.unwrap_or(self.n_points)
    }

    /// The fixed weights as an array; call after [`ProblemConfig::validate`].
    pub fn weight_array(&self) -> [f64; NUM_OBJECTIVES] {
        let mut weights = [1.0; NUM_OBJECTIVES];
        for (dst, src) in weights.iter_mut().zip(self.weights.iter()) {
            *dst = *src;
        }
        weights
    }
}

/// Surrogate training options.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SurrogateConfig {
    #[serde(default = "default_train_samples")]
    pub num_samples: usize,
    /// Fraction of samples held out for validation
    #[serde(default = "default_holdout_fraction")]
    pub holdout_fraction: f64,
    #[serde(default = "default_hidden_units")]
    pub hidden_units: usize,
    /// Ridge regularization of the read-out layer
    #[serde(default = "default_ridge")]
    pub ridge: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for SurrogateConfig {
    fn default() -> Self {
        Self {
            num_samples: default_train_samples(),
            holdout_fraction: default_holdout_fraction(),
            hidden_units: default_hidden_units(),
            ridge: default_ridge(),
            seed: default_seed(),
        }
    }
}

impl SurrogateConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.holdout_fraction > 0.0 && self.holdout_fraction < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "holdout_fraction must lie in (0, 1), got {}",
                self.holdout_fraction
            )));
        }
        if self.hidden_units == 0 {
            return Err(ConfigError::Invalid("hidden_units must be at least 1".to_string()));
        }
        if !(self.ridge > 0.0) {
            return Err(ConfigError::Invalid("ridge must be positive".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleBackend {
    Simulation,
    Robot,
}

/// Which oracle provider backs the session.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OracleConfig {
    #[serde(default = "default_backend")]
    pub backend: OracleBackend,
    /// Simulation description file; the built-in 6-DOF arm when absent
    #[serde(default)]
    pub sim_config: Option<PathBuf>,
    #[serde(default)]
    pub port: Option<String>,
    #[serde(default = "default_baud")]
    pub baud: u32,
    /// Serial response timeout (ms)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            sim_config: None,
            port: None,
            baud: default_baud(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Options for the command-line driver.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunConfig {
    #[serde(default = "default_population")]
    pub population: usize,
    #[serde(default)]
    pub parallel: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            population: default_population(),
            parallel: false,
        }
    }
}

fn default_n_points() -> usize { 10 }
fn default_dt() -> f64 { 0.1 }
fn default_v_max() -> f64 { 1.0 }
fn default_a_max() -> f64 { 2.0 }
fn default_tau_max() -> f64 { 100.0 }
fn default_z_range() -> (f64, f64) { (0.0, 1.5) }
fn default_weights() -> Vec<f64> { vec![1.0; NUM_OBJECTIVES] }
fn default_safe_dist() -> f64 { 0.03 }
fn default_spline_degree() -> usize { 5 }
fn default_train_samples() -> usize { 1000 }
fn default_holdout_fraction() -> f64 { 0.2 }
fn default_hidden_units() -> usize { 256 }
fn default_ridge() -> f64 { 1e-6 }
fn default_seed() -> u64 { 42 }
fn default_backend() -> OracleBackend { OracleBackend::Simulation }
fn default_baud() -> u32 { 115200 }
fn default_timeout_ms() -> u64 { 500 }
fn default_population() -> usize { 32 }

/// Read, parse and validate a configuration file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_problem_is_valid() {
        assert!(ProblemConfig::default().validate().is_ok());
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_each_invalid_parameter_is_rejected() {
        let base = ProblemConfig::default();

        let c = ProblemConfig { n_points: 1, ..base.clone() };
        assert!(matches!(c.validate(), Err(ConfigError::TooFewPoints(1))));

        let c = ProblemConfig { dt: 0.0, ..base.clone() };
        assert!(matches!(c.validate(), Err(ConfigError::NonPositiveTimeStep(_))));

        let c = ProblemConfig { dt: f64::NAN, ..base.clone() };
        assert!(matches!(c.validate(), Err(ConfigError::NonPositiveTimeStep(_))));

        let c = ProblemConfig { v_max: -1.0, ..base.clone() };
        assert!(matches!(c.validate(), Err(ConfigError::NonPositiveLimit { name: "v_max", .. })));

        let c = ProblemConfig { a_max: 0.0, ..base.clone() };
        assert!(matches!(c.validate(), Err(ConfigError::NonPositiveLimit { name: "a_max", .. })));

        let c = ProblemConfig { tau_max: 0.0, ..base.clone() };
        assert!(matches!(c.validate(), Err(ConfigError::NonPositiveLimit { name: "tau_max", .. })));

        let c = ProblemConfig { weights: vec![1.0; 5], ..base.clone() };
        assert!(matches!(c.validate(), Err(ConfigError::WeightCount { expected: 6, actual: 5 })));
    }

    #[test]
    fn test_boundary_values_are_accepted() {
        let c = ProblemConfig {
            n_points: 2,
            dt: 1e-9,
            v_max: 1e-9,
            a_max: 1e-9,
            tau_max: 1e-9,
            ..ProblemConfig::default()
        };
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
[problem]
n_points = 4
obstacles = [[0.5, 0.5, 0.5]]
"#,
        )
        .unwrap();
        assert_eq!(config.problem.n_points, 4);
        assert_eq!(config.problem.samples(), 4);
        assert_eq!(config.problem.weight_array(), [1.0; 6]);
        assert_eq!(config.problem.obstacles, vec![[0.5, 0.5, 0.5]]);
        assert_eq!(config.oracle.backend, OracleBackend::Simulation);
        assert_eq!(config.surrogate.holdout_fraction, 0.2);
    }

    #[test]
    fn test_surrogate_validation() {
        let c = SurrogateConfig { holdout_fraction: 1.0, ..SurrogateConfig::default() };
        assert!(c.validate().is_err());
        let c = SurrogateConfig { hidden_units: 0, ..SurrogateConfig::default() };
        assert!(c.validate().is_err());
    }
}
