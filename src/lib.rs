// src/lib.rs - Multi-objective trajectory evaluation for serial robot arms

pub mod collision;
pub mod config;
pub mod fitness;
pub mod motion;
pub mod obstacle;
pub mod oracle;
pub mod surrogate;

pub use collision::CollisionChecker;
pub use config::{load_config, Config, ConfigError, ProblemConfig};
pub use fitness::{EvaluationError, FitnessEvaluator, FitnessVector, NUM_OBJECTIVES, WORST_CASE_FITNESS};
pub use motion::TrajectoryReconstructor;
pub use obstacle::ObstacleField;
pub use oracle::{create_oracle, KinematicsOracle, OracleError, OracleSession, Pose};
pub use surrogate::{SurrogateModel, TrainingError, TrainingReport};
