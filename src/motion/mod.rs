// src/motion/mod.rs - Spline reconstruction of sparse waypoint paths

pub mod spline;
pub mod trajectory;

pub use spline::BSpline;
pub use trajectory::{
    AxisTrajectory, CartesianTrajectory, ContinuityReport, JointKinematics, ReconstructionError,
    TrajectoryReconstructor,
};
