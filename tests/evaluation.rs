// End-to-end trajectory evaluation against the simulated arm

#[cfg(test)]
mod tests {
    use armopt_rs::config::{ProblemConfig, SurrogateConfig};
    use armopt_rs::fitness::{ConstraintMargins, FitnessEvaluator, WORST_CASE_FITNESS};
    use armopt_rs::motion::TrajectoryReconstructor;
    use armopt_rs::oracle::{KinematicsOracle, OracleError, OracleSession, Pose};
    use armopt_rs::{CollisionChecker, ObstacleField, SurrogateModel};
    use armopt_simulator::SimulatedArm;
    use nalgebra::Vector3;

    fn trained_surrogate() -> SurrogateModel {
        let session = OracleSession::new(Box::new(SimulatedArm::default_6dof()));
        let config = SurrogateConfig {
            hidden_units: 64,
            ..SurrogateConfig::default()
        };
        SurrogateModel::train(&session, 200, &config).unwrap()
    }

    fn problem() -> ProblemConfig {
        ProblemConfig {
            n_points: 6,
            dt: 0.5,
            z_range: (-10.0, 10.0),
            obstacles: vec![[5.0, 5.0, 5.0]],
            ..ProblemConfig::default()
        }
    }

    #[test]
    fn test_straight_line_within_limits_is_clean() {
        let problem = problem();
        let session = OracleSession::new(Box::new(SimulatedArm::default_6dof()));
        let obstacles = ObstacleField::new(&problem.obstacles);

        let waypoints: Vec<Vector3<f64>> = (0..problem.n_points)
            .map(|k| Vector3::new(0.2 + 0.04 * k as f64, 0.1, 0.5))
            .collect();
        let path = TrajectoryReconstructor::new(problem.dt).reconstruct(&waypoints).unwrap();
        for v in &path.velocities {
            // 0.2 m over the unit parameter interval, divided by dt
            assert!((v.x - 0.4).abs() < 1e-8);
        }

        let avoidance = obstacles.penalty(&path.positions, problem.safe_dist)
            + CollisionChecker::new().has_collision(&session, &path.positions).unwrap();
        assert_eq!(avoidance, 0.0);

        let joints = vec![vec![0.1; 6]; problem.n_points];
        let margins = ConstraintMargins::compute(&path.velocities, &path.accelerations, &joints, &path.positions, &problem);
        assert_eq!(margins.penalty(), 0.0);
    }

    #[test]
    fn test_stationary_trajectory_has_no_penalty_or_avoidance() {
        let problem = problem();
        let surrogate = trained_surrogate();
        let session = OracleSession::new(Box::new(SimulatedArm::default_6dof()));
        let evaluator = FitnessEvaluator::new(&problem, &surrogate, &session).unwrap();

        let decision: Vec<f64> = (0..problem.n_points).flat_map(|_| [0.2, -0.5, 0.4, 0.0, 0.3, 0.0]).collect();
        let breakdown = evaluator.evaluate_detailed(&decision).unwrap();
        assert_eq!(breakdown.raw.avoidance, 0.0);
        assert_eq!(breakdown.record.penalty, 0.0);
        assert!(breakdown.raw.path_length < 1e-9);
        assert!(breakdown.raw.energy < 1e-9);
        assert!(breakdown.raw.orientation < 1e-9);
        assert!((breakdown.raw.time - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_constant_rate_joint_ramp_scores_unpenalized() {
        let problem = ProblemConfig { dt: 1.0, ..problem() };
        let surrogate = trained_surrogate();
        let session = OracleSession::new(Box::new(SimulatedArm::default_6dof()));
        let evaluator = FitnessEvaluator::new(&problem, &surrogate, &session).unwrap();

        // Every joint moves at a constant rate between waypoints.
        let decision: Vec<f64> = (0..problem.n_points)
            .flat_map(|k| {
                let s = k as f64 / (problem.n_points - 1) as f64;
                [0.3 * s, -0.2 * s, 0.2 * s, 0.1 * s, 0.1 * s, 0.1 * s]
            })
            .collect();
        let breakdown = evaluator.evaluate_detailed(&decision).unwrap();

        assert_eq!(breakdown.raw.avoidance, 0.0);
        assert_eq!(breakdown.record.penalty, 0.0);
        assert!(breakdown.margins.is_feasible());
        assert!(breakdown.raw.path_length > 0.0);
        assert!((breakdown.raw.time - 5.0).abs() < 1e-12);
        assert_eq!(breakdown.record.objectives, breakdown.raw.normalized(&problem.weight_array()));
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let problem = problem();
        let surrogate = trained_surrogate();
        let session = OracleSession::new(Box::new(SimulatedArm::default_6dof()));
        let evaluator = FitnessEvaluator::new(&problem, &surrogate, &session).unwrap();

        let population: Vec<Vec<f64>> = (0..6)
            .map(|m| (0..evaluator.decision_len()).map(|i| ((i * 7 + m * 3) % 11) as f64 * 0.1 - 0.5).collect())
            .collect();
        let first = evaluator.evaluate(&population);
        let second = evaluator.evaluate(&population);
        let parallel = evaluator.evaluate_parallel(&population);
        assert_eq!(first, second);
        assert_eq!(first, parallel);
    }

    #[test]
    fn test_faster_motion_is_penalized_more() {
        let surrogate = trained_surrogate();
        let session = OracleSession::new(Box::new(SimulatedArm::default_6dof()));
        let decision: Vec<f64> = (0..6)
            .flat_map(|k| {
                let s = k as f64 / 5.0;
                [1.5 * s, -s, 0.8 * s, 0.0, 0.5 * s, 0.0]
            })
            .collect();

        let mut penalties = Vec::new();
        for dt in [0.05, 0.02, 0.01] {
            let problem = ProblemConfig { dt, ..problem() };
            let evaluator = FitnessEvaluator::new(&problem, &surrogate, &session).unwrap();
            penalties.push(evaluator.evaluate_detailed(&decision).unwrap().record.penalty);
        }
        assert!(penalties[0] > 0.0);
        assert!(penalties[1] > penalties[0]);
        assert!(penalties[2] > penalties[1]);
    }

    /// Answers kinematics like a free arm but fails every contact query.
    struct BrokenContacts(SimulatedArm);

    impl KinematicsOracle for BrokenContacts {
        fn num_joints(&self) -> usize {
            self.0.num_joints()
        }
        fn forward_kinematics(&mut self, q: &[f64]) -> Result<Pose, OracleError> {
            self.0.forward_kinematics(q)
        }
        fn inverse_dynamics(&mut self, q: &[f64], qd: &[f64], qdd: &[f64]) -> Result<Vec<f64>, OracleError> {
            self.0.inverse_dynamics(q, qd, qdd)
        }
        fn set_pose_and_query_contacts(&mut self, _: &Vector3<f64>) -> Result<bool, OracleError> {
            Err(OracleError::Simulation("contact solver unavailable".to_string()))
        }
        fn reset_session(&mut self) -> Result<(), OracleError> {
            self.0.reset_session()
        }
    }

    #[test]
    fn test_oracle_failure_yields_worst_case_without_aborting() {
        let problem = problem();
        let surrogate = trained_surrogate();
        let session = OracleSession::new(Box::new(BrokenContacts(SimulatedArm::default_6dof())));
        let evaluator = FitnessEvaluator::new(&problem, &surrogate, &session).unwrap();

        let population = vec![vec![0.0; evaluator.decision_len()]; 3];
        let rows = evaluator.evaluate_parallel(&population);
        assert_eq!(rows, vec![WORST_CASE_FITNESS; 3]);
    }
}
