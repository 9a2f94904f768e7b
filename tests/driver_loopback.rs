// Robot driver oracle against the simulator's protocol responder

#[cfg(test)]
mod tests {
    use armopt_rs::config::SurrogateConfig;
    use armopt_rs::oracle::{KinematicsOracle, OracleError, OracleSession, RobotDriverOracle, RobotLink};
    use armopt_rs::SurrogateModel;
    use armopt_simulator::{ProtocolResponder, SimConfig, SimulatedArm, SphereObstacle};
    use async_trait::async_trait;
    use nalgebra::Vector3;

    /// In-process link: every frame goes straight to a responder.
    struct LoopbackLink {
        responder: ProtocolResponder<SimulatedArm>,
    }

    #[async_trait]
    impl RobotLink for LoopbackLink {
        async fn exchange(&mut self, frame: &[u8]) -> Result<Vec<u8>, OracleError> {
            self.responder.handle_frame(frame)
        }
    }

    fn arm_config() -> SimConfig {
        SimConfig {
            obstacles: vec![SphereObstacle::new([3.0, 0.0, 0.0], 0.2)],
            ..SimConfig::default()
        }
    }

    fn connect() -> RobotDriverOracle<LoopbackLink> {
        let link = LoopbackLink {
            responder: ProtocolResponder::new(SimulatedArm::new(arm_config())),
        };
        RobotDriverOracle::connect(link).unwrap()
    }

    #[test]
    fn test_driver_matches_direct_simulation() {
        let mut driver = connect();
        let mut direct = SimulatedArm::new(arm_config());
        assert_eq!(driver.num_joints(), direct.num_joints());

        let q = [0.3, -1.1, 0.8, 0.2, -0.4, 1.0];
        let via_link = driver.forward_kinematics(&q).unwrap();
        let local = direct.forward_kinematics(&q).unwrap();
        assert!((via_link.position - local.position).norm() < 1e-9);
        assert!(via_link.orientation.angle_to(&local.orientation) < 1e-9);

        let qd = [0.5; 6];
        let qdd = [-0.2; 6];
        let tau_link = driver.inverse_dynamics(&q, &qd, &qdd).unwrap();
        let tau_local = direct.inverse_dynamics(&q, &qd, &qdd).unwrap();
        for (a, b) in tau_link.iter().zip(&tau_local) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_contacts_and_reset_over_link() {
        let mut driver = connect();
        assert!(!driver.set_pose_and_query_contacts(&Vector3::zeros()).unwrap());
        assert!(driver.set_pose_and_query_contacts(&Vector3::new(3.0, 0.0, 0.0)).unwrap());
        driver.reset_session().unwrap();
        assert_eq!(driver.link().responder.oracle().base_position(), Vector3::zeros());
    }

    #[test]
    fn test_robot_side_errors_surface_as_robot_errors() {
        let mut driver = connect();
        // Joint count matches, but the robot side rejects the request.
        let result = driver.forward_kinematics(&[f64::NAN, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert!(matches!(result, Err(OracleError::Robot(_))));
    }

    #[test]
    fn test_surrogate_trains_through_driver() {
        let session = OracleSession::new(Box::new(connect()));
        let config = SurrogateConfig {
            hidden_units: 32,
            ..SurrogateConfig::default()
        };
        let model = SurrogateModel::train(&session, 60, &config).unwrap();
        assert_eq!(model.num_joints(), 6);
        assert_eq!(model.report().holdout_size, 12);
    }
}
