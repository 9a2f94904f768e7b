// Integration tests for loading simulation descriptions from disk

use armopt_simulator::{SimConfig, SimulatedArm};
use armopt_shared::KinematicsOracle;
use std::io::Write;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_two_link_arm_with_obstacle() {
    let file = write_config(
        r#"
link_radius = 0.02
ground_height = -1.0

[[links]]
a = 0.5
d = 0.0
alpha = 0.0
mass = 1.0

[[links]]
a = 0.4
d = 0.0
alpha = 0.0
mass = 0.5

[[obstacles]]
center = [0.9, 0.0, 0.0]
radius = 0.05
"#,
    );
    let config = SimConfig::load(file.path()).unwrap();
    assert_eq!(config.links.len(), 2);
    assert_eq!(config.obstacles.len(), 1);
    assert_eq!(config.gravity, [0.0, 0.0, -9.81]);

    let mut sim = SimulatedArm::new(config);
    assert_eq!(sim.num_joints(), 2);
    let pose = sim.forward_kinematics(&[0.0, 0.0]).unwrap();
    assert!((pose.position.x - 0.9).abs() < 1e-12);
    // Stretched arm touches the obstacle at its tip
    assert!(sim.set_pose_and_query_contacts(&nalgebra::Vector3::zeros()).unwrap());
}

#[test]
fn test_defaults_fill_missing_sections() {
    let file = write_config("link_radius = 0.03\n");
    let config = SimConfig::load(file.path()).unwrap();
    assert_eq!(config.links.len(), 6);
    assert!(config.obstacles.is_empty());
}

#[test]
fn test_invalid_values_are_rejected() {
    let file = write_config("link_radius = -0.1\n");
    assert!(SimConfig::load(file.path()).is_err());
}
