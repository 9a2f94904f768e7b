// Loading evaluator configuration files from disk

#[cfg(test)]
mod tests {
    use armopt_rs::config::{load_config, ConfigError, OracleBackend};
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_full_file_is_parsed() {
        let file = write_config(
            r#"
[problem]
n_points = 8
dt = 0.25
v_max = 1.5
a_max = 4.0
tau_max = 80.0
z_range = [0.1, 1.0]
obstacles = [[0.4, 0.2, 0.3]]
weights = [1.0, 2.0, 1.0, 1.0, 1.0, 3.0]
num_samples = 40

[surrogate]
num_samples = 500
seed = 7

[oracle]
backend = "robot"
port = "/dev/ttyACM0"
baud = 250000

[run]
population = 16
parallel = true
"#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.problem.n_points, 8);
        assert_eq!(config.problem.samples(), 40);
        assert_eq!(config.problem.z_range, (0.1, 1.0));
        assert_eq!(config.problem.weight_array()[5], 3.0);
        assert_eq!(config.surrogate.num_samples, 500);
        assert_eq!(config.surrogate.hidden_units, 256);
        assert_eq!(config.oracle.backend, OracleBackend::Robot);
        assert_eq!(config.oracle.port.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(config.oracle.timeout_ms, 500);
        assert_eq!(config.run.population, 16);
        assert!(config.run.parallel);
    }

    #[test]
    fn test_validation_runs_on_load() {
        let file = write_config("[problem]\nweights = [1.0, 1.0]\n");
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::WeightCount { expected: 6, actual: 2 })
        ));

        let file = write_config("[problem]\ndt = 0.0\n");
        assert!(matches!(load_config(file.path()), Err(ConfigError::NonPositiveTimeStep(_))));
    }

    #[test]
    fn test_malformed_and_missing_files() {
        let file = write_config("[problem\nn_points = 3\n");
        assert!(matches!(load_config(file.path()), Err(ConfigError::Toml(_))));
        assert!(matches!(load_config("/nonexistent/armopt.toml"), Err(ConfigError::Io(_))));
    }
}
