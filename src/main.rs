// src/main.rs - Evaluate a random population against a trained surrogate
use std::f64::consts::PI;
use std::path::PathBuf;
use std::time::Instant;

use armopt_rs::config::{self, Config};
use armopt_rs::{create_oracle, FitnessEvaluator, OracleSession, SurrogateModel};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Multi-objective robot-arm trajectory evaluator
#[derive(Parser, Debug)]
#[command(name = "armopt", about = "Train a kinematics surrogate and score candidate joint trajectories.")]
struct Cli {
    /// Path to a TOML config file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of random decision vectors to evaluate (overrides [run] population)
    #[arg(short, long)]
    population: Option<usize>,

    /// Seed for the random population
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Evaluate the population on the rayon thread pool
    #[arg(long)]
    parallel: bool,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            config::load_config(path).map_err(|e| {
                tracing::error!("Failed to load config from '{}': {}", path.display(), e);
                e
            })?
        }
        None => Config::default(),
    };

    let oracle = create_oracle(&config.oracle)?;
    let session = OracleSession::new(oracle);
    tracing::info!("Oracle ready: {} joints", session.num_joints());

    let started = Instant::now();
    let surrogate = SurrogateModel::train(&session, config.surrogate.num_samples, &config.surrogate)?;
    tracing::info!("Surrogate training took {:.2?}", started.elapsed());

    let evaluator = FitnessEvaluator::new(&config.problem, &surrogate, &session)?;
    tracing::info!("Scoring against {} obstacle points", evaluator.obstacles().len());

    let population_size = cli.population.unwrap_or(config.run.population);
    let mut rng = StdRng::seed_from_u64(cli.seed);
    let population: Vec<Vec<f64>> = (0..population_size)
        .map(|_| (0..evaluator.decision_len()).map(|_| rng.random_range(-PI..=PI)).collect())
        .collect();

    let started = Instant::now();
    let fitness = if cli.parallel || config.run.parallel {
        evaluator.evaluate_parallel(&population)
    } else {
        evaluator.evaluate(&population)
    };
    tracing::info!(
        "Evaluated {} decision vectors in {:.2?}",
        population.len(),
        started.elapsed()
    );

    for (member, row) in fitness.iter().enumerate() {
        println!("{}", serde_json::json!({ "member": member, "fitness": row }));
    }
    Ok(())
}
