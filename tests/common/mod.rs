//! Shared fixtures for the workspace-level tests

use coxed::baseline::{BaselineBuilder, SimulationBaseline};
use coxed::simulate::{DurationSimulator, SimType, SimulatedDataset, SimulationConfig};
use nalgebra::DVector;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub fn baseline(horizon: usize, knots: usize, seed: u64) -> SimulationBaseline {
    BaselineBuilder::new(horizon, knots)
        .unwrap()
        .build(&mut ChaCha8Rng::seed_from_u64(seed))
        .unwrap()
}

pub fn simulate(
    baseline: &SimulationBaseline,
    n: usize,
    beta: &[f64],
    censor: f64,
    sim_type: SimType,
    seed: u64,
) -> SimulatedDataset {
    let config = SimulationConfig {
        n,
        xvars: beta.len(),
        censor,
        sim_type,
        ..Default::default()
    }
    .with_beta(DVector::from_vec(beta.to_vec()));
    DurationSimulator::new(config)
        .unwrap()
        .generate(baseline, &mut ChaCha8Rng::seed_from_u64(seed))
        .unwrap()
}

/// Install a test subscriber once; honours `RUST_LOG`
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
