//! Simulated survival data for Cox models
//!
//! Durations are drawn by inverse transform against a known
//! [`SimulationBaseline`](coxed_baseline::SimulationBaseline), so quantities
//! such as expected durations and marginal effects have a ground truth:
//!
//! - `none`: fixed covariates and coefficients
//! - `tvc`: covariates change every period and are assigned to subjects by
//!   the [`PermutationalAlgorithm`]
//! - `tvbeta`: the first coefficient grows with `ln(t)`
//!
//! # Example
//!
//! ```rust
//! use coxed_baseline::BaselineBuilder;
//! use coxed_simulate::{DurationSimulator, SimulationConfig};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let baseline = BaselineBuilder::new(100, 8).unwrap().build(&mut rng).unwrap();
//! let config = SimulationConfig { n: 200, xvars: 2, ..Default::default() };
//! let data = DurationSimulator::new(config).unwrap().generate(&baseline, &mut rng).unwrap();
//!
//! assert_eq!(data.n_rows(), 200);
//! assert!(data.durations.iter().all(|d| (1..=100).contains(d)));
//! ```

mod censoring;
mod config;
mod dataset;
mod permutation;
mod simulator;
mod survdata;

pub use config::{CensoringPolicy, SimType, SimulationConfig};
pub use dataset::SimulatedDataset;
pub use permutation::{
    CountingProcessRows, CovariateHistories, PermutationalAlgorithm, TimeVaryingPermutation,
};
pub use simulator::DurationSimulator;
pub use survdata::{
    simulate_survdata, simulate_survdata_with_hazard, true_marginal_effect, MarginalEffect,
    Survdata, SurvdataConfig,
};
