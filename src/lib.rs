//! Duration-based quantities of interest for Cox proportional hazards models
//!
//! This crate gathers the workspace behind one dependency:
//!
//! - [`baseline`]: risk sets, step baselines and simulation baselines
//! - [`duration`]: the NPSF and GAM expected-duration engines
//! - [`confidence`]: bootstrap standard errors and intervals
//! - [`simulate`]: survival data with a known baseline hazard
//! - [`Coxed`]: the facade tying engines and bootstrap together
//!
//! # Example
//!
//! ```rust
//! use coxed::prelude::*;
//! use coxed::simulate::{DurationSimulator, SimulationConfig};
//! use coxed::baseline::BaselineBuilder;
//! use nalgebra::DVector;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(1);
//! let baseline = BaselineBuilder::new(50, 5).unwrap().build(&mut rng).unwrap();
//! let config = SimulationConfig { n: 300, xvars: 1, ..Default::default() }
//!     .with_beta(DVector::from_vec(vec![0.6]));
//! let data = DurationSimulator::new(config).unwrap().generate(&baseline, &mut rng).unwrap();
//!
//! let model = data.to_cox_model(data.beta()).unwrap();
//! let qoi = Coxed::new(&model, QoiConfig::default()).unwrap();
//! let effect = qoi.covariate_effect(None, 0, 0.0, 1.0).unwrap();
//! assert!(effect.mean.estimate < 0.0);
//! ```

pub use coxed_baseline as baseline;
pub use coxed_confidence as confidence;
pub use coxed_duration as duration;
pub use coxed_simulate as simulate;

pub use coxed_core::{CoxModel, Error, FittedModel, NewData, Result, Warning};
pub use coxed_qoi::{Coxed, IntervalKind, Method, QoiConfig, QoiResult};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use coxed_core::prelude::*;
    pub use coxed_qoi::{Coxed, IntervalKind, Method, QoiConfig, QoiResult};
}
