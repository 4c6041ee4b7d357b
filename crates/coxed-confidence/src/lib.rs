//! Bootstrap uncertainty for Cox expected durations
//!
//! The [`Bootstrap`] driver reruns a duration engine on resampled estimation
//! samples and summarizes the replicate distribution with a
//! [`BootstrapMethod`]:
//!
//! - **Studentized**: `estimate ± z × SE`
//! - **Empirical**: sample quantiles of the replicates
//!
//! Coefficients inside each draw come from a [`CoefficientResampler`]. The
//! fitted coefficients can be kept, drawn from their normal approximation, or
//! re-estimated by a caller-supplied fitter.
//!
//! # Example
//!
//! ```rust
//! use coxed_confidence::{Bootstrap, IntervalKind, NormalApproximation};
//! use coxed_core::{sequential, CoxModel};
//! use coxed_duration::NpsfEngine;
//! use nalgebra::{DMatrix, DVector};
//!
//! let model = CoxModel::new(
//!     vec![2.0, 5.0, 3.0, 8.0, 1.0, 6.0],
//!     vec![true, true, false, true, true, true],
//!     DMatrix::from_row_slice(6, 1, &[0.4, -0.2, 0.1, -1.0, 1.2, 0.0]),
//!     DVector::from_vec(vec![0.8]),
//! )
//! .unwrap()
//! .with_covariance(DMatrix::from_element(1, 1, 0.05))
//! .unwrap();
//!
//! let result = Bootstrap::new(sequential(), IntervalKind::Studentized)
//!     .with_resamples(50)
//!     .unwrap()
//!     .with_seed(42)
//!     .expected_durations(&model, &NpsfEngine, &NormalApproximation, None)
//!     .unwrap();
//!
//! let ci = result.mean.interval.unwrap();
//! assert!(ci.contains(result.mean.estimate));
//! ```

mod bootstrap;
mod bootstrap_methods;
mod resample;
mod types;

// Re-exports
pub use bootstrap::{Bootstrap, BootstrapMethod, BootstrapResult};
pub use bootstrap_methods::{EmpiricalBootstrap, IntervalKind, StudentizedBootstrap};
pub use resample::{AutoCoefficients, CoefficientResampler, FixedCoefficients, NormalApproximation, RefitWith};
pub use types::{ConfidenceInterval, DurationEstimate, SummaryEstimate};
