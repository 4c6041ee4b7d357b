//! Duration-based quantities of interest for Cox models
//!
//! [`Coxed`] answers three kinds of question about a fitted model:
//!
//! - expected durations of the estimation sample
//! - expected durations of new covariate profiles
//! - marginal effects, the per-target change in expected duration between
//!   two sets of profiles
//!
//! Each answer can carry bootstrap standard errors and intervals.
//!
//! # Example
//!
//! ```rust
//! use coxed_core::{CoxModel, NewData};
//! use coxed_qoi::{Coxed, QoiConfig};
//! use nalgebra::{DMatrix, DVector};
//!
//! let model = CoxModel::new(
//!     vec![3.0, 7.0, 1.0, 9.0, 4.0],
//!     vec![true, true, true, false, true],
//!     DMatrix::from_row_slice(5, 1, &[0.5, -0.5, 1.0, -1.0, 0.0]),
//!     DVector::from_vec(vec![0.9]),
//! )
//! .unwrap();
//!
//! let qoi = Coxed::new(&model, QoiConfig::default()).unwrap();
//! let low = NewData::new(DMatrix::from_row_slice(1, 1, &[-1.0]));
//! let high = NewData::new(DMatrix::from_row_slice(1, 1, &[1.0]));
//! let effect = qoi.marginal_effect(&low, &high).unwrap();
//! assert!(effect.estimates[0].estimate < 0.0);
//! ```

mod config;
mod facade;

pub use config::QoiConfig;
pub use facade::{Coxed, QoiResult};

// Re-export the selectors that appear in configuration
pub use coxed_confidence::IntervalKind;
pub use coxed_duration::{GamConfig, Method};
