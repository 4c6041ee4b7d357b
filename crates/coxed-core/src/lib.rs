//! Core traits and types for Cox duration estimation
//!
//! This crate holds what every other coxed crate shares:
//!
//! - the [`Error`] taxonomy and non-fatal [`Warning`]s
//! - the [`FittedModel`] trait through which a Cox fit produced elsewhere is
//!   consumed, with the [`CoxModel`] holder and [`NewData`] prediction rows
//! - estimation-sample gathering and bootstrap resampling units
//! - execution engines that schedule independent tasks sequentially or on a
//!   Rayon pool
//!
//! # Example
//!
//! ```rust
//! use coxed_core::{CoxModel, FittedModel};
//! use nalgebra::{DMatrix, DVector};
//!
//! let x = DMatrix::from_row_slice(3, 1, &[0.0, 1.0, 2.0]);
//! let model = CoxModel::new(
//!     vec![4.0, 2.0, 1.0],
//!     vec![true, true, false],
//!     x,
//!     DVector::from_vec(vec![0.5]),
//! )
//! .unwrap();
//!
//! let xb = model.linear_predictor(model.covariates(), None).unwrap();
//! assert_eq!(xb[2], 1.0);
//! ```

pub mod error;
pub mod execution;
pub mod math;
pub mod model;
pub mod sample;
pub mod utils;
pub mod warning;

// Re-export core types
pub use error::{Error, Result};
pub use execution::{default_engine, sequential, DefaultEngine, ExecutionEngine, SequentialEngine};
#[cfg(feature = "parallel")]
pub use execution::{parallel, ParallelEngine};
pub use model::{linear_predictor, CoxModel, FittedModel, NewData};
pub use sample::{expand_units, resampling_units, subject_rows, EstimationSample};
pub use warning::Warning;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::Error;
    pub use crate::{CoxModel, ExecutionEngine, FittedModel, NewData, Result, Warning};
}
