//! Expected durations from a fitted Cox model
//!
//! Two engines implement [`DurationEngine`]:
//!
//! - [`NpsfEngine`]: nonparametric step-function baseline plus numerical
//!   integration of each target's survivor curve
//! - [`GamEngine`]: penalized spline regression of observed duration on the
//!   rank of the linear predictor
//!
//! Both take an [`EngineInput`] that can override the coefficients, resample
//! the estimation rows and name the targets without touching the model, which
//! is what lets the bootstrap call them concurrently.
//!
//! # Example
//!
//! ```rust
//! use coxed_core::CoxModel;
//! use coxed_duration::{DurationEngine, EngineInput, NpsfEngine};
//! use nalgebra::{DMatrix, DVector};
//!
//! let model = CoxModel::new(
//!     vec![2.0, 4.0, 6.0, 8.0],
//!     vec![true, true, false, true],
//!     DMatrix::from_row_slice(4, 1, &[0.5, -0.5, 0.0, 1.0]),
//!     DVector::from_vec(vec![0.3]),
//! )
//! .unwrap();
//!
//! let out = NpsfEngine.estimate(&model, &EngineInput::new()).unwrap();
//! assert_eq!(out.durations.len(), 4);
//! ```

pub mod engine;
pub mod gam;
pub mod npsf;
pub mod targets;
pub mod traits;
pub mod types;

pub use engine::{Engine, FitDetail, Method};
pub use gam::{GamConfig, GamEngine};
pub use npsf::{integrate_survivor, NpsfEngine};
pub use targets::TargetSet;
pub use traits::{DurationEngine, EngineInput, EngineOutput};
pub use types::{ExpectedDurations, GamFitRow, GamFitTable};
