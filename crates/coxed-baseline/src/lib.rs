//! Baseline hazard and survivor functions
//!
//! Two directions share this crate:
//!
//! - **estimation**: [`RiskSetTable`] aggregates observed times and
//!   [`BaselineFunctions`] turns it into a right-continuous step cumulative
//!   hazard, as used by the NPSF duration engine
//! - **simulation**: [`BaselineBuilder`] draws a smooth, known
//!   [`SimulationBaseline`] on an integer grid for generating survival data
//!
//! # Example
//!
//! ```rust
//! use coxed_baseline::{BaselineFunctions, RiskSetRow, RiskSetTable};
//!
//! let table = RiskSetTable::from_rows(vec![RiskSetRow {
//!     time: 5.0,
//!     failures: 3,
//!     risk_set: 10.0,
//! }])
//! .unwrap();
//! let baseline = BaselineFunctions::from_risk_sets(&table).unwrap();
//! assert!((baseline.survivor_at(5.0) - 0.7408).abs() < 1e-4);
//! ```

pub mod builder;
pub mod functions;
pub mod risk_set;
pub mod spline;

pub use builder::{BaselineBuilder, SimulationBaseline};
pub use functions::{BaselineFunctions, BaselineRecord};
pub use risk_set::{RiskSetRow, RiskSetTable};
pub use spline::{Interpolant, Interpolation};
