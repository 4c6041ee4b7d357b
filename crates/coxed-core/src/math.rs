//! Distribution helpers shared by the interval methods and the smoother

use crate::{Error, Result};
use statrs::distribution::{ContinuousCDF, Normal};

/// Two-sided standard normal critical value for a confidence level
///
/// `level = 0.95` gives roughly 1.96.
pub fn normal_critical_value(level: f64) -> Result<f64> {
    if !(level > 0.0 && level < 1.0) {
        return Err(Error::invalid_level(level));
    }
    let normal = Normal::new(0.0, 1.0).map_err(|e| {
        Error::Computation(format!("Failed to create normal distribution: {e}"))
    })?;
    Ok(normal.inverse_cdf(1.0 - (1.0 - level) / 2.0))
}
