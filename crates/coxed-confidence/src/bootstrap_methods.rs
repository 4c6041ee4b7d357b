//! Interval constructions from a bootstrap distribution

use crate::{bootstrap::BootstrapMethod, ConfidenceInterval};
use coxed_core::{math, utils, Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Normal-theory interval around the point estimate
///
/// `estimate ± z(level) × SE`, with SE the sample standard deviation of the
/// bootstrap draws.
#[derive(Debug, Clone, Copy, Default)]
pub struct StudentizedBootstrap;

impl BootstrapMethod for StudentizedBootstrap {
    #[instrument(skip(self, bootstrap_estimates), fields(n_estimates = bootstrap_estimates.len()))]
    fn calculate_interval(
        &self,
        bootstrap_estimates: &[f64],
        original_estimate: f64,
        confidence_level: f64,
    ) -> Result<ConfidenceInterval> {
        if bootstrap_estimates.is_empty() {
            return Err(Error::InvalidInput("No bootstrap estimates".to_string()));
        }
        let se = utils::std_dev(bootstrap_estimates);
        let z = math::normal_critical_value(confidence_level)?;
        debug!(se, z, "Studentized interval");

        Ok(ConfidenceInterval::new(
            original_estimate - z * se,
            original_estimate + z * se,
            original_estimate,
            confidence_level,
        ))
    }

    fn name(&self) -> &'static str {
        "Studentized Bootstrap"
    }
}

/// Empirical (percentile) interval
///
/// The `(1 - level) / 2` and `1 - (1 - level) / 2` sample quantiles of the
/// draws, interpolated between order statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmpiricalBootstrap;

impl BootstrapMethod for EmpiricalBootstrap {
    fn calculate_interval(
        &self,
        bootstrap_estimates: &[f64],
        original_estimate: f64,
        confidence_level: f64,
    ) -> Result<ConfidenceInterval> {
        if bootstrap_estimates.is_empty() {
            return Err(Error::InvalidInput("No bootstrap estimates".to_string()));
        }
        if !(confidence_level > 0.0 && confidence_level < 1.0) {
            return Err(Error::invalid_level(confidence_level));
        }

        let sorted = utils::sorted(bootstrap_estimates);
        let tail = (1.0 - confidence_level) / 2.0;
        Ok(ConfidenceInterval::new(
            utils::quantile_sorted(&sorted, tail),
            utils::quantile_sorted(&sorted, 1.0 - tail),
            original_estimate,
            confidence_level,
        ))
    }

    fn name(&self) -> &'static str {
        "Empirical Bootstrap"
    }
}

/// Interval method as it appears in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalKind {
    #[default]
    Studentized,
    Empirical,
}

impl BootstrapMethod for IntervalKind {
    fn calculate_interval(
        &self,
        bootstrap_estimates: &[f64],
        original_estimate: f64,
        confidence_level: f64,
    ) -> Result<ConfidenceInterval> {
        match self {
            Self::Studentized => StudentizedBootstrap.calculate_interval(
                bootstrap_estimates,
                original_estimate,
                confidence_level,
            ),
            Self::Empirical => EmpiricalBootstrap.calculate_interval(
                bootstrap_estimates,
                original_estimate,
                confidence_level,
            ),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Studentized => StudentizedBootstrap.name(),
            Self::Empirical => EmpiricalBootstrap.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;
    use rand_distr::Normal;

    fn normal_draws(n: usize, mean: f64, sd: f64) -> Vec<f64> {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let normal = Normal::new(mean, sd).unwrap();
        (0..n).map(|_| normal.sample(&mut rng)).collect()
    }

    #[test]
    fn test_studentized_interval() {
        let draws = [9.0, 10.0, 11.0];
        let ci = StudentizedBootstrap.calculate_interval(&draws, 10.0, 0.95).unwrap();
        // sd of the draws is 1
        assert_relative_eq!(ci.lower, 10.0 - 1.959964, epsilon = 1e-5);
        assert_relative_eq!(ci.upper, 10.0 + 1.959964, epsilon = 1e-5);
        assert_eq!(ci.estimate, 10.0);
    }

    #[test]
    fn test_empirical_interval_quantiles() {
        let draws: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        let ci = EmpiricalBootstrap.calculate_interval(&draws, 5.5, 0.95).unwrap();
        assert_relative_eq!(ci.lower, 1.225, epsilon = 1e-12);
        assert_relative_eq!(ci.upper, 9.775, epsilon = 1e-12);
    }

    #[test]
    fn test_methods_agree_for_normal_draws() {
        let draws = normal_draws(20_000, 50.0, 2.0);
        let s = StudentizedBootstrap.calculate_interval(&draws, 50.0, 0.9).unwrap();
        let e = EmpiricalBootstrap.calculate_interval(&draws, 50.0, 0.9).unwrap();
        assert_relative_eq!(s.lower, e.lower, epsilon = 0.1);
        assert_relative_eq!(s.upper, e.upper, epsilon = 0.1);
        assert!(s.contains(50.0) && e.contains(50.0));
    }

    #[test]
    fn test_interval_kind_dispatch() {
        let draws = normal_draws(100, 0.0, 1.0);
        for kind in [IntervalKind::Studentized, IntervalKind::Empirical] {
            let ci = kind.calculate_interval(&draws, 0.0, 0.95).unwrap();
            assert!(ci.lower < 0.0 && ci.upper > 0.0);
        }
        assert_eq!(IntervalKind::Empirical.name(), "Empirical Bootstrap");
        assert!(IntervalKind::Studentized.calculate_interval(&[], 0.0, 0.95).is_err());
        assert!(IntervalKind::Empirical.calculate_interval(&[1.0], 0.0, 1.0).is_err());
    }
}
