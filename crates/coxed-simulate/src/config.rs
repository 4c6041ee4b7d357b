//! Simulation settings

use coxed_core::{Error, Result};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// How durations relate to covariates over time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimType {
    /// Fixed covariates and coefficients
    #[default]
    None,
    /// Covariates change every period; data are emitted as `(start, stop]` rows
    Tvc,
    /// The first coefficient is interacted with `ln(t)`
    Tvbeta,
}

/// Which subjects are marked censored
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum CensoringPolicy {
    /// Each subject independently with probability `censor`
    #[default]
    Bernoulli,
    /// Exactly `round(censor * n)` subjects chosen uniformly
    ExactCount,
    /// The shortest durations beyond `cutoff`, at most `round(censor * n)`
    Administrative { cutoff: usize },
}

/// Settings for [`DurationSimulator`](crate::DurationSimulator)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of subjects
    pub n: usize,
    /// Number of covariates
    pub xvars: usize,
    /// Mean of generated covariates
    pub mu: f64,
    /// Standard deviation of generated covariates
    pub sd: f64,
    /// Censoring proportion in `[0, 1)`
    pub censor: f64,
    pub sim_type: SimType,
    pub censoring: CensoringPolicy,
    /// Coefficients; drawn from `Normal(0, 0.1)` when absent
    #[serde(skip)]
    pub beta: Option<DVector<f64>>,
    /// Covariates (`n x xvars`); drawn from `Normal(mu, sd)` when absent
    #[serde(skip)]
    pub x: Option<DMatrix<f64>>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            n: 1000,
            xvars: 3,
            mu: 0.0,
            sd: 0.5,
            censor: 0.1,
            sim_type: SimType::None,
            censoring: CensoringPolicy::Bernoulli,
            beta: None,
            x: None,
        }
    }
}

impl SimulationConfig {
    pub fn with_beta(mut self, beta: DVector<f64>) -> Self {
        self.beta = Some(beta);
        self
    }

    pub fn with_x(mut self, x: DMatrix<f64>) -> Self {
        self.x = Some(x);
        self
    }

    /// Check every setting before any draw is made
    ///
    /// Supplied covariates are not checked under `tvc`, where they are
    /// replaced by generated histories.
    pub fn validate(&self) -> Result<()> {
        if !(self.censor.is_finite() && (0.0..1.0).contains(&self.censor)) {
            return Err(Error::InvalidCensorProportion(self.censor));
        }
        if self.n == 0 {
            return Err(Error::InvalidCovariateSpec("n must be positive".to_string()));
        }
        if self.xvars == 0 {
            return Err(Error::InvalidCovariateSpec("xvars must be positive".to_string()));
        }
        if !self.mu.is_finite() {
            return Err(Error::InvalidCovariateSpec(format!("mu = {} is not finite", self.mu)));
        }
        if !(self.sd.is_finite() && self.sd > 0.0) {
            return Err(Error::InvalidCovariateSpec(format!(
                "sd = {} must be finite and positive",
                self.sd
            )));
        }
        if let CensoringPolicy::Administrative { cutoff } = self.censoring {
            if cutoff == 0 {
                return Err(Error::InvalidParameter(
                    "administrative cutoff must be at least 1".to_string(),
                ));
            }
        }
        if let Some(beta) = &self.beta {
            if beta.len() != self.xvars {
                return Err(Error::InvalidCovariateSpec(format!(
                    "beta has {} entries but xvars = {}",
                    beta.len(),
                    self.xvars
                )));
            }
            if beta.iter().any(|b| !b.is_finite()) {
                return Err(Error::InvalidCovariateSpec("beta contains non-finite values".to_string()));
            }
        }
        if let (Some(x), false) = (&self.x, self.sim_type == SimType::Tvc) {
            if x.nrows() != self.n || x.ncols() != self.xvars {
                return Err(Error::InvalidCovariateSpec(format!(
                    "X is {}x{} but n = {} and xvars = {}",
                    x.nrows(),
                    x.ncols(),
                    self.n,
                    self.xvars
                )));
            }
            if x.iter().any(|v| !v.is_finite()) {
                return Err(Error::InvalidCovariateSpec("X contains non-finite values".to_string()));
            }
        }
        Ok(())
    }

    /// Number of subjects to censor under the count-based policies
    pub(crate) fn censor_count(&self) -> usize {
        (self.censor * self.n as f64).round() as usize
    }
}
