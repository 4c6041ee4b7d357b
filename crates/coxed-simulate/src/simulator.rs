//! Inverse-transform simulation of durations against a known baseline
//!
//! For subject `i` a uniform `U` is drawn and the duration is the first
//! period `t` with `S_i(t) <= U`, where `S_i(t) = S0(t)^ELP_i(t)`. Under
//! `tvbeta` the multiplier changes with `t`.

use crate::config::{SimType, SimulationConfig};
use crate::dataset::SimulatedDataset;
use crate::permutation::{CovariateHistories, PermutationalAlgorithm, TimeVaryingPermutation};
use coxed_baseline::SimulationBaseline;
use coxed_core::{Error, Result, Warning};
use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use tracing::{debug, instrument, warn};

/// Generates [`SimulatedDataset`]s
pub struct DurationSimulator<P = PermutationalAlgorithm> {
    config: SimulationConfig,
    permutation: P,
}

impl DurationSimulator {
    /// Validates `config` up front
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            permutation: PermutationalAlgorithm,
        })
    }
}

impl<P: TimeVaryingPermutation> DurationSimulator<P> {
    /// Replace the algorithm that expands `tvc` durations into rows
    pub fn with_permutation<Q: TimeVaryingPermutation>(self, permutation: Q) -> DurationSimulator<Q> {
        DurationSimulator {
            config: self.config,
            permutation,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Draw one dataset
    #[instrument(skip_all, fields(n = self.config.n, sim_type = ?self.config.sim_type))]
    pub fn generate<R: Rng + ?Sized>(
        &self,
        baseline: &SimulationBaseline,
        rng: &mut R,
    ) -> Result<SimulatedDataset> {
        let config = &self.config;
        let horizon = baseline.horizon();
        let mut warnings = Vec::new();

        let covariate_dist = Normal::new(config.mu, config.sd)
            .map_err(|e| Error::InvalidCovariateSpec(e.to_string()))?;
        let beta = match &config.beta {
            Some(beta) => beta.clone(),
            None => {
                let dist = Normal::new(0.0, 0.1).map_err(|e| Error::Computation(e.to_string()))?;
                DVector::from_fn(config.xvars, |_, _| dist.sample(rng))
            }
        };

        let histories = if config.sim_type == SimType::Tvc {
            if config.x.is_some() {
                let warning = Warning::SuppliedCovariatesIgnored(
                    "time-varying covariates are generated per period".to_string(),
                );
                warn!(%warning, "Discarding supplied covariates");
                warnings.push(warning);
            }
            let values = DMatrix::from_fn(config.n * horizon, config.xvars, |_, _| {
                covariate_dist.sample(rng)
            });
            Some(CovariateHistories::new(values, horizon)?)
        } else {
            None
        };

        let covariates = match (&histories, &config.x) {
            (Some(h), _) => h.first_period(),
            (None, Some(x)) => x.clone(),
            (None, None) => DMatrix::from_fn(config.n, config.xvars, |_, _| covariate_dist.sample(rng)),
        };

        let coefficients = match config.sim_type {
            SimType::Tvbeta => time_varying_coefficients(&beta, horizon),
            _ => DMatrix::from_row_slice(1, beta.len(), beta.as_slice()),
        };
        // n x 1, or n x T with one column per period
        let linear_predictor = &covariates * coefficients.transpose();
        let elp = linear_predictor.map(f64::exp);

        let survivor = DMatrix::from_fn(config.n, horizon, |i, col| {
            let e = if elp.ncols() == 1 { elp[(i, 0)] } else { elp[(i, col)] };
            baseline.individual_survivor_at(col + 1, e)
        });

        let durations: Vec<usize> = (0..config.n)
            .map(|i| {
                let u: f64 = rng.gen();
                (0..horizon)
                    .find(|&col| survivor[(i, col)] <= u)
                    .map_or(horizon, |col| col + 1)
            })
            .collect();

        let censored = config.censoring.apply(&durations, config.censor, rng);

        let counting_process = match &histories {
            Some(histories) => {
                let mut task_rng = StdRng::seed_from_u64(rng.gen());
                Some(self.permutation.permute(
                    &durations,
                    &censored,
                    histories,
                    &beta,
                    &mut task_rng,
                )?)
            }
            None => None,
        };

        debug!(
            censored = censored.iter().filter(|c| **c).count(),
            rows = counting_process.as_ref().map_or(config.n, |r| r.len()),
            "Simulated durations"
        );

        Ok(SimulatedDataset {
            sim_type: config.sim_type,
            covariates,
            linear_predictor,
            elp,
            survivor,
            durations,
            censored,
            beta,
            coefficients,
            counting_process,
            warnings,
        })
    }
}

/// Row `t - 1` is `beta` with its first entry multiplied by `ln(t)`
fn time_varying_coefficients(beta: &DVector<f64>, horizon: usize) -> DMatrix<f64> {
    DMatrix::from_fn(horizon, beta.len(), |row, col| {
        if col == 0 {
            beta[0] * ((row + 1) as f64).ln()
        } else {
            beta[col]
        }
    })
}
