//! Assigning time-varying covariate histories to simulated subjects
//!
//! The permutational algorithm walks subjects in order of their observed
//! time. At a failure time the failing subject receives one of the remaining
//! histories with probability proportional to that history's hazard
//! multiplier at the time; a censored subject receives a remaining history
//! uniformly at random.

use coxed_core::{Error, Result};
use nalgebra::{DMatrix, DVector};
use rand::distributions::WeightedIndex;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Covariate histories: `n` blocks of `horizon` consecutive rows
#[derive(Debug, Clone, PartialEq)]
pub struct CovariateHistories {
    values: DMatrix<f64>,
    horizon: usize,
}

impl CovariateHistories {
    /// `values` is `(n * horizon) x p`; history `h` occupies rows
    /// `h * horizon .. (h + 1) * horizon`
    pub fn new(values: DMatrix<f64>, horizon: usize) -> Result<Self> {
        if horizon == 0 || values.nrows() % horizon != 0 {
            return Err(Error::InvalidCovariateSpec(format!(
                "{} history rows do not split into blocks of {}",
                values.nrows(),
                horizon
            )));
        }
        Ok(Self { values, horizon })
    }

    pub fn len(&self) -> usize {
        self.values.nrows() / self.horizon
    }

    pub fn is_empty(&self) -> bool {
        self.values.nrows() == 0
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    /// Row index of history `h` at period `t` (`1..=horizon`)
    pub fn row(&self, h: usize, t: usize) -> usize {
        h * self.horizon + t.clamp(1, self.horizon) - 1
    }

    /// Covariates of every history in its first period
    pub fn first_period(&self) -> DMatrix<f64> {
        let rows: Vec<usize> = (0..self.len()).map(|h| self.row(h, 1)).collect();
        self.values.select_rows(&rows)
    }
}

/// Counting-process rows, one per unit interval a subject is observed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountingProcessRows {
    pub ids: Vec<usize>,
    pub start: Vec<f64>,
    pub stop: Vec<f64>,
    /// Failure on this interval; only ever the final row of a failing subject
    pub event: Vec<bool>,
    /// Row-major covariates, `len() x xvars`
    pub covariates: Vec<f64>,
    pub xvars: usize,
}

impl CountingProcessRows {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn covariate_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_row_slice(self.len(), self.xvars, &self.covariates)
    }
}

/// Expands simulated durations into time-varying counting-process data
pub trait TimeVaryingPermutation: Send + Sync {
    /// Assign a covariate history to every subject and emit its rows
    fn permute(
        &self,
        durations: &[usize],
        censored: &[bool],
        histories: &CovariateHistories,
        beta: &DVector<f64>,
        rng: &mut StdRng,
    ) -> Result<CountingProcessRows>;

    fn name(&self) -> &'static str;
}

/// Permutational algorithm for time-dependent covariates
#[derive(Debug, Clone, Copy, Default)]
pub struct PermutationalAlgorithm;

impl PermutationalAlgorithm {
    /// History chosen for each subject
    pub fn assign(
        &self,
        durations: &[usize],
        censored: &[bool],
        histories: &CovariateHistories,
        beta: &DVector<f64>,
        rng: &mut StdRng,
    ) -> Result<Vec<usize>> {
        let n = durations.len();
        if censored.len() != n || histories.len() != n {
            return Err(Error::size_mismatch(n, histories.len(), "covariate histories"));
        }
        if histories.values().ncols() != beta.len() {
            return Err(Error::size_mismatch(
                beta.len(),
                histories.values().ncols(),
                "history covariate columns",
            ));
        }

        // failures before censorings at tied times
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by_key(|&i| (durations[i], censored[i]));

        let mut remaining: Vec<usize> = (0..n).collect();
        let mut assigned = vec![0; n];
        for subject in order {
            let pick = if censored[subject] {
                rng.gen_range(0..remaining.len())
            } else {
                let t = durations[subject];
                let weights: Vec<f64> = remaining
                    .iter()
                    .map(|&h| {
                        let row = histories.values().row(histories.row(h, t));
                        row.dot(&beta.transpose()).exp()
                    })
                    .collect();
                match WeightedIndex::new(&weights) {
                    Ok(dist) => rng.sample(dist),
                    Err(_) => rng.gen_range(0..remaining.len()),
                }
            };
            assigned[subject] = remaining.swap_remove(pick);
        }
        Ok(assigned)
    }
}

impl TimeVaryingPermutation for PermutationalAlgorithm {
    #[instrument(skip_all, fields(n = durations.len()))]
    fn permute(
        &self,
        durations: &[usize],
        censored: &[bool],
        histories: &CovariateHistories,
        beta: &DVector<f64>,
        rng: &mut StdRng,
    ) -> Result<CountingProcessRows> {
        let assigned = self.assign(durations, censored, histories, beta, rng)?;
        let xvars = histories.values().ncols();
        let total: usize = durations.iter().sum();

        let mut rows = CountingProcessRows {
            ids: Vec::with_capacity(total),
            start: Vec::with_capacity(total),
            stop: Vec::with_capacity(total),
            event: Vec::with_capacity(total),
            covariates: Vec::with_capacity(total * xvars),
            xvars,
        };
        for (subject, (&duration, &h)) in durations.iter().zip(&assigned).enumerate() {
            for t in 1..=duration {
                rows.ids.push(subject);
                rows.start.push((t - 1) as f64);
                rows.stop.push(t as f64);
                rows.event.push(!censored[subject] && t == duration);
                let r = histories.row(h, t);
                rows.covariates.extend(histories.values().row(r).iter());
            }
        }
        debug!(rows = rows.len(), "Expanded durations into counting-process rows");
        Ok(rows)
    }

    fn name(&self) -> &'static str {
        "Permutational algorithm"
    }
}
