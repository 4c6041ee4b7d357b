//! Output of one simulation run

use crate::config::SimType;
use crate::permutation::CountingProcessRows;
use coxed_core::{CoxModel, Result, Warning};
use nalgebra::{DMatrix, DVector};

/// A simulated survival dataset with its generating quantities
#[derive(Debug, Clone)]
pub struct SimulatedDataset {
    pub sim_type: SimType,
    /// Per-subject covariates used to draw durations (`n x xvars`); first
    /// period covariates under `tvc`
    pub covariates: DMatrix<f64>,
    /// `n x 1`, or `n x T` under `tvbeta`
    pub linear_predictor: DMatrix<f64>,
    pub elp: DMatrix<f64>,
    /// Individual survivor curves, `n x T`
    pub survivor: DMatrix<f64>,
    /// Durations in `1..=T`
    pub durations: Vec<usize>,
    /// `true` = censored
    pub censored: Vec<bool>,
    /// Coefficients drawn or supplied for the run
    pub beta: DVector<f64>,
    /// Per-period coefficients, `1 x xvars` or `T x xvars` under `tvbeta`
    pub coefficients: DMatrix<f64>,
    /// `(start, stop]` rows under `tvc`
    pub counting_process: Option<CountingProcessRows>,
    pub warnings: Vec<Warning>,
}

impl SimulatedDataset {
    pub fn n(&self) -> usize {
        self.durations.len()
    }

    pub fn is_tvc(&self) -> bool {
        self.counting_process.is_some()
    }

    /// Number of data rows: subjects, or counting-process intervals under `tvc`
    pub fn n_rows(&self) -> usize {
        self.counting_process
            .as_ref()
            .map_or(self.n(), CountingProcessRows::len)
    }

    pub fn n_censored(&self) -> usize {
        self.censored.iter().filter(|c| **c).count()
    }

    /// Generating coefficient vector; under `tvbeta` the first entry is
    /// the multiplier of `ln(t)`
    pub fn beta(&self) -> DVector<f64> {
        self.beta.clone()
    }

    /// Hand the data to a model holder with externally fitted `coefficients`
    ///
    /// Under `tvc` the model is in counting-process form with subject ids.
    pub fn to_cox_model(&self, coefficients: DVector<f64>) -> Result<CoxModel> {
        match &self.counting_process {
            Some(rows) => CoxModel::counting_process(
                rows.start.clone(),
                rows.stop.clone(),
                rows.event.clone(),
                rows.covariate_matrix(),
                coefficients,
            )?
            .with_ids(rows.ids.clone()),
            None => CoxModel::new(
                self.durations.iter().map(|&d| d as f64).collect(),
                self.censored.iter().map(|c| !c).collect(),
                self.covariates.clone(),
                coefficients,
            ),
        }
    }
}
