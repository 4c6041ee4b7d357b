//! Fitted model handles and prediction data
//!
//! The Cox fit itself happens elsewhere. This module describes what the
//! duration engines need from it: observed times, event indicators, the
//! covariate matrix, the coefficient vector and linear-predictor evaluation.
//! Coefficient substitution never touches the model; it is passed as an
//! explicit override.

use crate::{Error, Result};
use nalgebra::{DMatrix, DVector};

/// A fitted proportional hazards model as seen by the duration engines
pub trait FittedModel: Send + Sync {
    /// Exit (stop) times of each row
    fn observed_times(&self) -> &[f64];

    /// Entry (start) times for counting-process data
    fn entry_times(&self) -> Option<&[f64]> {
        None
    }

    /// Event indicators, `true` for failure and `false` for censoring
    fn events(&self) -> &[bool];

    /// Covariate matrix, one row per observation
    fn covariates(&self) -> &DMatrix<f64>;

    /// Estimated coefficients
    fn coefficients(&self) -> &DVector<f64>;

    /// Subject id per row, required to group counting-process rows
    fn ids(&self) -> Option<&[usize]> {
        None
    }

    /// Estimated covariance of the coefficients
    fn coefficient_covariance(&self) -> Option<&DMatrix<f64>> {
        None
    }

    /// Number of rows in the estimation sample
    fn n_obs(&self) -> usize {
        self.observed_times().len()
    }

    /// Whether rows are `(start, stop]` intervals
    fn is_counting_process(&self) -> bool {
        self.entry_times().is_some()
    }

    /// Linear predictor `XB` for arbitrary covariate rows
    ///
    /// `coefficients` overrides the fitted vector without mutating the model.
    fn linear_predictor(
        &self,
        covariates: &DMatrix<f64>,
        coefficients: Option<&DVector<f64>>,
    ) -> Result<DVector<f64>> {
        let beta = coefficients.unwrap_or_else(|| self.coefficients());
        linear_predictor(covariates, beta)
    }
}

/// Compute `XB`, checking dimensions and finiteness
pub fn linear_predictor(covariates: &DMatrix<f64>, beta: &DVector<f64>) -> Result<DVector<f64>> {
    if covariates.ncols() != beta.len() {
        return Err(Error::size_mismatch(
            beta.len(),
            covariates.ncols(),
            "covariate columns",
        ));
    }
    let xb = covariates * beta;
    if xb.iter().any(|v| !v.is_finite()) {
        return Err(Error::non_finite("linear predictor"));
    }
    Ok(xb)
}

/// Plain holder for a Cox model fitted by an external routine
#[derive(Debug, Clone)]
pub struct CoxModel {
    entry: Option<Vec<f64>>,
    exit: Vec<f64>,
    events: Vec<bool>,
    covariates: DMatrix<f64>,
    coefficients: DVector<f64>,
    ids: Option<Vec<usize>>,
    covariance: Option<DMatrix<f64>>,
}

impl CoxModel {
    /// Create a model over right-censored durations
    pub fn new(
        times: Vec<f64>,
        events: Vec<bool>,
        covariates: DMatrix<f64>,
        coefficients: DVector<f64>,
    ) -> Result<Self> {
        let model = Self {
            entry: None,
            exit: times,
            events,
            covariates,
            coefficients,
            ids: None,
            covariance: None,
        };
        model.validate()?;
        Ok(model)
    }

    /// Create a model over counting-process `(start, stop]` rows
    pub fn counting_process(
        entry: Vec<f64>,
        exit: Vec<f64>,
        events: Vec<bool>,
        covariates: DMatrix<f64>,
        coefficients: DVector<f64>,
    ) -> Result<Self> {
        let model = Self {
            entry: Some(entry),
            exit,
            events,
            covariates,
            coefficients,
            ids: None,
            covariance: None,
        };
        model.validate()?;
        Ok(model)
    }

    /// Attach a subject id per row
    pub fn with_ids(mut self, ids: Vec<usize>) -> Result<Self> {
        if ids.len() != self.exit.len() {
            return Err(Error::size_mismatch(self.exit.len(), ids.len(), "id vector"));
        }
        self.ids = Some(ids);
        Ok(self)
    }

    /// Attach the coefficient covariance matrix
    pub fn with_covariance(mut self, covariance: DMatrix<f64>) -> Result<Self> {
        let p = self.coefficients.len();
        if covariance.nrows() != p || covariance.ncols() != p {
            return Err(Error::InvalidInput(format!(
                "Covariance must be {p}x{p}, got {}x{}",
                covariance.nrows(),
                covariance.ncols()
            )));
        }
        self.covariance = Some(covariance);
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        let n = self.exit.len();
        if n == 0 {
            return Err(Error::empty_input("model"));
        }
        if self.events.len() != n {
            return Err(Error::size_mismatch(n, self.events.len(), "event vector"));
        }
        if self.covariates.nrows() != n {
            return Err(Error::size_mismatch(n, self.covariates.nrows(), "covariate rows"));
        }
        if self.covariates.ncols() != self.coefficients.len() {
            return Err(Error::size_mismatch(
                self.coefficients.len(),
                self.covariates.ncols(),
                "covariate columns",
            ));
        }
        if self.exit.iter().any(|t| !t.is_finite() || *t < 0.0) {
            return Err(Error::InvalidInput(
                "Observed times must be finite and non-negative".to_string(),
            ));
        }
        if let Some(entry) = &self.entry {
            if entry.len() != n {
                return Err(Error::size_mismatch(n, entry.len(), "entry times"));
            }
            if entry.iter().zip(&self.exit).any(|(s, e)| !s.is_finite() || s >= e) {
                return Err(Error::InvalidInput(
                    "Each interval must satisfy start < stop".to_string(),
                ));
            }
        }
        if self.covariates.iter().any(|v| !v.is_finite()) {
            return Err(Error::non_finite("covariates"));
        }
        if self.coefficients.iter().any(|v| !v.is_finite()) {
            return Err(Error::non_finite("coefficients"));
        }
        Ok(())
    }
}

impl FittedModel for CoxModel {
    fn observed_times(&self) -> &[f64] {
        &self.exit
    }

    fn entry_times(&self) -> Option<&[f64]> {
        self.entry.as_deref()
    }

    fn events(&self) -> &[bool] {
        &self.events
    }

    fn covariates(&self) -> &DMatrix<f64> {
        &self.covariates
    }

    fn coefficients(&self) -> &DVector<f64> {
        &self.coefficients
    }

    fn ids(&self) -> Option<&[usize]> {
        self.ids.as_deref()
    }

    fn coefficient_covariance(&self) -> Option<&DMatrix<f64>> {
        self.covariance.as_ref()
    }
}

/// Covariate rows to predict for
///
/// Counting-process newdata carries an id per row and, optionally, the
/// `(start, stop]` interval each row covers.
#[derive(Debug, Clone)]
pub struct NewData {
    covariates: DMatrix<f64>,
    ids: Option<Vec<usize>>,
    intervals: Option<Vec<(f64, f64)>>,
}

impl NewData {
    /// Wrap a covariate matrix
    pub fn new(covariates: DMatrix<f64>) -> Self {
        Self {
            covariates,
            ids: None,
            intervals: None,
        }
    }

    /// Attach subject ids
    pub fn with_ids(mut self, ids: Vec<usize>) -> Result<Self> {
        if ids.len() != self.covariates.nrows() {
            return Err(Error::size_mismatch(self.covariates.nrows(), ids.len(), "newdata ids"));
        }
        self.ids = Some(ids);
        Ok(self)
    }

    /// Attach the interval covered by each row
    pub fn with_intervals(mut self, intervals: Vec<(f64, f64)>) -> Result<Self> {
        if intervals.len() != self.covariates.nrows() {
            return Err(Error::size_mismatch(
                self.covariates.nrows(),
                intervals.len(),
                "newdata intervals",
            ));
        }
        if intervals.iter().any(|(s, e)| !s.is_finite() || s >= e) {
            return Err(Error::InvalidInput(
                "Each interval must satisfy start < stop".to_string(),
            ));
        }
        self.intervals = Some(intervals);
        Ok(self)
    }

    /// Same covariates with one column replaced by a constant
    pub fn with_column_value(&self, column: usize, value: f64) -> Result<Self> {
        if column >= self.covariates.ncols() {
            return Err(Error::InvalidParameter(format!(
                "Column {column} out of range for {} covariates",
                self.covariates.ncols()
            )));
        }
        let mut out = self.clone();
        out.covariates.column_mut(column).fill(value);
        Ok(out)
    }

    pub fn covariates(&self) -> &DMatrix<f64> {
        &self.covariates
    }

    pub fn ids(&self) -> Option<&[usize]> {
        self.ids.as_deref()
    }

    pub fn intervals(&self) -> Option<&[(f64, f64)]> {
        self.intervals.as_deref()
    }

    pub fn n_rows(&self) -> usize {
        self.covariates.nrows()
    }
}

impl From<DMatrix<f64>> for NewData {
    fn from(covariates: DMatrix<f64>) -> Self {
        Self::new(covariates)
    }
}
