//! One entry point for expected durations and marginal effects

use crate::config::QoiConfig;
use coxed_confidence::{
    AutoCoefficients, Bootstrap, BootstrapResult, CoefficientResampler, DurationEstimate,
    SummaryEstimate,
};
use coxed_core::{
    default_engine, DefaultEngine, Error, ExecutionEngine, FittedModel, NewData, Result, Warning,
};
use coxed_duration::{DurationEngine, Engine, EngineInput, ExpectedDurations, FitDetail, Method};
use serde::{Deserialize, Serialize};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{debug, info_span, instrument};

/// Expected durations or marginal effects with their diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QoiResult {
    pub method: Method,
    /// One entry per target (subject when targets carry ids)
    pub estimates: Vec<DurationEstimate>,
    pub mean: SummaryEstimate,
    pub median: SummaryEstimate,
    /// Step baseline (NPSF) or rank-smoother table (GAM) of the point fit
    pub fit: FitDetail,
    pub warnings: Vec<Warning>,
    /// Bootstrap iterations requested; zero without the bootstrap
    pub n_resamples: usize,
    /// Bootstrap iterations dropped because the engine failed on them
    pub n_failed: usize,
    pub bootstrap_time_ms: Option<u64>,
}

impl QoiResult {
    fn point(method: Method, durations: ExpectedDurations, fit: FitDetail, warnings: Vec<Warning>) -> Self {
        let ids = durations.ids.as_deref();
        let estimates = durations
            .values
            .iter()
            .enumerate()
            .map(|(i, &v)| DurationEstimate::point(v, ids.map(|ids| ids[i])))
            .collect();
        Self {
            method,
            estimates,
            mean: SummaryEstimate::point(durations.mean()),
            median: SummaryEstimate::point(durations.median()),
            fit,
            warnings,
            n_resamples: 0,
            n_failed: 0,
            bootstrap_time_ms: None,
        }
    }

    fn bootstrapped(method: Method, result: BootstrapResult<FitDetail>) -> Self {
        Self {
            method,
            estimates: result.estimates,
            mean: result.mean,
            median: result.median,
            fit: result.fit,
            warnings: result.warnings,
            n_resamples: result.n_resamples,
            n_failed: result.n_failed,
            bootstrap_time_ms: result.bootstrap_time_ms,
        }
    }

    /// Point estimates in target order
    pub fn values(&self) -> Vec<f64> {
        self.estimates.iter().map(|e| e.estimate).collect()
    }
}

/// Quantities of interest of a fitted Cox model
///
/// The duration engine is chosen once from [`QoiConfig::method`].
pub struct Coxed<'m, M: ?Sized, E = DefaultEngine, R = AutoCoefficients> {
    model: &'m M,
    config: QoiConfig,
    engine: Engine,
    execution: E,
    resampler: R,
    abort: Option<Arc<AtomicBool>>,
}

impl<'m, M: FittedModel + ?Sized> Coxed<'m, M> {
    /// Validates `config` and selects the engine
    pub fn new(model: &'m M, config: QoiConfig) -> Result<Self> {
        config.validate()?;
        let engine = Engine::from_method(config.method, config.gam)?;
        Ok(Self {
            model,
            config,
            engine,
            execution: default_engine(),
            resampler: AutoCoefficients,
            abort: None,
        })
    }
}

impl<'m, M, E, R> Coxed<'m, M, E, R>
where
    M: FittedModel + ?Sized,
    E: ExecutionEngine,
    R: CoefficientResampler<M>,
{
    /// Run bootstrap iterations on another execution engine
    pub fn with_execution<E2: ExecutionEngine>(self, execution: E2) -> Coxed<'m, M, E2, R> {
        Coxed {
            model: self.model,
            config: self.config,
            engine: self.engine,
            execution,
            resampler: self.resampler,
            abort: self.abort,
        }
    }

    /// Source of per-iteration coefficients
    pub fn with_resampler<R2: CoefficientResampler<M>>(self, resampler: R2) -> Coxed<'m, M, E, R2> {
        Coxed {
            model: self.model,
            config: self.config,
            engine: self.engine,
            execution: self.execution,
            resampler,
            abort: self.abort,
        }
    }

    /// Flag that abandons a running bootstrap once raised
    pub fn with_abort_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.abort = Some(flag);
        self
    }

    pub fn config(&self) -> &QoiConfig {
        &self.config
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Expected durations of `newdata`, or of the estimation sample when `None`
    #[instrument(skip_all, fields(method = ?self.config.method, bootstrap = self.config.bootstrap))]
    pub fn expected_durations(&self, newdata: Option<&NewData>) -> Result<QoiResult> {
        self.check_model_ids()?;
        if let Some(nd) = newdata {
            self.check_ids(nd)?;
        }
        if self.config.bootstrap {
            let result = self.bootstrap()?.expected_durations(
                self.model,
                &self.engine,
                &self.resampler,
                newdata,
            )?;
            return Ok(QoiResult::bootstrapped(self.engine.method(), result));
        }

        let out = self
            .engine
            .estimate(self.model, &EngineInput { targets: newdata, ..EngineInput::new() })?;
        debug!(targets = out.durations.len(), "Estimated expected durations");
        Ok(QoiResult::point(self.engine.method(), out.durations, out.fit, out.warnings))
    }

    /// Per-target change `E[newdata2] - E[newdata]`
    #[instrument(skip_all, fields(method = ?self.config.method, bootstrap = self.config.bootstrap))]
    pub fn marginal_effect(&self, newdata: &NewData, newdata2: &NewData) -> Result<QoiResult> {
        self.check_model_ids()?;
        self.check_ids(newdata)?;
        self.check_ids(newdata2)?;
        if newdata.n_rows() != newdata2.n_rows() {
            return Err(Error::size_mismatch(newdata.n_rows(), newdata2.n_rows(), "newdata2 rows"));
        }
        if self.config.bootstrap {
            let result = self.bootstrap()?.marginal_effects(
                self.model,
                &self.engine,
                &self.resampler,
                newdata,
                newdata2,
            )?;
            return Ok(QoiResult::bootstrapped(self.engine.method(), result));
        }

        let first = self
            .engine
            .estimate(self.model, &EngineInput::new().with_targets(newdata))?;
        let second = self
            .engine
            .estimate(self.model, &EngineInput::new().with_targets(newdata2))?;
        let difference = first
            .durations
            .difference_to(&second.durations)
            .ok_or_else(|| Error::size_mismatch(first.durations.len(), second.durations.len(), "paired durations"))?;
        let mut warnings = first.warnings;
        warnings.extend(second.warnings);
        Ok(QoiResult::point(self.engine.method(), difference, first.fit, warnings))
    }

    /// Effect of setting covariate `column` from `from` to `to` for every
    /// target of `newdata` (the estimation sample when `None`)
    pub fn covariate_effect(
        &self,
        newdata: Option<&NewData>,
        column: usize,
        from: f64,
        to: f64,
    ) -> Result<QoiResult> {
        self.check_model_ids()?;
        let base = match newdata {
            Some(nd) => nd.clone(),
            None => self.sample_newdata()?,
        };
        let _span = info_span!("covariate_effect", column, from, to).entered();
        self.marginal_effect(
            &base.with_column_value(column, from)?,
            &base.with_column_value(column, to)?,
        )
    }

    fn bootstrap(&self) -> Result<Bootstrap<E, coxed_confidence::IntervalKind>> {
        let mut bootstrap = Bootstrap::new(self.execution.clone(), self.config.confidence)
            .with_resamples(self.config.resamples)?
            .with_confidence_level(self.config.level)?;
        if let Some(seed) = self.config.seed {
            bootstrap = bootstrap.with_seed(seed);
        }
        if let Some(flag) = &self.abort {
            bootstrap = bootstrap.with_abort_flag(Arc::clone(flag));
        }
        Ok(bootstrap)
    }

    /// Rows of a counting-process model are intervals, not subjects
    fn check_model_ids(&self) -> Result<()> {
        if self.model.is_counting_process() && self.model.ids().is_none() {
            return Err(Error::MissingId(
                "time-varying covariate models need an id per estimation row".to_string(),
            ));
        }
        Ok(())
    }

    /// Counting-process models need ids to map rows to subjects
    fn check_ids(&self, newdata: &NewData) -> Result<()> {
        if self.model.is_counting_process() && newdata.ids().is_none() {
            return Err(Error::MissingId(
                "time-varying covariate models need an id per newdata row".to_string(),
            ));
        }
        Ok(())
    }

    /// The estimation sample as prediction rows
    fn sample_newdata(&self) -> Result<NewData> {
        let mut nd = NewData::new(self.model.covariates().clone());
        if let Some(entry) = self.model.entry_times() {
            let ids = self
                .model
                .ids()
                .ok_or_else(|| {
                    Error::MissingId("estimation sample has intervals but no ids".to_string())
                })?
                .to_vec();
            let intervals = entry
                .iter()
                .zip(self.model.observed_times())
                .map(|(&s, &e)| (s, e))
                .collect();
            nd = nd.with_ids(ids)?.with_intervals(intervals)?;
        } else if let Some(ids) = self.model.ids() {
            nd = nd.with_ids(ids.to_vec())?;
        }
        Ok(nd)
    }
}
