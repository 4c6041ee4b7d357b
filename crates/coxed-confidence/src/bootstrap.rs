//! Bootstrap standard errors and intervals for expected durations
//!
//! Each of the B iterations:
//! - seeds its own RNG from `seed + i`
//! - draws resampling units (subjects when the model has ids) with replacement
//! - obtains coefficients from a [`CoefficientResampler`]
//! - reruns the duration engine on the resampled rows
//!
//! Iterations are independent tasks on an [`ExecutionEngine`]. A failed draw
//! is dropped and counted; aggregation waits for every task.

use crate::{ConfidenceInterval, CoefficientResampler, DurationEstimate, SummaryEstimate};
use coxed_core::{
    expand_units, resampling_units, utils, Error, ExecutionEngine, FittedModel, NewData, Result,
    Warning,
};
use coxed_duration::{DurationEngine, EngineInput, ExpectedDurations};
use rand::prelude::*;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Bootstrap method for calculating confidence intervals
///
/// This trait defines how to construct a confidence interval from
/// bootstrap estimates.
pub trait BootstrapMethod: Clone + Send + Sync {
    /// Calculate confidence interval from bootstrap distribution
    fn calculate_interval(
        &self,
        bootstrap_estimates: &[f64],
        original_estimate: f64,
        confidence_level: f64,
    ) -> Result<ConfidenceInterval>;

    /// Method name for documentation
    fn name(&self) -> &'static str;
}

/// Result of a bootstrap run
#[derive(Debug, Clone)]
pub struct BootstrapResult<F> {
    /// Per-target estimates with standard errors and intervals
    pub estimates: Vec<DurationEstimate>,
    pub mean: SummaryEstimate,
    pub median: SummaryEstimate,
    /// Fit of the point-estimate run
    pub fit: F,
    /// Warnings of the point-estimate run, followed by those raised only on
    /// resamples (one per target index)
    pub warnings: Vec<Warning>,
    /// Number of bootstrap resamples requested
    pub n_resamples: usize,
    /// Resamples excluded because the engine failed on them
    pub n_failed: usize,
    /// Time taken for bootstrap (if measured)
    pub bootstrap_time_ms: Option<u64>,
}

/// Main bootstrap driver
#[derive(Clone)]
pub struct Bootstrap<E, M> {
    engine: E,
    method: M,
    n_resamples: usize,
    confidence_level: f64,
    seed: Option<u64>,
    abort: Option<Arc<AtomicBool>>,
}

impl<E, M> Bootstrap<E, M>
where
    E: ExecutionEngine,
    M: BootstrapMethod,
{
    /// Create a new bootstrap driver
    pub fn new(engine: E, method: M) -> Self {
        Self {
            engine,
            method,
            n_resamples: 200,
            confidence_level: 0.95,
            seed: None,
            abort: None,
        }
    }

    /// Set the number of bootstrap resamples
    pub fn with_resamples(mut self, n_resamples: usize) -> Result<Self> {
        if n_resamples == 0 {
            return Err(Error::InvalidParameter(
                "Number of resamples must be positive".to_string(),
            ));
        }
        self.n_resamples = n_resamples;
        Ok(self)
    }

    /// Set the confidence level, which must lie in (0, 1)
    pub fn with_confidence_level(mut self, confidence_level: f64) -> Result<Self> {
        if !(confidence_level > 0.0 && confidence_level < 1.0) {
            return Err(Error::invalid_level(confidence_level));
        }
        self.confidence_level = confidence_level;
        Ok(self)
    }

    /// Set random seed for reproducibility
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Flag that abandons the run once raised
    pub fn with_abort_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.abort = Some(flag);
        self
    }

    pub fn n_resamples(&self) -> usize {
        self.n_resamples
    }

    /// Bootstrap the expected durations of `targets` (the estimation sample
    /// when `None`)
    #[instrument(skip_all, fields(engine = duration_engine.name(), n_resamples = self.n_resamples))]
    pub fn expected_durations<Mod, D, R>(
        &self,
        model: &Mod,
        duration_engine: &D,
        resampler: &R,
        targets: Option<&NewData>,
    ) -> Result<BootstrapResult<D::Fit>>
    where
        Mod: FittedModel + ?Sized,
        D: DurationEngine,
        R: CoefficientResampler<Mod>,
    {
        let point = duration_engine.estimate(
            model,
            &EngineInput {
                coefficients: None,
                indices: None,
                targets,
            },
        )?;

        let start_time = std::time::Instant::now();
        let replicates = self.replicate(model, resampler, |draw| {
            let input = EngineInput {
                coefficients: draw.coefficients,
                indices: draw.indices,
                targets,
            };
            let out = duration_engine.estimate(model, &input)?;
            Ok((out.durations.values, out.warnings))
        })?;

        self.aggregate(
            point.durations,
            point.fit,
            point.warnings,
            replicates,
            start_time,
        )
    }

    /// Bootstrap the per-target change `E[targets2] - E[targets1]`
    #[instrument(skip_all, fields(engine = duration_engine.name(), n_resamples = self.n_resamples))]
    pub fn marginal_effects<Mod, D, R>(
        &self,
        model: &Mod,
        duration_engine: &D,
        resampler: &R,
        targets1: &NewData,
        targets2: &NewData,
    ) -> Result<BootstrapResult<D::Fit>>
    where
        Mod: FittedModel + ?Sized,
        D: DurationEngine,
        R: CoefficientResampler<Mod>,
    {
        if targets1.n_rows() != targets2.n_rows() {
            return Err(Error::size_mismatch(
                targets1.n_rows(),
                targets2.n_rows(),
                "paired newdata rows",
            ));
        }
        let first = duration_engine.estimate(model, &EngineInput::new().with_targets(targets1))?;
        let second = duration_engine.estimate(model, &EngineInput::new().with_targets(targets2))?;
        let point = paired_difference(&first.durations, &second.durations)?;
        let mut warnings = first.warnings;
        warnings.extend(second.warnings);

        let start_time = std::time::Instant::now();
        let replicates = self.replicate(model, resampler, |draw| {
            let first = EngineInput {
                coefficients: draw.coefficients,
                indices: draw.indices,
                targets: Some(targets1),
            };
            let second = EngineInput {
                targets: Some(targets2),
                ..first
            };
            let e1 = duration_engine.estimate(model, &first)?;
            let e2 = duration_engine.estimate(model, &second)?;
            let mut warnings = e1.warnings;
            warnings.extend(e2.warnings);
            Ok((paired_difference(&e1.durations, &e2.durations)?.values, warnings))
        })?;

        self.aggregate(point, second.fit, warnings, replicates, start_time)
    }

    /// Run B independent draws
    fn replicate<Mod, R, F>(&self, model: &Mod, resampler: &R, run: F) -> Result<Replicates>
    where
        Mod: FittedModel + ?Sized,
        R: CoefficientResampler<Mod>,
        F: Fn(&EngineInput<'_>) -> Result<(Vec<f64>, Vec<Warning>)> + Send + Sync,
    {
        let units = resampling_units(model);
        let seed = self.seed.unwrap_or_else(|| thread_rng().gen());
        let abort = self.abort.clone();

        debug!(
            threads = self.engine.num_threads(),
            "Running {} bootstrap resamples over {} units with {} coefficients",
            self.n_resamples,
            units.len(),
            resampler.name()
        );

        type Outcome = Option<Result<(Vec<f64>, Vec<Warning>)>>;
        let outcomes: Vec<Outcome> = self.engine.execute_batch(self.n_resamples, |i| {
            if abort.as_ref().map_or(false, |flag| flag.load(Ordering::Relaxed)) {
                return None;
            }
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
            let draw: Vec<usize> = (0..units.len()).map(|_| rng.gen_range(0..units.len())).collect();
            let rows = expand_units(&units, &draw);

            let outcome = resampler
                .coefficients(model, &rows, &mut rng)
                .and_then(|beta| {
                    run(&EngineInput {
                        coefficients: beta.as_ref(),
                        indices: Some(&rows),
                        targets: None,
                    })
                })
                .and_then(|(values, warnings)| {
                    if values.iter().all(|v| v.is_finite()) {
                        Ok((values, warnings))
                    } else {
                        Err(Error::non_finite("bootstrap replicate"))
                    }
                });
            Some(outcome)
        });

        if abort.as_ref().map_or(false, |flag| flag.load(Ordering::Relaxed)) {
            return Err(Error::Cancelled(format!(
                "bootstrap abandoned after {} of {} resamples",
                outcomes.iter().filter(|o| o.is_some()).count(),
                self.n_resamples
            )));
        }

        let mut replicates = Vec::with_capacity(outcomes.len());
        let mut warnings = Vec::new();
        let mut failed = 0;
        let mut last_error = None;
        for (i, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Some(Ok((values, raised))) => {
                    replicates.push(values);
                    warnings.extend(raised);
                }
                Some(Err(e)) => {
                    debug!(resample = i, error = %e, "Dropping failed bootstrap resample");
                    failed += 1;
                    last_error = Some(e);
                }
                None => failed += 1,
            }
        }

        if replicates.is_empty() {
            return Err(Error::Computation(format!(
                "All {} bootstrap resamples failed; last error: {}",
                self.n_resamples,
                last_error.map_or_else(|| "none recorded".to_string(), |e| e.to_string())
            )));
        }
        if failed > 0 {
            warn!(
                failed,
                kept = replicates.len(),
                "Excluded failed bootstrap resamples from aggregation"
            );
        }
        Ok(Replicates {
            values: replicates,
            warnings,
            failed,
        })
    }

    fn aggregate<F>(
        &self,
        point: ExpectedDurations,
        fit: F,
        mut warnings: Vec<Warning>,
        Replicates {
            values: replicates,
            warnings: raised,
            failed: n_failed,
        }: Replicates,
        start_time: std::time::Instant,
    ) -> Result<BootstrapResult<F>> {
        merge_warnings(&mut warnings, raised);
        let n_targets = point.len();
        let mut transposed = vec![Vec::with_capacity(replicates.len()); n_targets];
        for values in &replicates {
            if values.len() != n_targets {
                return Err(Error::size_mismatch(n_targets, values.len(), "bootstrap replicate"));
            }
            for (column, &v) in transposed.iter_mut().zip(values) {
                column.push(v);
            }
        }

        let ids = point.ids.clone();
        let estimates = point
            .values
            .iter()
            .zip(&transposed)
            .enumerate()
            .map(|(i, (&estimate, draws))| {
                let interval = self
                    .method
                    .calculate_interval(draws, estimate, self.confidence_level)?;
                Ok(DurationEstimate {
                    estimate,
                    standard_error: Some(utils::std_dev(draws)),
                    interval: Some(interval),
                    id: ids.as_ref().map(|ids| ids[i]),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let means: Vec<f64> = replicates.iter().map(|v| utils::mean(v)).collect();
        let medians: Vec<f64> = replicates.iter().map(|v| utils::median(v)).collect();
        let mean = self.summarize(point.mean(), &means)?;
        let median = self.summarize(point.median(), &medians)?;

        debug!("Bootstrap completed with {} usable resamples", replicates.len());

        Ok(BootstrapResult {
            estimates,
            mean,
            median,
            fit,
            warnings,
            n_resamples: self.n_resamples,
            n_failed,
            bootstrap_time_ms: Some(start_time.elapsed().as_millis() as u64),
        })
    }

    fn summarize(&self, estimate: f64, draws: &[f64]) -> Result<SummaryEstimate> {
        Ok(SummaryEstimate {
            estimate,
            standard_error: Some(utils::std_dev(draws)),
            interval: Some(
                self.method
                    .calculate_interval(draws, estimate, self.confidence_level)?,
            ),
        })
    }
}

/// Successful draws of a bootstrap run
struct Replicates {
    values: Vec<Vec<f64>>,
    warnings: Vec<Warning>,
    failed: usize,
}

/// Append `raised` to `warnings`, keeping one extrapolation warning per
/// target index and dropping exact duplicates of the rest
fn merge_warnings(warnings: &mut Vec<Warning>, raised: Vec<Warning>) {
    let mut seen: BTreeSet<usize> = warnings
        .iter()
        .filter_map(|w| match w {
            Warning::OutOfRange { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    for warning in raised {
        let fresh = match &warning {
            Warning::OutOfRange { index, .. } => seen.insert(*index),
            other => !warnings.contains(other),
        };
        if fresh {
            warnings.push(warning);
        }
    }
}

fn paired_difference(first: &ExpectedDurations, second: &ExpectedDurations) -> Result<ExpectedDurations> {
    first
        .difference_to(second)
        .ok_or_else(|| Error::size_mismatch(first.len(), second.len(), "paired expected durations"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FixedCoefficients, IntervalKind, NormalApproximation, RefitWith};
    use coxed_core::{sequential, CoxModel};
    use coxed_duration::{GamConfig, GamEngine, NpsfEngine};
    use nalgebra::{DMatrix, DVector};
    use rand_chacha::ChaCha8Rng;

    fn simulated_model(n: usize, seed: u64) -> CoxModel {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let x: Vec<f64> = (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let times: Vec<f64> = x
            .iter()
            .map(|xi| {
                let u: f64 = rng.gen_range(1e-9..1.0);
                (-u.ln() / (0.7 * xi).exp() * 20.0).ceil()
            })
            .collect();
        let events: Vec<bool> = (0..n).map(|_| rng.gen_bool(0.9)).collect();
        CoxModel::new(
            times,
            events,
            DMatrix::from_column_slice(n, 1, &x),
            DVector::from_vec(vec![0.7]),
        )
        .unwrap()
        .with_covariance(DMatrix::from_element(1, 1, 0.01))
        .unwrap()
    }

    #[test]
    fn test_intervals_contain_point_estimate() {
        let model = simulated_model(120, 1);
        for kind in [IntervalKind::Studentized, IntervalKind::Empirical] {
            let result = Bootstrap::new(sequential(), kind)
                .with_resamples(60)
                .unwrap()
                .with_seed(7)
                .expected_durations(&model, &NpsfEngine, &NormalApproximation, None)
                .unwrap();

            assert_eq!(result.estimates.len(), 120);
            assert_eq!(result.n_failed, 0);
            let ci = result.mean.interval.unwrap();
            assert!(ci.contains(result.mean.estimate), "{kind:?}: {ci}");
            assert!(result.mean.standard_error.unwrap() > 0.0);
            if kind == IntervalKind::Studentized {
                for e in &result.estimates {
                    assert!(e.interval.unwrap().contains(e.estimate));
                }
            }
        }
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let model = simulated_model(60, 2);
        let run = || {
            Bootstrap::new(sequential(), IntervalKind::Studentized)
                .with_resamples(20)
                .unwrap()
                .with_seed(99)
                .expected_durations(&model, &NpsfEngine, &FixedCoefficients, None)
                .unwrap()
        };
        assert_eq!(run().estimates, run().estimates);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let model = simulated_model(60, 3);
        let seq = Bootstrap::new(sequential(), IntervalKind::Empirical)
            .with_resamples(30)
            .unwrap()
            .with_seed(5)
            .expected_durations(&model, &NpsfEngine, &NormalApproximation, None)
            .unwrap();
        let par = Bootstrap::new(coxed_core::parallel(), IntervalKind::Empirical)
            .with_resamples(30)
            .unwrap()
            .with_seed(5)
            .expected_durations(&model, &NpsfEngine, &NormalApproximation, None)
            .unwrap();
        assert_eq!(seq.estimates, par.estimates);
    }

    #[test]
    fn test_failed_draws_are_dropped_and_counted() {
        let model = simulated_model(80, 4);
        // every third draw fails to refit
        let flaky = RefitWith(|m: &CoxModel, rows: &[usize]| -> anyhow::Result<DVector<f64>> {
            if rows.iter().sum::<usize>() % 3 == 0 {
                Err(anyhow::anyhow!("refit failed"))
            } else {
                Ok(m.coefficients().clone())
            }
        });
        let result = Bootstrap::new(sequential(), IntervalKind::Studentized)
            .with_resamples(40)
            .unwrap()
            .with_seed(11)
            .expected_durations(&model, &NpsfEngine, &flaky, None)
            .unwrap();
        assert!(result.n_failed > 0);
        assert!(result.n_failed < 40);
        assert_eq!(result.n_resamples, 40);
    }

    #[test]
    fn test_all_draws_failing_is_an_error() {
        let model = simulated_model(30, 5);
        let broken = RefitWith(|_: &CoxModel, _: &[usize]| -> anyhow::Result<DVector<f64>> {
            Err(anyhow::anyhow!("no convergence"))
        });
        let err = Bootstrap::new(sequential(), IntervalKind::Studentized)
            .with_resamples(5)
            .unwrap()
            .with_seed(1)
            .expected_durations(&model, &NpsfEngine, &broken, None)
            .unwrap_err();
        assert!(err.to_string().contains("no convergence"));
    }

    #[test]
    fn test_abort_flag_cancels() {
        let model = simulated_model(30, 6);
        let flag = Arc::new(AtomicBool::new(true));
        let err = Bootstrap::new(sequential(), IntervalKind::Studentized)
            .with_resamples(10)
            .unwrap()
            .with_abort_flag(flag)
            .expected_durations(&model, &NpsfEngine, &FixedCoefficients, None)
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled(_)));
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let bootstrap = || Bootstrap::new(sequential(), IntervalKind::Empirical);
        assert!(matches!(bootstrap().with_resamples(0), Err(Error::InvalidParameter(_))));
        for level in [0.0, 1.0, 1.5, f64::NAN] {
            assert!(bootstrap().with_confidence_level(level).is_err(), "{level}");
        }

        let model = simulated_model(80, 9);
        let width = |level: f64| {
            let result = bootstrap()
                .with_resamples(50)
                .unwrap()
                .with_confidence_level(level)
                .unwrap()
                .with_seed(4)
                .expected_durations(&model, &NpsfEngine, &NormalApproximation, None)
                .unwrap();
            let ci = result.mean.interval.unwrap();
            assert_eq!(ci.confidence_level, level);
            ci.width()
        };
        assert!(width(0.99) >= width(0.8));
    }

    #[test]
    fn test_resampled_gam_fits_report_extrapolated_targets() {
        let model = simulated_model(150, 12);
        let x_max = model.covariates().column(0).max();
        // the first target sits on the edge of the training range, so it is
        // in range for the full sample but not for draws that omit that row
        let targets = NewData::new(DMatrix::from_row_slice(2, 1, &[x_max, 0.0]));
        let engine = GamEngine::new(GamConfig::default()).unwrap();

        let point = engine
            .estimate(&model, &EngineInput::new().with_targets(&targets))
            .unwrap();
        assert!(point.warnings.is_empty());

        let result = Bootstrap::new(sequential(), IntervalKind::Empirical)
            .with_resamples(30)
            .unwrap()
            .with_seed(21)
            .expected_durations(&model, &engine, &FixedCoefficients, Some(&targets))
            .unwrap();
        assert_eq!(result.warnings.len(), 1, "{:?}", result.warnings);
        assert!(matches!(result.warnings[0], Warning::OutOfRange { index: 0, .. }));
    }

    #[test]
    fn test_merge_keeps_one_warning_per_target() {
        let out_of_range = |index, lp| Warning::OutOfRange {
            index,
            linear_predictor: lp,
            min: -1.0,
            max: 1.0,
        };
        let mut warnings = vec![out_of_range(2, 1.5)];
        merge_warnings(
            &mut warnings,
            vec![
                out_of_range(2, 1.7),
                out_of_range(0, -1.2),
                out_of_range(0, -1.4),
                Warning::SuppliedCovariatesIgnored("tvc".to_string()),
                Warning::SuppliedCovariatesIgnored("tvc".to_string()),
            ],
        );
        assert_eq!(
            warnings,
            vec![
                out_of_range(2, 1.5),
                out_of_range(0, -1.2),
                Warning::SuppliedCovariatesIgnored("tvc".to_string()),
            ]
        );
    }

    #[test]
    fn test_marginal_effects_with_gam() {
        let model = simulated_model(300, 8);
        let low = NewData::new(DMatrix::from_row_slice(2, 1, &[-0.5, 0.0]));
        let high = NewData::new(DMatrix::from_row_slice(2, 1, &[0.5, 0.0]));
        let engine = GamEngine::new(GamConfig::default()).unwrap();

        let result = Bootstrap::new(sequential(), IntervalKind::Studentized)
            .with_resamples(30)
            .unwrap()
            .with_seed(3)
            .marginal_effects(&model, &engine, &NormalApproximation, &low, &high)
            .unwrap();
        // raising the covariate raises the hazard and shortens durations
        assert!(result.estimates[0].estimate < 0.0);
        assert_eq!(result.estimates[1].estimate, 0.0);
        assert!(result.fit.rank_correlation() > 0.0);
    }
}
