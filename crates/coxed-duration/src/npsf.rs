//! Nonparametric step-function (NPSF) expected durations
//!
//! The baseline cumulative hazard is estimated from risk sets weighted by the
//! exponentiated linear predictor. Each target's survivor curve follows by
//! proportional hazards, and its expected duration is the right Riemann sum
//! of that curve over the observed time grid.

use crate::targets::{segment_at, TargetSet};
use crate::traits::{DurationEngine, EngineInput, EngineOutput};
use crate::types::ExpectedDurations;
use coxed_baseline::{BaselineFunctions, RiskSetTable};
use coxed_core::{EstimationSample, FittedModel, Result};
use tracing::{debug, instrument};

/// NPSF duration engine
#[derive(Debug, Clone, Copy, Default)]
pub struct NpsfEngine;

impl NpsfEngine {
    pub fn new() -> Self {
        Self
    }

    /// Baseline step functions of a (possibly resampled) estimation sample
    pub fn baseline<M: FittedModel + ?Sized>(
        &self,
        model: &M,
        input: &EngineInput<'_>,
    ) -> Result<BaselineFunctions> {
        let sample = EstimationSample::gather(model, input.indices)?;
        let elp: Vec<f64> = model
            .linear_predictor(&sample.covariates, input.coefficients)?
            .iter()
            .map(|lp| lp.exp())
            .collect();

        let table = match &sample.entry {
            Some(entry) => {
                RiskSetTable::from_counting_process(entry, &sample.exit, &sample.events, &elp)?
            }
            None => RiskSetTable::from_observations(&sample.exit, &sample.events, &elp)?,
        };
        debug!(
            distinct_times = table.len(),
            failures = table.total_failures(),
            "Aggregated risk sets"
        );
        BaselineFunctions::from_risk_sets(&table)
    }
}

/// Right Riemann sum of `survivor` over `times`; the first point has zero width
pub fn integrate_survivor(times: &[f64], survivor: &[f64]) -> f64 {
    times
        .windows(2)
        .zip(survivor.iter().skip(1))
        .map(|(w, s)| (w[1] - w[0]) * s)
        .sum()
}

impl DurationEngine for NpsfEngine {
    type Fit = BaselineFunctions;

    #[instrument(skip(self, model, input), fields(n_obs = model.n_obs()))]
    fn estimate<M: FittedModel + ?Sized>(
        &self,
        model: &M,
        input: &EngineInput<'_>,
    ) -> Result<EngineOutput<BaselineFunctions>> {
        let baseline = self.baseline(model, input)?;
        let targets = TargetSet::resolve(model, input.targets)?;
        let row_lp = targets.row_predictors(model, input.coefficients)?;

        let times = baseline.times();
        let increments = baseline.hazard_increments();

        let values = targets
            .profiles()
            .iter()
            .map(|segments| {
                if segments.len() == 1 {
                    let elp = row_lp[segments[0].row].exp();
                    let survivor = baseline.individual_survivor(elp);
                    return integrate_survivor(&times, &survivor);
                }
                let mut cumulative = 0.0;
                let survivor: Vec<f64> = times
                    .iter()
                    .zip(&increments)
                    .map(|(&t, &dh)| {
                        let elp = row_lp[segment_at(segments, t).row].exp();
                        cumulative += dh * elp;
                        (-cumulative).exp()
                    })
                    .collect();
                integrate_survivor(&times, &survivor)
            })
            .collect();

        Ok(EngineOutput {
            fit: baseline,
            durations: ExpectedDurations::new(values, targets.ids().map(<[usize]>::to_vec)),
            warnings: Vec::new(),
        })
    }

    fn name(&self) -> &'static str {
        "NPSF"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use coxed_core::{CoxModel, NewData};
    use nalgebra::{DMatrix, DVector};

    fn null_model() -> CoxModel {
        // zero coefficient: ELP = 1 for everyone
        CoxModel::new(
            vec![1.0, 2.0, 3.0, 4.0],
            vec![true, true, true, true],
            DMatrix::from_row_slice(4, 1, &[0.3, -0.2, 1.0, 0.0]),
            DVector::from_vec(vec![0.0]),
        )
        .unwrap()
    }

    #[test]
    fn test_unit_exposure_expected_duration() {
        let model = null_model();
        let out = NpsfEngine.estimate(&model, &EngineInput::new()).unwrap();

        // risk sets 4, 3, 2, 1; the first time contributes no width
        let h = [
            0.25 + 1.0 / 3.0,
            0.25 + 1.0 / 3.0 + 0.5,
            0.25 + 1.0 / 3.0 + 0.5 + 1.0,
        ];
        let expected: f64 = h.iter().map(|v: &f64| (-v).exp()).sum();
        assert_eq!(out.durations.len(), 4);
        for v in &out.durations.values {
            assert_relative_eq!(*v, expected, epsilon = 1e-12);
        }
        assert_eq!(out.fit.len(), 4);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_higher_risk_shorter_duration() {
        let model = CoxModel::new(
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            vec![true; 6],
            DMatrix::from_row_slice(6, 1, &[1.0, 0.5, 0.8, -0.3, 0.0, -1.0]),
            DVector::from_vec(vec![0.7]),
        )
        .unwrap();
        let nd = NewData::new(DMatrix::from_row_slice(2, 1, &[-1.0, 1.0]));
        let out = NpsfEngine
            .estimate(&model, &EngineInput::new().with_targets(&nd))
            .unwrap();
        assert!(out.durations.values[0] > out.durations.values[1]);
    }

    #[test]
    fn test_coefficient_override_leaves_model_untouched() {
        let model = null_model();
        let beta = DVector::from_vec(vec![1.0]);
        let a = NpsfEngine
            .estimate(&model, &EngineInput::new().with_coefficients(&beta))
            .unwrap();
        let b = NpsfEngine.estimate(&model, &EngineInput::new()).unwrap();
        assert_ne!(a.durations.values, b.durations.values);
        assert_eq!(model.coefficients()[0], 0.0);
    }

    #[test]
    fn test_resample_keeps_full_sample_targets() {
        let model = null_model();
        let draw = [0, 0, 3, 2];
        let out = NpsfEngine
            .estimate(&model, &EngineInput::new().with_indices(&draw))
            .unwrap();
        assert_eq!(out.durations.len(), model.n_obs());
        assert_eq!(out.fit.times(), vec![1.0, 3.0, 4.0]);
    }

    #[test]
    fn test_single_segment_profile_matches_time_varying_path() {
        let model = CoxModel::counting_process(
            vec![0.0, 0.0, 0.0, 1.0],
            vec![1.0, 2.0, 3.0, 4.0],
            vec![true, false, true, true],
            DMatrix::from_row_slice(4, 1, &[0.2, 0.1, -0.4, 0.2]),
            DVector::from_vec(vec![0.9]),
        )
        .unwrap()
        .with_ids(vec![0, 1, 2, 3])
        .unwrap();

        // one subject split at t = 2 with identical covariates
        let split = NewData::new(DMatrix::from_row_slice(2, 1, &[0.5, 0.5]))
            .with_ids(vec![7, 7])
            .unwrap()
            .with_intervals(vec![(0.0, 2.0), (2.0, 4.0)])
            .unwrap();
        let whole = NewData::new(DMatrix::from_row_slice(1, 1, &[0.5]))
            .with_ids(vec![7])
            .unwrap();

        let a = NpsfEngine
            .estimate(&model, &EngineInput::new().with_targets(&split))
            .unwrap();
        let b = NpsfEngine
            .estimate(&model, &EngineInput::new().with_targets(&whole))
            .unwrap();
        assert_relative_eq!(a.durations.values[0], b.durations.values[0], epsilon = 1e-12);
        assert_eq!(a.durations.ids, Some(vec![7]));
    }

    #[test]
    fn test_integrate_survivor() {
        assert_eq!(integrate_survivor(&[1.0, 3.0, 4.0], &[0.9, 0.5, 0.25]), 2.0 * 0.5 + 0.25);
        assert_eq!(integrate_survivor(&[1.0], &[0.9]), 0.0);
    }
}
