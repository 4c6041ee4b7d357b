//! GAM rank-regression expected durations
//!
//! Observations are ranked on the duration scale of the linear predictor
//! (`-XB`, so rank 1 carries the highest hazard). A penalized regression
//! spline of observed duration on rank is fitted to the uncensored
//! observations, and a target's expected duration is that curve evaluated at
//! the target's interpolated rank.

pub mod basis;
pub mod smoother;

use crate::targets::TargetSet;
use crate::traits::{DurationEngine, EngineInput, EngineOutput};
use crate::types::{ExpectedDurations, GamFitRow, GamFitTable};
use coxed_core::{math, subject_rows, utils, Error, EstimationSample, FittedModel, Result, Warning};
use serde::{Deserialize, Serialize};
use smoother::PenalizedSpline;
use tracing::{debug, instrument, warn};

/// Settings of the rank smoother
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GamConfig {
    pub internal_knots: usize,
    pub degree: usize,
    pub penalty_order: usize,
    /// Fewest distinct linear predictor values among failures for a fit
    pub min_distinct: usize,
    /// Level of the pointwise band in the fit table
    pub level: f64,
}

impl Default for GamConfig {
    fn default() -> Self {
        Self {
            internal_knots: 8,
            degree: 3,
            penalty_order: 2,
            min_distinct: 10,
            level: 0.95,
        }
    }
}

impl GamConfig {
    pub fn validate(&self) -> Result<()> {
        if self.degree < 1 {
            return Err(Error::InvalidParameter("GAM spline degree must be at least 1".to_string()));
        }
        let num_basis = self.internal_knots + self.degree + 1;
        if self.penalty_order == 0 || self.penalty_order >= num_basis {
            return Err(Error::InvalidParameter(format!(
                "GAM penalty order {} must be in 1..{num_basis}",
                self.penalty_order
            )));
        }
        if self.min_distinct < 2 {
            return Err(Error::InvalidParameter(
                "GAM needs at least 2 distinct linear predictor values".to_string(),
            ));
        }
        if !(self.level > 0.0 && self.level < 1.0) {
            return Err(Error::invalid_level(self.level));
        }
        Ok(())
    }
}

/// Training observations after collapsing counting-process histories
struct TrainingSet {
    linear_predictor: Vec<f64>,
    duration: Vec<f64>,
    failed: Vec<bool>,
}

impl TrainingSet {
    fn gather<M: FittedModel + ?Sized>(model: &M, input: &EngineInput<'_>) -> Result<Self> {
        let sample = EstimationSample::gather(model, input.indices)?;
        let lp = model.linear_predictor(&sample.covariates, input.coefficients)?;

        match (&sample.entry, &sample.ids) {
            (Some(_), Some(ids)) => {
                let mut out = Self {
                    linear_predictor: Vec::new(),
                    duration: Vec::new(),
                    failed: Vec::new(),
                };
                for (_, rows) in subject_rows(ids) {
                    let last = rows
                        .iter()
                        .copied()
                        .max_by(|&a, &b| sample.exit[a].total_cmp(&sample.exit[b]))
                        .unwrap_or(rows[0]);
                    out.linear_predictor.push(lp[last]);
                    out.duration.push(sample.exit[last]);
                    out.failed.push(sample.events[last]);
                }
                Ok(out)
            }
            _ => Ok(Self {
                linear_predictor: lp.iter().copied().collect(),
                duration: sample.exit,
                failed: sample.events,
            }),
        }
    }
}

/// Piecewise-linear map from linear predictor to rank
///
/// Tied predictor values share their mean rank.
#[derive(Debug, Clone)]
struct RankMap {
    knots: Vec<(f64, f64)>,
}

impl RankMap {
    fn new(linear_predictor: &[f64], ranks: &[usize]) -> Self {
        let mut pairs: Vec<(f64, f64)> = linear_predictor
            .iter()
            .zip(ranks)
            .map(|(&lp, &r)| (lp, r as f64))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut knots: Vec<(f64, f64)> = Vec::new();
        let mut i = 0;
        while i < pairs.len() {
            let mut j = i;
            let mut total = 0.0;
            while j < pairs.len() && pairs[j].0 == pairs[i].0 {
                total += pairs[j].1;
                j += 1;
            }
            knots.push((pairs[i].0, total / (j - i) as f64));
            i = j;
        }
        Self { knots }
    }

    fn range(&self) -> (f64, f64) {
        (self.knots[0].0, self.knots[self.knots.len() - 1].0)
    }

    fn rank_of(&self, lp: f64) -> f64 {
        let n = self.knots.len();
        if n == 1 {
            return self.knots[0].1;
        }
        let segment = self
            .knots
            .partition_point(|k| k.0 <= lp)
            .clamp(1, n - 1);
        let (x0, y0) = self.knots[segment - 1];
        let (x1, y1) = self.knots[segment];
        y0 + (y1 - y0) * (lp - x0) / (x1 - x0)
    }
}

/// GAM duration engine
#[derive(Debug, Clone, Copy, Default)]
pub struct GamEngine {
    config: GamConfig,
}

impl GamEngine {
    pub fn new(config: GamConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GamConfig {
        &self.config
    }
}

impl DurationEngine for GamEngine {
    type Fit = GamFitTable;

    #[instrument(skip(self, model, input), fields(n_obs = model.n_obs()))]
    fn estimate<M: FittedModel + ?Sized>(
        &self,
        model: &M,
        input: &EngineInput<'_>,
    ) -> Result<EngineOutput<GamFitTable>> {
        let training = TrainingSet::gather(model, input)?;
        let n = training.linear_predictor.len();

        let mut failed_lp: Vec<f64> = training
            .linear_predictor
            .iter()
            .zip(&training.failed)
            .filter(|(_, failed)| **failed)
            .map(|(&lp, _)| lp)
            .collect();
        failed_lp.sort_by(|a, b| a.total_cmp(b));
        failed_lp.dedup();
        if failed_lp.len() < self.config.min_distinct {
            return Err(Error::DegenerateFit {
                distinct: failed_lp.len(),
                required: self.config.min_distinct,
            });
        }

        // duration scale: larger -XB means lower hazard and longer durations
        let duration_scale: Vec<f64> = training.linear_predictor.iter().map(|lp| -lp).collect();
        let ranks = utils::ordinal_ranks(&duration_scale);

        let (fit_x, fit_y): (Vec<f64>, Vec<f64>) = ranks
            .iter()
            .zip(&training.duration)
            .zip(&training.failed)
            .filter(|(_, failed)| **failed)
            .map(|((&r, &d), _)| (r as f64, d))
            .unzip();

        let smooth = PenalizedSpline::fit(
            &fit_x,
            &fit_y,
            (1.0, n as f64),
            self.config.internal_knots,
            self.config.degree,
            self.config.penalty_order,
        )?;
        let z = math::normal_critical_value(self.config.level)?;

        let mut rows: Vec<GamFitRow> = (0..n)
            .map(|i| {
                let rank = ranks[i];
                let fitted = smooth.evaluate(rank as f64);
                let se = smooth.standard_error(rank as f64);
                GamFitRow {
                    rank,
                    linear_predictor: training.linear_predictor[i],
                    observed_duration: training.duration[i],
                    failed: training.failed[i],
                    fitted,
                    lower: fitted - z * se,
                    upper: fitted + z * se,
                }
            })
            .collect();
        rows.sort_by_key(|r| r.rank);
        let table = GamFitTable {
            rows,
            edf: smooth.edf(),
            lambda: smooth.lambda(),
            residual_variance: smooth.residual_variance(),
            level: self.config.level,
        };
        debug!(edf = table.edf, lambda = table.lambda, "Fitted rank smoother");

        let rank_map = RankMap::new(&duration_scale, &ranks);
        let (lo, hi) = rank_map.range();

        let targets = TargetSet::resolve(model, input.targets)?;
        let row_lp = targets.row_predictors(model, input.coefficients)?;
        let mut warnings = Vec::new();
        let values = targets
            .latest_predictors(&row_lp)
            .into_iter()
            .enumerate()
            .map(|(index, lp)| {
                if -lp < lo || -lp > hi {
                    warnings.push(Warning::OutOfRange {
                        index,
                        linear_predictor: lp,
                        min: -hi,
                        max: -lo,
                    });
                }
                smooth.evaluate(rank_map.rank_of(-lp))
            })
            .collect();

        if !warnings.is_empty() {
            warn!(
                count = warnings.len(),
                "Linear predictors outside the training range; rank smoother extrapolated"
            );
        }

        Ok(EngineOutput {
            fit: table,
            durations: ExpectedDurations::new(values, targets.ids().map(<[usize]>::to_vec)),
            warnings,
        })
    }

    fn name(&self) -> &'static str {
        "GAM"
    }
}
