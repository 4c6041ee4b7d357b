//! Batches of simulated datasets and their known marginal effects

use crate::config::SimulationConfig;
use crate::dataset::SimulatedDataset;
use crate::simulator::DurationSimulator;
use coxed_baseline::{BaselineBuilder, Interpolation, SimulationBaseline};
use coxed_core::{linear_predictor, utils, Error, Result};
use nalgebra::{DMatrix, DVector};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Settings for [`simulate_survdata`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SurvdataConfig {
    /// Maximum duration `T`
    pub horizon: usize,
    /// Interior knots of the random failure CDF
    pub knots: usize,
    /// Monotone spline interpolation of the CDF; linear when false
    pub spline: bool,
    pub num_data_frames: usize,
    /// Share one baseline across all datasets
    pub fixed_hazard: bool,
    pub simulation: SimulationConfig,
}

impl Default for SurvdataConfig {
    fn default() -> Self {
        Self {
            horizon: 100,
            knots: 8,
            spline: true,
            num_data_frames: 1,
            fixed_hazard: false,
            simulation: SimulationConfig::default(),
        }
    }
}

impl SurvdataConfig {
    pub fn validate(&self) -> Result<()> {
        if self.num_data_frames == 0 {
            return Err(Error::InvalidParameter(
                "num_data_frames must be positive".to_string(),
            ));
        }
        BaselineBuilder::new(self.horizon, self.knots)?;
        self.simulation.validate()
    }

    fn builder(&self) -> Result<BaselineBuilder> {
        let interpolation = if self.spline {
            Interpolation::MonotoneSpline
        } else {
            Interpolation::Linear
        };
        Ok(BaselineBuilder::new(self.horizon, self.knots)?.with_interpolation(interpolation))
    }
}

/// Datasets of one batch, each with the baseline it was drawn from
#[derive(Debug, Clone)]
pub struct Survdata {
    pub datasets: Vec<SimulatedDataset>,
    /// One per dataset; identical when the hazard is fixed
    pub baselines: Vec<SimulationBaseline>,
}

/// Draw `num_data_frames` datasets against random baselines
#[instrument(skip_all, fields(num_data_frames = config.num_data_frames, fixed_hazard = config.fixed_hazard))]
pub fn simulate_survdata<R: Rng + ?Sized>(config: &SurvdataConfig, rng: &mut R) -> Result<Survdata> {
    config.validate()?;
    let builder = config.builder()?;
    let simulator = DurationSimulator::new(config.simulation.clone())?;

    let shared = if config.fixed_hazard {
        Some(builder.build(rng)?)
    } else {
        None
    };
    let mut datasets = Vec::with_capacity(config.num_data_frames);
    let mut baselines = Vec::with_capacity(config.num_data_frames);
    for _ in 0..config.num_data_frames {
        let baseline = match &shared {
            Some(b) => b.clone(),
            None => builder.build(rng)?,
        };
        datasets.push(simulator.generate(&baseline, rng)?);
        baselines.push(baseline);
    }
    debug!("Simulated {} datasets", datasets.len());
    Ok(Survdata { datasets, baselines })
}

/// Draw `num_data_frames` datasets against a baseline given by its hazard
///
/// The baseline is deterministic, so `fixed_hazard` and `knots` play no part.
pub fn simulate_survdata_with_hazard<R, F>(
    config: &SurvdataConfig,
    hazard: F,
    rng: &mut R,
) -> Result<Survdata>
where
    R: Rng + ?Sized,
    F: Fn(usize) -> f64,
{
    if config.num_data_frames == 0 {
        return Err(Error::InvalidParameter(
            "num_data_frames must be positive".to_string(),
        ));
    }
    let baseline = SimulationBaseline::from_hazard(config.horizon, hazard)?;
    let simulator = DurationSimulator::new(config.simulation.clone())?;
    let datasets = (0..config.num_data_frames)
        .map(|_| simulator.generate(&baseline, rng))
        .collect::<Result<Vec<_>>>()?;
    Ok(Survdata {
        baselines: vec![baseline; datasets.len()],
        datasets,
    })
}

/// Known duration change when covariates move from `x0` to `x1`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginalEffect {
    pub expected0: Vec<f64>,
    pub expected1: Vec<f64>,
    /// `expected1 - expected0` per subject
    pub per_subject: Vec<f64>,
    pub mean: f64,
    pub median: f64,
}

/// True marginal effect under a known baseline
///
/// The expected duration of a subject is `Σ_{t=0}^{T-1} S0(t)^ELP`.
pub fn true_marginal_effect(
    baseline: &SimulationBaseline,
    beta: &DVector<f64>,
    x0: &DMatrix<f64>,
    x1: &DMatrix<f64>,
) -> Result<MarginalEffect> {
    if x0.shape() != x1.shape() {
        return Err(Error::size_mismatch(x0.nrows(), x1.nrows(), "paired covariate rows"));
    }
    let expected = |x: &DMatrix<f64>| -> Result<Vec<f64>> {
        Ok(linear_predictor(x, beta)?
            .iter()
            .map(|lp| {
                let elp = lp.exp();
                (0..baseline.horizon())
                    .map(|t| baseline.individual_survivor_at(t, elp))
                    .sum()
            })
            .collect())
    };
    let expected0 = expected(x0)?;
    let expected1 = expected(x1)?;
    let per_subject: Vec<f64> = expected0.iter().zip(&expected1).map(|(a, b)| b - a).collect();
    Ok(MarginalEffect {
        mean: utils::mean(&per_subject),
        median: utils::median(&per_subject),
        expected0,
        expected1,
        per_subject,
    })
}
