//! Ground-truth baselines on the integer grid `1..=T`
//!
//! A random failure CDF is drawn by placing sorted uniform heights at random
//! knot positions, interpolating monotonically between `(0, 0)` and `(T, 1)`,
//! and deriving every other baseline quantity from it.

use crate::spline::{Interpolant, Interpolation};
use coxed_core::{Error, Result};
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Baseline functions on the grid `t = 1..=T`
///
/// All vectors have length `T`; entry `t - 1` holds the value at time `t`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationBaseline {
    horizon: usize,
    failure_cdf: Vec<f64>,
    failure_pdf: Vec<f64>,
    survivor: Vec<f64>,
    cumulative_hazard: Vec<f64>,
    hazard: Vec<f64>,
}

impl SimulationBaseline {
    /// Derive all quantities from a non-decreasing failure CDF on `1..=T`
    fn from_cdf(failure_cdf: Vec<f64>) -> Self {
        let cumulative_hazard: Vec<f64> = failure_cdf.iter().map(|&f| -(1.0 - f).ln()).collect();
        let survivor: Vec<f64> = cumulative_hazard.iter().map(|&h| (-h).exp()).collect();
        Self::assemble(failure_cdf, survivor, cumulative_hazard, None)
    }

    fn assemble(
        failure_cdf: Vec<f64>,
        survivor: Vec<f64>,
        cumulative_hazard: Vec<f64>,
        hazard: Option<Vec<f64>>,
    ) -> Self {
        let horizon = failure_cdf.len();
        let mut failure_pdf = Vec::with_capacity(horizon);
        let mut previous = 0.0;
        for &f in &failure_cdf {
            failure_pdf.push(f - previous);
            previous = f;
        }
        let hazard = hazard.unwrap_or_else(|| {
            (0..horizon)
                .map(|i| {
                    let at_risk = if i == 0 { 1.0 } else { survivor[i - 1] };
                    // Once survival reaches zero, failure is certain
                    if at_risk > 0.0 {
                        failure_pdf[i] / at_risk
                    } else {
                        1.0
                    }
                })
                .collect()
        });
        Self {
            horizon,
            failure_cdf,
            failure_pdf,
            survivor,
            cumulative_hazard,
            hazard,
        }
    }

    /// Baseline from a user-supplied discrete hazard `h(t)`, `t = 1..=T`
    ///
    /// `H(t)` is the running sum of `h`, and the survivor is `exp(-H)`.
    pub fn from_hazard<F>(horizon: usize, hazard: F) -> Result<Self>
    where
        F: Fn(usize) -> f64,
    {
        if horizon < 2 {
            return Err(Error::InvalidHorizon { horizon, knots: 0 });
        }
        let hazard: Vec<f64> = (1..=horizon).map(hazard).collect();
        if let Some(bad) = hazard.iter().position(|h| !h.is_finite() || *h < 0.0) {
            return Err(Error::InvalidParameter(format!(
                "Hazard at t = {} is {}, must be finite and non-negative",
                bad + 1,
                hazard[bad]
            )));
        }
        let mut cumulative = 0.0;
        let cumulative_hazard: Vec<f64> = hazard
            .iter()
            .map(|h| {
                cumulative += h;
                cumulative
            })
            .collect();
        let survivor: Vec<f64> = cumulative_hazard.iter().map(|&h| (-h).exp()).collect();
        let failure_cdf = survivor.iter().map(|s| 1.0 - s).collect();
        Ok(Self::assemble(failure_cdf, survivor, cumulative_hazard, Some(hazard)))
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn failure_cdf(&self) -> &[f64] {
        &self.failure_cdf
    }

    pub fn failure_pdf(&self) -> &[f64] {
        &self.failure_pdf
    }

    pub fn survivor(&self) -> &[f64] {
        &self.survivor
    }

    pub fn cumulative_hazard(&self) -> &[f64] {
        &self.cumulative_hazard
    }

    pub fn hazard(&self) -> &[f64] {
        &self.hazard
    }

    /// Baseline survivor at integer time `t`; 1 at `t = 0`, 0 beyond the horizon
    /// when the CDF reaches one there
    pub fn survivor_at(&self, t: usize) -> f64 {
        match t {
            0 => 1.0,
            t if t <= self.horizon => self.survivor[t - 1],
            _ => self.survivor[self.horizon - 1],
        }
    }

    /// Survivor of a subject with multiplier `elp` at time `t`
    pub fn individual_survivor_at(&self, t: usize, elp: f64) -> f64 {
        self.survivor_at(t).powf(elp)
    }
}

/// Draws random smooth baselines for simulation
#[derive(Debug, Clone)]
pub struct BaselineBuilder {
    horizon: usize,
    knots: usize,
    interpolation: Interpolation,
}

impl BaselineBuilder {
    /// Horizon `T` and number of interior knots
    ///
    /// Fails with `InvalidHorizon` unless `T >= 2` and `1 <= knots <= T - 1`.
    pub fn new(horizon: usize, knots: usize) -> Result<Self> {
        if horizon < 2 || knots < 1 || knots > horizon - 1 {
            return Err(Error::InvalidHorizon { horizon, knots });
        }
        Ok(Self {
            horizon,
            knots,
            interpolation: Interpolation::default(),
        })
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn knots(&self) -> usize {
        self.knots
    }

    /// Draw one baseline
    #[instrument(skip(self, rng), fields(horizon = self.horizon, knots = self.knots))]
    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<SimulationBaseline> {
        let t_max = self.horizon;

        let mut positions: Vec<usize> = index::sample(rng, t_max - 1, self.knots)
            .into_iter()
            .map(|i| i + 1)
            .collect();
        positions.sort_unstable();
        let mut heights: Vec<f64> = (0..self.knots).map(|_| rng.gen::<f64>()).collect();
        heights.sort_by(|a, b| a.total_cmp(b));

        let mut xs = Vec::with_capacity(self.knots + 2);
        let mut ys = Vec::with_capacity(self.knots + 2);
        xs.push(0.0);
        ys.push(0.0);
        for (p, h) in positions.iter().zip(&heights) {
            xs.push(*p as f64);
            ys.push(*h);
        }
        xs.push(t_max as f64);
        ys.push(1.0);

        let curve = Interpolant::new(xs, ys, self.interpolation)?;

        let mut running = 0.0f64;
        let cdf: Vec<f64> = (1..=t_max)
            .map(|t| {
                running = running.max(curve.evaluate(t as f64).clamp(0.0, 1.0));
                running
            })
            .collect();

        debug!(
            final_survivor_before_horizon = 1.0 - cdf[t_max.saturating_sub(2)],
            "Built simulation baseline"
        );
        Ok(SimulationBaseline::from_cdf(cdf))
    }
}
