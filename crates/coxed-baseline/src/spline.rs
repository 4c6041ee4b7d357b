//! Interpolation through control points
//!
//! The monotone variant is a cubic Hermite spline with Fritsch–Carlson
//! tangents: it never overshoots between non-decreasing control points.

use coxed_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// How the failure CDF is interpolated between control points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Fritsch–Carlson monotone cubic Hermite spline
    #[default]
    MonotoneSpline,
    /// Piecewise linear
    Linear,
}

/// Interpolant through `(x, y)` control points with strictly increasing `x`
#[derive(Debug, Clone)]
pub struct Interpolant {
    xs: Vec<f64>,
    ys: Vec<f64>,
    tangents: Option<Vec<f64>>,
}

impl Interpolant {
    pub fn new(xs: Vec<f64>, ys: Vec<f64>, kind: Interpolation) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(Error::size_mismatch(xs.len(), ys.len(), "control points"));
        }
        if xs.len() < 2 {
            return Err(Error::InsufficientData {
                expected: 2,
                actual: xs.len(),
            });
        }
        if xs.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::InvalidInput(
                "Control point abscissae must be strictly increasing".to_string(),
            ));
        }
        if xs.iter().chain(&ys).any(|v| !v.is_finite()) {
            return Err(Error::non_finite("control points"));
        }

        let tangents = match kind {
            Interpolation::MonotoneSpline => Some(fritsch_carlson_tangents(&xs, &ys)),
            Interpolation::Linear => None,
        };
        Ok(Self { xs, ys, tangents })
    }

    /// Evaluate at `x`, holding the end values outside the control range
    pub fn evaluate(&self, x: f64) -> f64 {
        let n = self.xs.len();
        if x <= self.xs[0] {
            return self.ys[0];
        }
        if x >= self.xs[n - 1] {
            return self.ys[n - 1];
        }
        let k = self.xs.partition_point(|&xi| xi <= x) - 1;
        let h = self.xs[k + 1] - self.xs[k];
        let s = (x - self.xs[k]) / h;

        match &self.tangents {
            None => self.ys[k] + s * (self.ys[k + 1] - self.ys[k]),
            Some(m) => {
                let s2 = s * s;
                let s3 = s2 * s;
                let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
                let h10 = s3 - 2.0 * s2 + s;
                let h01 = -2.0 * s3 + 3.0 * s2;
                let h11 = s3 - s2;
                h00 * self.ys[k] + h10 * h * m[k] + h01 * self.ys[k + 1] + h11 * h * m[k + 1]
            }
        }
    }
}

fn fritsch_carlson_tangents(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let n = xs.len();
    let secants: Vec<f64> = (0..n - 1)
        .map(|k| (ys[k + 1] - ys[k]) / (xs[k + 1] - xs[k]))
        .collect();

    let mut m = vec![0.0; n];
    m[0] = secants[0];
    m[n - 1] = secants[n - 2];
    for k in 1..n - 1 {
        m[k] = if secants[k - 1] * secants[k] <= 0.0 {
            0.0
        } else {
            (secants[k - 1] + secants[k]) / 2.0
        };
    }

    for k in 0..n - 1 {
        if secants[k] == 0.0 {
            m[k] = 0.0;
            m[k + 1] = 0.0;
            continue;
        }
        let alpha = m[k] / secants[k];
        let beta = m[k + 1] / secants[k];
        let radius = alpha * alpha + beta * beta;
        if radius > 9.0 {
            let tau = 3.0 / radius.sqrt();
            m[k] = tau * alpha * secants[k];
            m[k + 1] = tau * beta * secants[k];
        }
    }
    m
}
