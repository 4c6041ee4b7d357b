//! Clamped B-spline basis and difference penalties for P-splines

use coxed_core::{Error, Result};
use nalgebra::DMatrix;

/// B-spline basis on `[lo, hi]` with uniformly spaced interior knots
#[derive(Debug, Clone)]
pub struct BSplineBasis {
    knots: Vec<f64>,
    degree: usize,
    num_basis: usize,
}

impl BSplineBasis {
    /// `internal_knots` interior knots; `degree + 1` repeated knots at each end
    pub fn new(range: (f64, f64), internal_knots: usize, degree: usize) -> Result<Self> {
        let (lo, hi) = range;
        if degree < 1 {
            return Err(Error::InvalidParameter(format!(
                "Spline degree must be at least 1, got {degree}"
            )));
        }
        if !(lo.is_finite() && hi.is_finite()) || hi <= lo {
            return Err(Error::InvalidParameter(format!(
                "Invalid spline range [{lo}, {hi}]"
            )));
        }

        let step = (hi - lo) / (internal_knots as f64 + 1.0);
        let mut knots = vec![lo; degree + 1];
        knots.extend((1..=internal_knots).map(|i| lo + i as f64 * step));
        knots.extend(std::iter::repeat(hi).take(degree + 1));

        Ok(Self {
            num_basis: knots.len() - degree - 1,
            knots,
            degree,
        })
    }

    pub fn num_basis(&self) -> usize {
        self.num_basis
    }

    pub fn range(&self) -> (f64, f64) {
        (self.knots[0], self.knots[self.knots.len() - 1])
    }

    /// All basis functions at `x`, clamped into the range
    pub fn evaluate(&self, x: f64) -> Vec<f64> {
        let (lo, hi) = self.range();
        let x = x.clamp(lo, hi);
        let p = self.degree;
        let span = self
            .knots
            .iter()
            .rposition(|&k| k <= x)
            .unwrap_or(p)
            .clamp(p, self.num_basis - 1);

        // Cox-de Boor recurrence over the non-zero functions only
        let mut values = vec![0.0; p + 1];
        let mut left = vec![0.0; p + 1];
        let mut right = vec![0.0; p + 1];
        values[0] = 1.0;
        for j in 1..=p {
            left[j] = x - self.knots[span + 1 - j];
            right[j] = self.knots[span + j] - x;
            let mut saved = 0.0;
            for r in 0..j {
                let denom = right[r + 1] + left[j - r];
                let temp = if denom > 0.0 { values[r] / denom } else { 0.0 };
                values[r] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }
            values[j] = saved;
        }

        let mut row = vec![0.0; self.num_basis];
        for (i, v) in values.into_iter().enumerate() {
            row[span - p + i] = v;
        }
        row
    }

    /// Basis matrix with one row per point
    pub fn design(&self, xs: &[f64]) -> DMatrix<f64> {
        let mut b = DMatrix::zeros(xs.len(), self.num_basis);
        for (i, &x) in xs.iter().enumerate() {
            for (j, v) in self.evaluate(x).into_iter().enumerate() {
                b[(i, j)] = v;
            }
        }
        b
    }
}

/// Penalty `DᵀD` for `order`-th differences of adjacent coefficients
pub fn difference_penalty(num_basis: usize, order: usize) -> Result<DMatrix<f64>> {
    if order == 0 || order >= num_basis {
        return Err(Error::InvalidParameter(format!(
            "Penalty order {order} must be in 1..{num_basis}"
        )));
    }
    let mut d = DMatrix::<f64>::identity(num_basis, num_basis);
    for _ in 0..order {
        let rows = d.nrows() - 1;
        d = DMatrix::from_fn(rows, num_basis, |i, j| d[(i + 1, j)] - d[(i, j)]);
    }
    Ok(d.transpose() * d)
}
