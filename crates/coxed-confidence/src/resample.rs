//! Coefficients used inside each bootstrap draw
//!
//! A draw never mutates the model. It either keeps the fitted coefficients,
//! samples them from their asymptotic normal distribution, or asks an
//! external Cox fitter to re-estimate them on the resampled rows.

use coxed_core::{Error, FittedModel, Result};
use nalgebra::DVector;
use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};

/// Source of per-draw coefficient vectors
pub trait CoefficientResampler<M: FittedModel + ?Sized>: Send + Sync {
    /// Coefficients for one draw over estimation `rows`
    ///
    /// `None` means "use the fitted coefficients".
    fn coefficients(
        &self,
        model: &M,
        rows: &[usize],
        rng: &mut StdRng,
    ) -> Result<Option<DVector<f64>>>;

    /// Method name for documentation
    fn name(&self) -> &'static str;
}

/// Keep the fitted coefficients in every draw
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedCoefficients;

impl<M: FittedModel + ?Sized> CoefficientResampler<M> for FixedCoefficients {
    fn coefficients(&self, _model: &M, _rows: &[usize], _rng: &mut StdRng) -> Result<Option<DVector<f64>>> {
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "Fixed"
    }
}

/// Draw `β* ~ N(β̂, V̂)` using the model's coefficient covariance
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalApproximation;

impl<M: FittedModel + ?Sized> CoefficientResampler<M> for NormalApproximation {
    fn coefficients(&self, model: &M, _rows: &[usize], rng: &mut StdRng) -> Result<Option<DVector<f64>>> {
        let covariance = model.coefficient_covariance().ok_or_else(|| {
            Error::InvalidInput(
                "Normal approximation needs the coefficient covariance matrix".to_string(),
            )
        })?;
        let chol = covariance.clone().cholesky().ok_or_else(|| {
            Error::Computation("Coefficient covariance is not positive definite".to_string())
        })?;
        let beta = model.coefficients();
        let z = DVector::from_fn(beta.len(), |_, _| StandardNormal.sample(rng));
        Ok(Some(beta + chol.l() * z))
    }

    fn name(&self) -> &'static str {
        "Normal approximation"
    }
}

/// Normal approximation when the model carries a coefficient covariance,
/// fixed coefficients otherwise
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoCoefficients;

impl<M: FittedModel + ?Sized> CoefficientResampler<M> for AutoCoefficients {
    fn coefficients(&self, model: &M, rows: &[usize], rng: &mut StdRng) -> Result<Option<DVector<f64>>> {
        if model.coefficient_covariance().is_some() {
            NormalApproximation.coefficients(model, rows, rng)
        } else {
            Ok(None)
        }
    }

    fn name(&self) -> &'static str {
        "Auto"
    }
}

/// Re-estimate coefficients on each resample with an external fitter
pub struct RefitWith<F>(pub F);

impl<M, F> CoefficientResampler<M> for RefitWith<F>
where
    M: FittedModel + ?Sized,
    F: Fn(&M, &[usize]) -> anyhow::Result<DVector<f64>> + Send + Sync,
{
    fn coefficients(&self, model: &M, rows: &[usize], _rng: &mut StdRng) -> Result<Option<DVector<f64>>> {
        let beta = (self.0)(model, rows).map_err(Error::Other)?;
        if beta.len() != model.coefficients().len() {
            return Err(Error::size_mismatch(
                model.coefficients().len(),
                beta.len(),
                "refitted coefficients",
            ));
        }
        Ok(Some(beta))
    }

    fn name(&self) -> &'static str {
        "Refit"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use coxed_core::CoxModel;
    use nalgebra::DMatrix;
    use rand::SeedableRng;

    fn model() -> CoxModel {
        CoxModel::new(
            vec![1.0, 2.0, 3.0],
            vec![true, false, true],
            DMatrix::from_row_slice(3, 2, &[0.0, 1.0, 1.0, 0.0, 1.0, 1.0]),
            DVector::from_vec(vec![0.5, -0.2]),
        )
        .unwrap()
    }

    #[test]
    fn test_fixed() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(FixedCoefficients.coefficients(&model(), &[0, 1], &mut rng).unwrap().is_none());
    }

    #[test]
    fn test_normal_approximation_moments() {
        let cov = DMatrix::from_row_slice(2, 2, &[0.04, 0.01, 0.01, 0.09]);
        let model = model().with_covariance(cov).unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        let n = 20_000;
        let draws: Vec<DVector<f64>> = (0..n)
            .map(|_| {
                NormalApproximation
                    .coefficients(&model, &[], &mut rng)
                    .unwrap()
                    .unwrap()
            })
            .collect();
        let mean0 = draws.iter().map(|d| d[0]).sum::<f64>() / n as f64;
        let var1 = draws.iter().map(|d| (d[1] + 0.2).powi(2)).sum::<f64>() / n as f64;
        assert_relative_eq!(mean0, 0.5, epsilon = 0.01);
        assert_relative_eq!(var1, 0.09, epsilon = 0.01);
    }

    #[test]
    fn test_normal_approximation_requires_covariance() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(NormalApproximation.coefficients(&model(), &[], &mut rng).is_err());
    }

    #[test]
    fn test_auto_follows_covariance() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(AutoCoefficients.coefficients(&model(), &[0], &mut rng).unwrap().is_none());
        let with_cov = model()
            .with_covariance(DMatrix::identity(2, 2) * 0.01)
            .unwrap();
        assert!(AutoCoefficients.coefficients(&with_cov, &[0], &mut rng).unwrap().is_some());
    }

    #[test]
    fn test_refit_errors_become_other() {
        let mut rng = StdRng::seed_from_u64(0);
        let failing = RefitWith(|_: &CoxModel, _: &[usize]| -> anyhow::Result<DVector<f64>> {
            Err(anyhow::anyhow!("did not converge"))
        });
        assert!(matches!(
            failing.coefficients(&model(), &[0], &mut rng),
            Err(Error::Other(_))
        ));

        let wrong_length = RefitWith(|_: &CoxModel, _: &[usize]| -> anyhow::Result<DVector<f64>> {
            Ok(DVector::from_vec(vec![1.0]))
        });
        assert!(wrong_length.coefficients(&model(), &[0], &mut rng).is_err());

        let constant = RefitWith(|_: &CoxModel, rows: &[usize]| -> anyhow::Result<DVector<f64>> {
            Ok(DVector::from_vec(vec![rows.len() as f64, 0.0]))
        });
        let beta = constant.coefficients(&model(), &[0, 2, 2], &mut rng).unwrap().unwrap();
        assert_eq!(beta[0], 3.0);
    }
}
