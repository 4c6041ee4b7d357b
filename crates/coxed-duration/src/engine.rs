//! Engine selection

use crate::gam::{GamConfig, GamEngine};
use crate::npsf::NpsfEngine;
use crate::traits::{DurationEngine, EngineInput, EngineOutput};
use crate::types::GamFitTable;
use coxed_baseline::BaselineFunctions;
use coxed_core::{FittedModel, Result};
use serde::{Deserialize, Serialize};

/// Method selector as it appears in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    #[default]
    Npsf,
    Gam,
}

/// Diagnostic fit of whichever engine ran
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FitDetail {
    Baseline(BaselineFunctions),
    Gam(GamFitTable),
}

impl FitDetail {
    pub fn baseline(&self) -> Option<&BaselineFunctions> {
        match self {
            Self::Baseline(b) => Some(b),
            Self::Gam(_) => None,
        }
    }

    pub fn gam(&self) -> Option<&GamFitTable> {
        match self {
            Self::Gam(g) => Some(g),
            Self::Baseline(_) => None,
        }
    }
}

/// Either duration engine, chosen once
#[derive(Debug, Clone, Copy)]
pub enum Engine {
    Npsf(NpsfEngine),
    Gam(GamEngine),
}

impl Engine {
    pub fn from_method(method: Method, gam: GamConfig) -> Result<Self> {
        Ok(match method {
            Method::Npsf => Self::Npsf(NpsfEngine::new()),
            Method::Gam => Self::Gam(GamEngine::new(gam)?),
        })
    }

    pub fn method(&self) -> Method {
        match self {
            Self::Npsf(_) => Method::Npsf,
            Self::Gam(_) => Method::Gam,
        }
    }
}

impl DurationEngine for Engine {
    type Fit = FitDetail;

    fn estimate<M: FittedModel + ?Sized>(
        &self,
        model: &M,
        input: &EngineInput<'_>,
    ) -> Result<EngineOutput<FitDetail>> {
        match self {
            Self::Npsf(engine) => {
                let out = engine.estimate(model, input)?;
                Ok(EngineOutput {
                    fit: FitDetail::Baseline(out.fit),
                    durations: out.durations,
                    warnings: out.warnings,
                })
            }
            Self::Gam(engine) => {
                let out = engine.estimate(model, input)?;
                Ok(EngineOutput {
                    fit: FitDetail::Gam(out.fit),
                    durations: out.durations,
                    warnings: out.warnings,
                })
            }
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Npsf(engine) => engine.name(),
            Self::Gam(engine) => engine.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_round_trip_names() {
        let npsf = Engine::from_method(Method::Npsf, GamConfig::default()).unwrap();
        assert_eq!(npsf.name(), "NPSF");
        assert_eq!(npsf.method(), Method::Npsf);

        let gam = Engine::from_method(Method::Gam, GamConfig::default()).unwrap();
        assert_eq!(gam.name(), "GAM");

        let bad = GamConfig { level: 2.0, ..Default::default() };
        assert!(Engine::from_method(Method::Gam, bad).is_err());
        // the GAM settings are irrelevant to NPSF
        assert!(Engine::from_method(Method::Npsf, bad).is_ok());
    }
}
