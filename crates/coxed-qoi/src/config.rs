//! Options of a quantities-of-interest call

use coxed_confidence::IntervalKind;
use coxed_core::{Error, Result};
use coxed_duration::{GamConfig, Method};
use serde::{Deserialize, Serialize};

/// Settings for [`Coxed`](crate::Coxed)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QoiConfig {
    pub method: Method,
    /// Attach bootstrap standard errors and intervals
    pub bootstrap: bool,
    /// Bootstrap iterations `B`
    pub resamples: usize,
    /// Confidence level in `(0, 1)`
    pub level: f64,
    pub confidence: IntervalKind,
    /// Seed of the bootstrap; drawn from the thread RNG when absent
    pub seed: Option<u64>,
    pub gam: GamConfig,
}

impl Default for QoiConfig {
    fn default() -> Self {
        Self {
            method: Method::Npsf,
            bootstrap: false,
            resamples: 200,
            level: 0.95,
            confidence: IntervalKind::Studentized,
            seed: None,
            gam: GamConfig::default(),
        }
    }
}

impl QoiConfig {
    /// Load settings from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::InvalidParameter(format!("Invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.resamples == 0 {
            return Err(Error::InvalidParameter(
                "Number of resamples must be positive".to_string(),
            ));
        }
        if !(self.level > 0.0 && self.level < 1.0) {
            return Err(Error::invalid_level(self.level));
        }
        self.gam.validate()
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Enable the bootstrap with `resamples` iterations
    pub fn with_bootstrap(mut self, resamples: usize) -> Self {
        self.bootstrap = true;
        self.resamples = resamples;
        self
    }

    pub fn with_confidence(mut self, confidence: IntervalKind) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_level(mut self, level: f64) -> Self {
        self.level = level;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
