//! Shared interface of the expected-duration engines

use crate::types::ExpectedDurations;
use coxed_core::{FittedModel, NewData, Result, Warning};
use nalgebra::DVector;

/// Per-call inputs layered over an immutable fitted model
///
/// Every field is optional: with none set the engine uses the model's own
/// coefficients, the full estimation sample, and predicts for that sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineInput<'a> {
    /// Coefficients replacing the fitted ones for this call only
    pub coefficients: Option<&'a DVector<f64>>,
    /// Estimation rows to use, possibly repeated (a bootstrap draw)
    pub indices: Option<&'a [usize]>,
    /// Rows to predict for
    pub targets: Option<&'a NewData>,
}

impl<'a> EngineInput<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_coefficients(mut self, coefficients: &'a DVector<f64>) -> Self {
        self.coefficients = Some(coefficients);
        self
    }

    pub fn with_indices(mut self, indices: &'a [usize]) -> Self {
        self.indices = Some(indices);
        self
    }

    pub fn with_targets(mut self, targets: &'a NewData) -> Self {
        self.targets = Some(targets);
        self
    }
}

/// What an engine returns for one call
#[derive(Debug, Clone)]
pub struct EngineOutput<F> {
    /// Engine-specific fit (baseline table or rank smoother table)
    pub fit: F,
    pub durations: ExpectedDurations,
    pub warnings: Vec<Warning>,
}

/// An algorithm turning a Cox model's linear predictor into expected durations
pub trait DurationEngine: Send + Sync {
    /// Diagnostic fit returned alongside the durations
    type Fit: Clone + Send;

    /// Estimate expected durations for the requested targets
    fn estimate<M: FittedModel + ?Sized>(
        &self,
        model: &M,
        input: &EngineInput<'_>,
    ) -> Result<EngineOutput<Self::Fit>>;

    /// Method name for documentation
    fn name(&self) -> &'static str;
}
