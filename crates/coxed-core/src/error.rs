//! Error types for Cox duration estimation
//!
//! Provides a unified error type for all coxed crates.

use thiserror::Error;

/// Core error type for duration estimation and simulation
#[derive(Error, Debug)]
pub enum Error {
    /// Simulation horizon or knot count cannot produce a baseline
    #[error("Invalid horizon: T = {horizon} with {knots} knots (need T >= 2 and 1 <= knots <= T - 1)")]
    InvalidHorizon { horizon: usize, knots: usize },

    /// User-supplied covariates or coefficients conflict with the requested layout
    #[error("Invalid covariate specification: {0}")]
    InvalidCovariateSpec(String),

    /// Censoring proportion outside [0, 1)
    #[error("Invalid censoring proportion {0}: must lie in [0, 1)")]
    InvalidCensorProportion(f64),

    /// Too few distinct linear predictor values to fit the rank smoother
    #[error("Degenerate fit: {distinct} distinct values, at least {required} required")]
    DegenerateFit { distinct: usize, required: usize },

    /// Counting-process data used without a subject id vector
    #[error("Missing id: {0}")]
    MissingId(String),

    /// Invalid parameter provided to a function
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Insufficient data for the requested operation
    #[error("Insufficient data: expected at least {expected} samples, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    /// Numerical computation error
    #[error("Computation error: {0}")]
    Computation(String),

    /// Threading or parallelization error
    #[error("Execution error: {0}")]
    Execution(String),

    /// The caller abandoned the run
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Failures reported by external collaborators
    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

// Helper functions for common error patterns

impl Error {
    /// Create an error for empty input
    pub fn empty_input(_operation: &str) -> Self {
        Self::InsufficientData {
            expected: 1,
            actual: 0,
        }
    }

    /// Create an error for size mismatch
    pub fn size_mismatch(expected: usize, actual: usize, context: &str) -> Self {
        Self::InvalidInput(format!(
            "Size mismatch in {context}: expected {expected}, got {actual}"
        ))
    }

    /// Create an error for NaN/Inf values
    pub fn non_finite(context: &str) -> Self {
        Self::Computation(format!("{context} contains NaN or infinite values"))
    }

    /// Create an error for an invalid confidence level
    pub fn invalid_level(level: f64) -> Self {
        Self::InvalidParameter(format!("Confidence level {level} must be in (0, 1)"))
    }
}
