//! Common types for confidence intervals

use serde::{Deserialize, Serialize};
use std::fmt;

/// A confidence interval with lower and upper bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    /// Lower bound of the interval
    pub lower: f64,
    /// Upper bound of the interval
    pub upper: f64,
    /// The point estimate
    pub estimate: f64,
    /// Confidence level (e.g., 0.95 for 95% CI)
    pub confidence_level: f64,
}

impl ConfidenceInterval {
    /// Create a new confidence interval
    pub fn new(lower: f64, upper: f64, estimate: f64, confidence_level: f64) -> Self {
        Self {
            lower,
            upper,
            estimate,
            confidence_level,
        }
    }

    /// Width of the confidence interval
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// Check if a value is contained in the interval
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

impl fmt::Display for ConfidenceInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1}% CI: [{:.4}, {:.4}], estimate: {:.4}",
            self.confidence_level * 100.0,
            self.lower,
            self.upper,
            self.estimate
        )
    }
}

/// Expected duration of one target, with bootstrap uncertainty when available
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationEstimate {
    pub estimate: f64,
    pub standard_error: Option<f64>,
    pub interval: Option<ConfidenceInterval>,
    /// Subject id when targets are grouped by subject
    pub id: Option<usize>,
}

impl DurationEstimate {
    /// A point estimate without uncertainty
    pub fn point(estimate: f64, id: Option<usize>) -> Self {
        Self {
            estimate,
            standard_error: None,
            interval: None,
            id,
        }
    }
}

/// A scalar summary (mean or median) over targets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryEstimate {
    pub estimate: f64,
    pub standard_error: Option<f64>,
    pub interval: Option<ConfidenceInterval>,
}

impl SummaryEstimate {
    pub fn point(estimate: f64) -> Self {
        Self {
            estimate,
            standard_error: None,
            interval: None,
        }
    }
}
