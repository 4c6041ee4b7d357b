//! Non-fatal conditions surfaced alongside results

use serde::{Deserialize, Serialize};
use std::fmt;

/// A condition worth reporting that does not abort the computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Warning {
    /// A target's linear predictor fell outside the training range and the
    /// rank smoother was extrapolated
    OutOfRange {
        /// Position of the target in the prediction batch
        index: usize,
        linear_predictor: f64,
        min: f64,
        max: f64,
    },
    /// Caller-supplied covariates were discarded in favour of generated ones
    SuppliedCovariatesIgnored(String),
}

impl Warning {
    /// Whether this is an extrapolation warning
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Self::OutOfRange { .. })
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange {
                index,
                linear_predictor,
                min,
                max,
            } => write!(
                f,
                "target {index}: linear predictor {linear_predictor:.4} outside training range [{min:.4}, {max:.4}]"
            ),
            Self::SuppliedCovariatesIgnored(reason) => {
                write!(f, "supplied covariates ignored: {reason}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_display() {
        let w = Warning::OutOfRange {
            index: 3,
            linear_predictor: 2.5,
            min: -1.0,
            max: 1.0,
        };
        assert!(w.is_out_of_range());
        assert_eq!(
            w.to_string(),
            "target 3: linear predictor 2.5000 outside training range [-1.0000, 1.0000]"
        );

        let w = Warning::SuppliedCovariatesIgnored("tvc".to_string());
        assert!(!w.is_out_of_range());
        assert_eq!(w.to_string(), "supplied covariates ignored: tvc");
    }
}
