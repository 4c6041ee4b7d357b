//! Result types of the duration engines

use coxed_core::utils;
use serde::{Deserialize, Serialize};

/// Expected duration per prediction target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedDurations {
    pub values: Vec<f64>,
    /// Subject id of each target when targets are grouped by subject
    pub ids: Option<Vec<usize>>,
}

impl ExpectedDurations {
    pub fn new(values: Vec<f64>, ids: Option<Vec<usize>>) -> Self {
        Self { values, ids }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn mean(&self) -> f64 {
        utils::mean(&self.values)
    }

    pub fn median(&self) -> f64 {
        utils::median(&self.values)
    }

    /// Elementwise `other - self`
    pub fn difference_to(&self, other: &Self) -> Option<Self> {
        if self.len() != other.len() {
            return None;
        }
        Some(Self {
            values: self
                .values
                .iter()
                .zip(&other.values)
                .map(|(a, b)| b - a)
                .collect(),
            ids: self.ids.clone(),
        })
    }
}

/// One observation of the rank smoother, sorted by rank
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GamFitRow {
    pub rank: usize,
    pub linear_predictor: f64,
    pub observed_duration: f64,
    pub failed: bool,
    pub fitted: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Diagnostic table of a GAM fit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GamFitTable {
    pub rows: Vec<GamFitRow>,
    /// Effective degrees of freedom of the smoother
    pub edf: f64,
    /// Smoothing parameter chosen by GCV
    pub lambda: f64,
    pub residual_variance: f64,
    pub level: f64,
}

impl GamFitTable {
    /// Pearson correlation between rank and fitted duration
    pub fn rank_correlation(&self) -> f64 {
        let ranks: Vec<f64> = self.rows.iter().map(|r| r.rank as f64).collect();
        let fitted: Vec<f64> = self.rows.iter().map(|r| r.fitted).collect();
        utils::correlation(&ranks, &fitted)
    }
}
