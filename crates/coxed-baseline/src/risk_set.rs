//! Risk-set aggregation by distinct observed time

use coxed_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// One distinct observed time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskSetRow {
    pub time: f64,
    /// Failures recorded exactly at `time`
    pub failures: usize,
    /// Exposure still at risk just before `time`
    pub risk_set: f64,
}

/// Failure counts and risk-set sizes over every distinct exit time
///
/// Exposure is the exponentiated linear predictor of each row (Breslow
/// weighting); passing unit exposure gives plain head counts. Censored-only
/// times appear with zero failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSetTable {
    rows: Vec<RiskSetRow>,
}

impl RiskSetTable {
    /// Aggregate right-censored observations
    pub fn from_observations(times: &[f64], events: &[bool], exposure: &[f64]) -> Result<Self> {
        Self::aggregate(None, times, events, exposure)
    }

    /// Aggregate counting-process `(entry, exit]` rows
    ///
    /// A row contributes to the risk set at `t` when `entry < t <= exit`.
    pub fn from_counting_process(
        entry: &[f64],
        exit: &[f64],
        events: &[bool],
        exposure: &[f64],
    ) -> Result<Self> {
        if entry.len() != exit.len() {
            return Err(Error::size_mismatch(exit.len(), entry.len(), "entry times"));
        }
        Self::aggregate(Some(entry), exit, events, exposure)
    }

    /// Build a table from already aggregated rows
    pub fn from_rows(rows: Vec<RiskSetRow>) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::empty_input("risk set table"));
        }
        for pair in rows.windows(2) {
            if pair[1].time <= pair[0].time {
                return Err(Error::InvalidInput(
                    "Risk-set times must be strictly increasing".to_string(),
                ));
            }
        }
        if rows
            .iter()
            .any(|r| !r.time.is_finite() || !r.risk_set.is_finite() || r.risk_set < 0.0)
        {
            return Err(Error::InvalidInput(
                "Risk-set rows must have finite times and non-negative sizes".to_string(),
            ));
        }
        Ok(Self { rows })
    }

    fn aggregate(
        entry: Option<&[f64]>,
        exit: &[f64],
        events: &[bool],
        exposure: &[f64],
    ) -> Result<Self> {
        let n = exit.len();
        if n == 0 {
            return Err(Error::empty_input("risk set table"));
        }
        if events.len() != n {
            return Err(Error::size_mismatch(n, events.len(), "event vector"));
        }
        if exposure.len() != n {
            return Err(Error::size_mismatch(n, exposure.len(), "exposure vector"));
        }
        if exit.iter().chain(exposure).any(|v| !v.is_finite()) {
            return Err(Error::non_finite("risk set input"));
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| exit[a].total_cmp(&exit[b]));

        // Exposure of rows whose interval opens at or after a time, for
        // removing late entrants from the reverse cumulative sum
        let late_entries = entry.map(|entry| {
            let mut pairs: Vec<(f64, f64)> = entry.iter().copied().zip(exposure.iter().copied()).collect();
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
            let mut suffix = vec![0.0; pairs.len() + 1];
            for i in (0..pairs.len()).rev() {
                suffix[i] = suffix[i + 1] + pairs[i].1;
            }
            (pairs.into_iter().map(|(t, _)| t).collect::<Vec<f64>>(), suffix)
        });

        let mut rows: Vec<RiskSetRow> = Vec::new();
        let mut at_or_after: f64 = exposure.iter().sum();
        let mut i = 0;
        while i < n {
            let time = exit[order[i]];
            let mut failures = 0;
            let mut leaving = 0.0;
            while i < n && exit[order[i]] == time {
                if events[order[i]] {
                    failures += 1;
                }
                leaving += exposure[order[i]];
                i += 1;
            }

            let mut risk_set = at_or_after;
            if let Some((starts, suffix)) = &late_entries {
                let first_late = starts.partition_point(|&s| s < time);
                risk_set -= suffix[first_late];
            }
            rows.push(RiskSetRow {
                time,
                failures,
                // Guard rounding from the subtractions
                risk_set: risk_set.max(0.0),
            });
            at_or_after -= leaving;
        }

        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[RiskSetRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn times(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.time).collect()
    }

    /// Total number of failures in the table
    pub fn total_failures(&self) -> usize {
        self.rows.iter().map(|r| r.failures).sum()
    }
}
