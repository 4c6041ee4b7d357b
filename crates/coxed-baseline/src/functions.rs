//! Step-function baseline cumulative hazard and survivor

use crate::risk_set::RiskSetTable;
use coxed_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Baseline values at one distinct time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineRecord {
    pub time: f64,
    pub cumulative_hazard: f64,
    pub survivor: f64,
}

/// Right-continuous step baseline over the distinct observed times
///
/// The survivor column is always `exp(-cumulative_hazard)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineFunctions {
    records: Vec<BaselineRecord>,
}

impl BaselineFunctions {
    /// Breslow-type estimate: running sum of `failures / risk_set`
    pub fn from_risk_sets(table: &RiskSetTable) -> Result<Self> {
        let mut cumulative = 0.0;
        let mut records = Vec::with_capacity(table.len());
        for row in table.rows() {
            if row.failures > 0 {
                if row.risk_set <= 0.0 {
                    return Err(Error::Computation(format!(
                        "{} failures at time {} with an empty risk set",
                        row.failures, row.time
                    )));
                }
                cumulative += row.failures as f64 / row.risk_set;
            }
            records.push(BaselineRecord {
                time: row.time,
                cumulative_hazard: cumulative,
                survivor: (-cumulative).exp(),
            });
        }
        Ok(Self { records })
    }

    /// Build from a cumulative hazard path on a time grid
    pub fn from_cumulative_hazard(times: &[f64], cumulative_hazard: &[f64]) -> Result<Self> {
        if times.len() != cumulative_hazard.len() {
            return Err(Error::size_mismatch(
                times.len(),
                cumulative_hazard.len(),
                "cumulative hazard",
            ));
        }
        if times.is_empty() {
            return Err(Error::empty_input("baseline"));
        }
        for i in 1..times.len() {
            if times[i] <= times[i - 1] {
                return Err(Error::InvalidInput(
                    "Baseline times must be strictly increasing".to_string(),
                ));
            }
            if cumulative_hazard[i] < cumulative_hazard[i - 1] {
                return Err(Error::InvalidInput(
                    "Cumulative hazard must be non-decreasing".to_string(),
                ));
            }
        }
        if cumulative_hazard.first().map_or(false, |h| *h < 0.0 || h.is_nan()) {
            return Err(Error::InvalidInput(
                "Cumulative hazard must be non-negative".to_string(),
            ));
        }
        Ok(Self {
            records: times
                .iter()
                .zip(cumulative_hazard)
                .map(|(&time, &h)| BaselineRecord {
                    time,
                    cumulative_hazard: h,
                    survivor: (-h).exp(),
                })
                .collect(),
        })
    }

    pub fn records(&self) -> &[BaselineRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn times(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.time).collect()
    }

    pub fn survivors(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.survivor).collect()
    }

    /// Jump in cumulative hazard at each record
    pub fn hazard_increments(&self) -> Vec<f64> {
        let mut previous = 0.0;
        self.records
            .iter()
            .map(|r| {
                let jump = r.cumulative_hazard - previous;
                previous = r.cumulative_hazard;
                jump
            })
            .collect()
    }

    /// Cumulative hazard at `t`; zero before the first time
    pub fn cumulative_hazard_at(&self, t: f64) -> f64 {
        let idx = self.records.partition_point(|r| r.time <= t);
        if idx == 0 {
            0.0
        } else {
            self.records[idx - 1].cumulative_hazard
        }
    }

    pub fn survivor_at(&self, t: f64) -> f64 {
        (-self.cumulative_hazard_at(t)).exp()
    }

    /// Survivor at each record for a subject with the given ELP
    pub fn individual_survivor(&self, elp: f64) -> Vec<f64> {
        self.records
            .iter()
            .map(|r| (-r.cumulative_hazard * elp).exp())
            .collect()
    }
}
