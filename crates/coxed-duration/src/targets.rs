//! Prediction targets: one covariate profile per subject
//!
//! A profile is one or more covariate rows, each covering an interval of
//! time. Ordinary rows are single-segment profiles. Counting-process rows
//! sharing an id form a time-varying profile.

use coxed_core::{subject_rows, Error, FittedModel, NewData, Result};
use nalgebra::{DMatrix, DVector};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Segment {
    pub start: f64,
    pub row: usize,
}

/// Covariate profiles to predict expected durations for
#[derive(Debug, Clone)]
pub struct TargetSet {
    covariates: DMatrix<f64>,
    profiles: Vec<Vec<Segment>>,
    ids: Option<Vec<usize>>,
}

impl TargetSet {
    /// Targets for a call: `newdata` when given, else the full estimation sample
    ///
    /// Counting-process models need ids on `newdata` to tell subjects apart.
    pub fn resolve<M: FittedModel + ?Sized>(model: &M, newdata: Option<&NewData>) -> Result<Self> {
        match newdata {
            Some(nd) => {
                if nd.n_rows() == 0 {
                    return Err(Error::empty_input("newdata"));
                }
                if nd.covariates().ncols() != model.coefficients().len() {
                    return Err(Error::size_mismatch(
                        model.coefficients().len(),
                        nd.covariates().ncols(),
                        "newdata columns",
                    ));
                }
                if model.is_counting_process() && nd.ids().is_none() {
                    return Err(Error::MissingId(
                        "newdata for a counting-process model must carry subject ids".to_string(),
                    ));
                }
                let starts = nd
                    .intervals()
                    .map(|iv| iv.iter().map(|(s, _)| *s).collect::<Vec<f64>>());
                Ok(Self::from_rows(nd.covariates().clone(), nd.ids(), starts.as_deref()))
            }
            None => Ok(Self::from_rows(
                model.covariates().clone(),
                model.ids(),
                model.entry_times(),
            )),
        }
    }

    /// Group rows into profiles
    ///
    /// With ids and start times, rows of a subject become segments ordered
    /// by start. With ids only, a subject is represented by its last row.
    pub(crate) fn from_rows(
        covariates: DMatrix<f64>,
        ids: Option<&[usize]>,
        starts: Option<&[f64]>,
    ) -> Self {
        let Some(ids) = ids else {
            let profiles = (0..covariates.nrows())
                .map(|row| {
                    vec![Segment {
                        start: starts.map_or(f64::NEG_INFINITY, |s| s[row]),
                        row,
                    }]
                })
                .collect();
            return Self {
                covariates,
                profiles,
                ids: None,
            };
        };

        let groups = subject_rows(ids);
        let mut subject_ids = Vec::with_capacity(groups.len());
        let mut profiles = Vec::with_capacity(groups.len());
        for (id, rows) in groups {
            subject_ids.push(id);
            let profile = match starts {
                Some(starts) => {
                    let mut segments: Vec<Segment> = rows
                        .iter()
                        .map(|&row| Segment {
                            start: starts[row],
                            row,
                        })
                        .collect();
                    segments.sort_by(|a, b| a.start.total_cmp(&b.start));
                    segments
                }
                None => {
                    let last = rows[rows.len() - 1];
                    vec![Segment {
                        start: f64::NEG_INFINITY,
                        row: last,
                    }]
                }
            };
            profiles.push(profile);
        }
        Self {
            covariates,
            profiles,
            ids: Some(subject_ids),
        }
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn ids(&self) -> Option<&[usize]> {
        self.ids.as_deref()
    }

    pub(crate) fn profiles(&self) -> &[Vec<Segment>] {
        &self.profiles
    }

    /// Linear predictor of every target row
    pub(crate) fn row_predictors<M: FittedModel + ?Sized>(
        &self,
        model: &M,
        coefficients: Option<&DVector<f64>>,
    ) -> Result<DVector<f64>> {
        model.linear_predictor(&self.covariates, coefficients)
    }

    /// Linear predictor of each profile's latest segment
    pub(crate) fn latest_predictors(&self, row_lp: &DVector<f64>) -> Vec<f64> {
        self.profiles
            .iter()
            .map(|segments| row_lp[segments[segments.len() - 1].row])
            .collect()
    }
}

/// Segment in force at time `t`: the latest one starting before `t`, or the
/// first segment when `t` precedes them all
pub(crate) fn segment_at(segments: &[Segment], t: f64) -> &Segment {
    let begun = segments.partition_point(|s| s.start < t);
    &segments[begun.saturating_sub(1)]
}
