//! Estimation-sample gathering and resampling units
//!
//! Bootstrap draws pick resampling units with replacement. A unit is a single
//! row for ordinary data and every row of one subject when the model carries
//! ids, so counting-process histories are never split.

use crate::{Error, FittedModel, Result};
use nalgebra::DMatrix;
use std::collections::HashMap;

/// Owned copy of (possibly resampled) estimation rows
#[derive(Debug, Clone)]
pub struct EstimationSample {
    pub entry: Option<Vec<f64>>,
    pub exit: Vec<f64>,
    pub events: Vec<bool>,
    pub covariates: DMatrix<f64>,
    pub ids: Option<Vec<usize>>,
}

impl EstimationSample {
    /// Collect the given rows of a model (all rows when `rows` is `None`)
    pub fn gather<M: FittedModel + ?Sized>(model: &M, rows: Option<&[usize]>) -> Result<Self> {
        let n = model.n_obs();
        let rows: Vec<usize> = match rows {
            Some(rows) => {
                if let Some(&bad) = rows.iter().find(|&&r| r >= n) {
                    return Err(Error::InvalidInput(format!(
                        "Row index {bad} out of bounds for {n} observations"
                    )));
                }
                rows.to_vec()
            }
            None => (0..n).collect(),
        };
        if rows.is_empty() {
            return Err(Error::empty_input("estimation sample"));
        }

        let exit_all = model.observed_times();
        let events_all = model.events();
        let x = model.covariates();

        // Resampled subjects get fresh ids so duplicates stay distinct
        let ids = model.ids().map(|ids| relabel_duplicates(ids, &rows));

        Ok(Self {
            entry: model
                .entry_times()
                .map(|entry| rows.iter().map(|&r| entry[r]).collect()),
            exit: rows.iter().map(|&r| exit_all[r]).collect(),
            events: rows.iter().map(|&r| events_all[r]).collect(),
            covariates: DMatrix::from_fn(rows.len(), x.ncols(), |i, j| x[(rows[i], j)]),
            ids,
        })
    }

    pub fn len(&self) -> usize {
        self.exit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exit.is_empty()
    }
}

/// Give each repeated occurrence of a subject its own id
///
/// `rows` arrives as whole subjects laid out contiguously with increasing row
/// positions (see [`expand_units`]), so a new occurrence starts whenever the
/// id changes or the row position stops increasing.
fn relabel_duplicates(ids: &[usize], rows: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(rows.len());
    let mut next = 0usize;
    let mut previous: Option<(usize, usize)> = None;
    for &r in rows {
        let id = ids[r];
        let continues = matches!(previous, Some((prev_id, prev_row)) if prev_id == id && r > prev_row);
        if !continues {
            next += 1;
        }
        out.push(next - 1);
        previous = Some((id, r));
    }
    out
}

/// Group row positions by subject id, in order of first appearance
pub fn subject_rows(ids: &[usize]) -> Vec<(usize, Vec<usize>)> {
    let mut position: HashMap<usize, usize> = HashMap::new();
    let mut groups: Vec<(usize, Vec<usize>)> = Vec::new();
    for (row, &id) in ids.iter().enumerate() {
        match position.get(&id) {
            Some(&g) => groups[g].1.push(row),
            None => {
                position.insert(id, groups.len());
                groups.push((id, vec![row]));
            }
        }
    }
    groups
}

/// Resampling units of a model: subjects when ids exist, rows otherwise
pub fn resampling_units<M: FittedModel + ?Sized>(model: &M) -> Vec<Vec<usize>> {
    match model.ids() {
        Some(ids) => subject_rows(ids).into_iter().map(|(_, rows)| rows).collect(),
        None => (0..model.n_obs()).map(|r| vec![r]).collect(),
    }
}

/// Expand a draw over units into the row indices it covers
pub fn expand_units(units: &[Vec<usize>], draw: &[usize]) -> Vec<usize> {
    draw.iter()
        .flat_map(|&u| units[u].iter().copied())
        .collect()
}
