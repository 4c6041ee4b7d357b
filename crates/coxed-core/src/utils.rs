//! Utility functions for working with data slices

/// Sort data and return a new vector
///
/// Handles NaN values by placing them at the end.
///
/// # Examples
///
/// ```rust
/// use coxed_core::utils::sorted;
///
/// let data = vec![3.0, 1.0, 5.0, 2.0, 4.0];
/// assert_eq!(sorted(&data), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
/// ```
pub fn sorted(data: &[f64]) -> Vec<f64> {
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Calculate the sample standard deviation
///
/// Returns 0.0 for slices with less than 2 elements.
///
/// # Examples
///
/// ```rust
/// use coxed_core::utils::std_dev;
///
/// let data = [1.0, 2.0, 3.0, 4.0, 5.0];
/// let sd = std_dev(&data);
/// assert!((sd - 1.58113883).abs() < 1e-6);
/// ```
pub fn std_dev(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let m = mean(data);
    let variance: f64 = data
        .iter()
        .map(|&x| {
            let diff = x - m;
            diff * diff
        })
        .sum::<f64>()
        / (data.len() - 1) as f64;
    variance.sqrt()
}

/// Calculate the mean of a slice
///
/// Returns 0.0 for empty slices.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let sum: f64 = data.iter().sum();
    sum / data.len() as f64
}

/// Sample quantile with linear interpolation between order statistics
///
/// This is the "type 7" definition: `h = (n - 1) p`, interpolating between
/// `x[floor(h)]` and `x[ceil(h)]`. Returns NaN for empty input.
///
/// # Examples
///
/// ```rust
/// use coxed_core::utils::quantile;
///
/// assert_eq!(quantile(&[4.0, 1.0, 3.0, 2.0], 0.5), 2.5);
/// ```
pub fn quantile(data: &[f64], p: f64) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    quantile_sorted(&sorted(data), p)
}

/// Type 7 quantile of already sorted data
pub fn quantile_sorted(sorted_data: &[f64], p: f64) -> f64 {
    if sorted_data.is_empty() {
        return f64::NAN;
    }
    let p = p.clamp(0.0, 1.0);
    let h = (sorted_data.len() - 1) as f64 * p;
    let lower = h.floor() as usize;
    let upper = h.ceil() as usize;
    if lower == upper {
        sorted_data[lower]
    } else {
        let fraction = h - lower as f64;
        sorted_data[lower] + (sorted_data[upper] - sorted_data[lower]) * fraction
    }
}

/// Median of a slice (NaN when empty)
pub fn median(data: &[f64]) -> f64 {
    quantile(data, 0.5)
}

/// Pearson correlation of two equally long slices
///
/// Returns NaN when either side has zero variance or the lengths differ.
pub fn correlation(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.len() < 2 {
        return f64::NAN;
    }
    let mx = mean(x);
    let my = mean(y);
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (&a, &b) in x.iter().zip(y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx) * (a - mx);
        syy += (b - my) * (b - my);
    }
    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    sxy / (sxx * syy).sqrt()
}

/// Ordinal ranks (1-based) in ascending order, ties broken by position
///
/// # Examples
///
/// ```rust
/// use coxed_core::utils::ordinal_ranks;
///
/// assert_eq!(ordinal_ranks(&[0.3, -1.0, 0.3, 2.0]), vec![2, 1, 3, 4]);
/// ```
pub fn ordinal_ranks(data: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..data.len()).collect();
    // sort_by is stable, so equal values keep their original order
    order.sort_by(|&a, &b| data[a].total_cmp(&data[b]));
    let mut ranks = vec![0; data.len()];
    for (rank, &idx) in order.iter().enumerate() {
        ranks[idx] = rank + 1;
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_basic() {
        let data = vec![3.0, 1.0, 5.0, 2.0, 4.0];
        assert_eq!(sorted(&data), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(sorted(&[]), Vec::<f64>::new());
    }

    #[test]
    fn test_sorted_with_nan() {
        let data = vec![3.0, f64::NAN, 1.0, 2.0];
        let sorted_data = sorted(&data);
        assert_eq!(&sorted_data[..3], &[1.0, 2.0, 3.0]);
        assert!(sorted_data[3].is_nan());
    }

    #[test]
    fn test_mean_and_std_dev() {
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
        assert_eq!(mean(&[]), 0.0);
        assert!((std_dev(&[1.0, 2.0, 3.0, 4.0, 5.0]) - 1.58113883).abs() < 1e-8);
        assert_eq!(std_dev(&[42.0]), 0.0);
        assert_eq!(std_dev(&[5.0, 5.0, 5.0]), 0.0);
    }

    #[test]
    fn test_quantile_type7() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        assert_eq!(quantile(&data, 0.0), 1.0);
        assert_eq!(quantile(&data, 1.0), 10.0);
        assert!((quantile(&data, 0.5) - 5.5).abs() < 1e-12);
        // h = 9 * 0.025 = 0.225
        assert!((quantile(&data, 0.025) - 1.225).abs() < 1e-12);
        assert!((quantile(&data, 0.975) - 9.775).abs() < 1e-12);
        assert!(quantile(&[], 0.5).is_nan());
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
    }

    #[test]
    fn test_correlation() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert!((correlation(&x, &[2.0, 4.0, 6.0, 8.0]) - 1.0).abs() < 1e-12);
        assert!((correlation(&x, &[8.0, 6.0, 4.0, 2.0]) + 1.0).abs() < 1e-12);
        assert!(correlation(&x, &[1.0, 1.0, 1.0, 1.0]).is_nan());
        assert!(correlation(&x, &[1.0]).is_nan());
    }

    #[test]
    fn test_ordinal_ranks_ties_stable() {
        assert_eq!(ordinal_ranks(&[5.0, 5.0, 5.0]), vec![1, 2, 3]);
        assert_eq!(ordinal_ranks(&[]), Vec::<usize>::new());
    }

    mod properties {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_ranks_are_a_permutation(data in prop::collection::vec(-1e6f64..1e6, 0..60)) {
                let mut ranks = ordinal_ranks(&data);
                ranks.sort_unstable();
                prop_assert_eq!(ranks, (1..=data.len()).collect::<Vec<_>>());
            }

            #[test]
            fn prop_quantiles_are_monotone(
                data in prop::collection::vec(-1e3f64..1e3, 1..40),
                p in 0.0f64..1.0,
                q in 0.0f64..1.0,
            ) {
                let (lo, hi) = if p <= q { (p, q) } else { (q, p) };
                prop_assert!(quantile(&data, lo) <= quantile(&data, hi));
                let s = sorted(&data);
                prop_assert!(quantile(&data, lo) >= s[0] && quantile(&data, hi) <= s[s.len() - 1]);
            }
        }
    }
}
