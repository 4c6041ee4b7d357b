//! Marking simulated subjects as censored

use crate::config::CensoringPolicy;
use rand::seq::index;
use rand::Rng;

impl CensoringPolicy {
    /// Censoring indicator per subject (`true` = censored)
    ///
    /// Censored subjects keep their drawn duration as the censoring time.
    pub fn apply<R: Rng + ?Sized>(&self, durations: &[usize], censor: f64, rng: &mut R) -> Vec<bool> {
        let n = durations.len();
        let target = ((censor * n as f64).round() as usize).min(n);
        let mut censored = vec![false; n];
        match *self {
            Self::Bernoulli => {
                for flag in censored.iter_mut() {
                    *flag = rng.gen_bool(censor);
                }
            }
            Self::ExactCount => {
                for i in index::sample(rng, n, target) {
                    censored[i] = true;
                }
            }
            Self::Administrative { cutoff } => {
                let mut beyond: Vec<usize> = (0..n).filter(|&i| durations[i] > cutoff).collect();
                beyond.sort_by_key(|&i| durations[i]);
                for &i in beyond.iter().take(target) {
                    censored[i] = true;
                }
            }
        }
        censored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_exact_count() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let durations: Vec<usize> = (1..=50).collect();
        let flags = CensoringPolicy::ExactCount.apply(&durations, 0.2, &mut rng);
        assert_eq!(flags.iter().filter(|c| **c).count(), 10);
    }

    #[test]
    fn test_bernoulli_rate() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let durations = vec![5; 10_000];
        let flags = CensoringPolicy::Bernoulli.apply(&durations, 0.3, &mut rng);
        let rate = flags.iter().filter(|c| **c).count() as f64 / 10_000.0;
        assert!((rate - 0.3).abs() < 0.02);
        assert!(CensoringPolicy::Bernoulli
            .apply(&durations, 0.0, &mut rng)
            .iter()
            .all(|c| !c));
    }

    #[test]
    fn test_administrative_takes_shortest_beyond_cutoff() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let durations = vec![3, 9, 7, 12, 8, 1, 10, 15, 6, 11];
        let policy = CensoringPolicy::Administrative { cutoff: 7 };
        let flags = policy.apply(&durations, 0.3, &mut rng);
        let chosen: Vec<usize> = (0..10).filter(|&i| flags[i]).map(|i| durations[i]).collect();
        assert_eq!(chosen, vec![9, 8, 10]);

        // fewer candidates than requested
        let flags = CensoringPolicy::Administrative { cutoff: 12 }.apply(&durations, 0.5, &mut rng);
        assert_eq!(flags.iter().filter(|c| **c).count(), 1);
    }
}
