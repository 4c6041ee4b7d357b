//! Property-based tests for baseline construction

use coxed_baseline::*;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

proptest! {
    // Property: every drawn baseline is a proper survivor curve
    #[test]
    fn prop_simulated_baseline_is_monotone(
        seed in any::<u64>(),
        horizon in 2usize..200,
        knot_fraction in 0.0f64..1.0,
        linear in any::<bool>(),
    ) {
        let knots = 1 + ((horizon - 2) as f64 * knot_fraction) as usize;
        let interpolation = if linear { Interpolation::Linear } else { Interpolation::MonotoneSpline };
        let baseline = BaselineBuilder::new(horizon, knots)
            .unwrap()
            .with_interpolation(interpolation)
            .build(&mut ChaCha8Rng::seed_from_u64(seed))
            .unwrap();

        prop_assert_eq!(baseline.survivor().len(), horizon);
        for pair in baseline.survivor().windows(2) {
            prop_assert!(pair[1] <= pair[0]);
        }
        for (s, h) in baseline.survivor().iter().zip(baseline.cumulative_hazard()) {
            prop_assert_eq!(*s, (-h).exp());
        }
        prop_assert_eq!(baseline.survivor_at(horizon), 0.0);
    }

    // Property: the step baseline ignores the order rows arrive in
    #[test]
    fn prop_step_baseline_row_order(
        rows in prop::collection::vec((1u32..30, any::<bool>()), 2..40),
        rotation in 0usize..40,
    ) {
        let times: Vec<f64> = rows.iter().map(|r| r.0 as f64).collect();
        let events: Vec<bool> = rows.iter().map(|r| r.1).collect();
        let exposure = vec![1.0; rows.len()];

        let mut shifted_times = times.clone();
        let mut shifted_events = events.clone();
        let k = rotation % rows.len();
        shifted_times.rotate_left(k);
        shifted_events.rotate_left(k);

        let a = BaselineFunctions::from_risk_sets(
            &RiskSetTable::from_observations(&times, &events, &exposure).unwrap(),
        )
        .unwrap();
        let b = BaselineFunctions::from_risk_sets(
            &RiskSetTable::from_observations(&shifted_times, &shifted_events, &exposure).unwrap(),
        )
        .unwrap();
        prop_assert_eq!(a, b);
    }
}

#[test]
fn test_three_failures_out_of_ten() {
    // ten subjects at risk, three fail at t = 1, the rest are censored later
    let mut times = vec![1.0; 3];
    times.extend(std::iter::repeat(2.0).take(7));
    let mut events = vec![true; 3];
    events.extend(std::iter::repeat(false).take(7));

    let table = RiskSetTable::from_observations(&times, &events, &[1.0; 10]).unwrap();
    assert_eq!(table.rows()[0].failures, 3);
    assert_eq!(table.rows()[0].risk_set, 10.0);

    let baseline = BaselineFunctions::from_risk_sets(&table).unwrap();
    approx::assert_relative_eq!(baseline.cumulative_hazard_at(1.0), 0.3);
    approx::assert_relative_eq!(baseline.survivor_at(1.0), (-0.3f64).exp());
    approx::assert_relative_eq!(baseline.survivor_at(1.0), 0.7408, epsilon = 1e-4);
}
