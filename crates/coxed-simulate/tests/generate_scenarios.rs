//! End-to-end simulation scenarios

use coxed_baseline::BaselineBuilder;
use coxed_simulate::*;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[test]
fn test_horizon_100_eight_knots_all_modes() {
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let baseline = BaselineBuilder::new(100, 8).unwrap().build(&mut rng).unwrap();

    for sim_type in [SimType::None, SimType::Tvc, SimType::Tvbeta] {
        let config = SimulationConfig {
            n: 1000,
            xvars: 5,
            censor: 0.1,
            sim_type,
            ..Default::default()
        };
        let data = DurationSimulator::new(config)
            .unwrap()
            .generate(&baseline, &mut rng)
            .unwrap();

        assert_eq!(data.n(), 1000);
        match sim_type {
            SimType::Tvc => {
                assert!(data.is_tvc());
                assert!(data.n_rows() >= 1000);
            }
            _ => assert_eq!(data.n_rows(), 1000),
        }
        let censored = data.n_censored() as f64;
        assert!((censored - 100.0).abs() < 40.0, "{sim_type:?}: {censored}");
        assert!(data.durations.iter().all(|d| (1..=100).contains(d)));
        assert_eq!(data.survivor.shape(), (1000, 100));
    }
}

#[test]
fn test_tvc_data_becomes_counting_process_model() {
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let baseline = BaselineBuilder::new(30, 4).unwrap().build(&mut rng).unwrap();
    let config = SimulationConfig {
        n: 50,
        xvars: 2,
        sim_type: SimType::Tvc,
        ..Default::default()
    };
    let data = DurationSimulator::new(config)
        .unwrap()
        .generate(&baseline, &mut rng)
        .unwrap();
    let model = data.to_cox_model(data.beta()).unwrap();

    use coxed_core::FittedModel;
    assert!(model.is_counting_process());
    assert_eq!(model.n_obs(), data.n_rows());
    assert_eq!(model.ids().map(|ids| ids[ids.len() - 1]), Some(49));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    // Property: every censoring policy respects the requested proportion bounds
    #[test]
    fn prop_censoring_count_bounded(
        censor in 0.0f64..0.9,
        cutoff in 1usize..20,
        seed in any::<u64>(),
    ) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let baseline = BaselineBuilder::new(20, 3).unwrap().build(&mut rng).unwrap();
        for policy in [CensoringPolicy::ExactCount, CensoringPolicy::Administrative { cutoff }] {
            let config = SimulationConfig {
                n: 60,
                xvars: 1,
                censor,
                censoring: policy,
                ..Default::default()
            };
            let data = DurationSimulator::new(config).unwrap().generate(&baseline, &mut rng).unwrap();
            let target = (censor * 60.0).round() as usize;
            match policy {
                CensoringPolicy::ExactCount => prop_assert_eq!(data.n_censored(), target),
                _ => prop_assert!(data.n_censored() <= target),
            }
            prop_assert!(data.durations.iter().all(|d| (1..=20).contains(d)));
        }
    }
}
