//! Simulate, estimate, compare against the known truth

mod common;

use approx::assert_relative_eq;
use coxed::duration::{EngineInput, NpsfEngine};
use coxed::prelude::*;
use coxed::simulate::{true_marginal_effect, SimType};
use coxed_core::sequential;

#[test]
fn test_npsf_recovers_generating_survivor() {
    common::init_tracing();
    let baseline = common::baseline(100, 8, 11);
    let data = common::simulate(&baseline, 5000, &[0.5, -0.5], 0.0, SimType::None, 12);
    let model = data.to_cox_model(data.beta()).unwrap();

    let estimated = NpsfEngine.baseline(&model, &EngineInput::new()).unwrap();
    let mut compared = 0;
    for t in 1..100 {
        let truth = baseline.survivor_at(t);
        if (0.2..=0.95).contains(&truth) {
            assert_relative_eq!(estimated.survivor_at(t as f64), truth, epsilon = 0.05);
            compared += 1;
        }
    }
    assert!(compared > 10);
}

#[test]
fn test_marginal_effect_tracks_known_effect() {
    let baseline = common::baseline(100, 8, 21);
    let data = common::simulate(&baseline, 3000, &[0.6, 0.2], 0.0, SimType::None, 22);
    let model = data.to_cox_model(data.beta()).unwrap();

    let qoi = Coxed::new(&model, QoiConfig::default()).unwrap();
    let estimated = qoi.covariate_effect(None, 0, -0.5, 0.5).unwrap();

    let x0 = model.covariates().map_with_location(|_, c, v| if c == 0 { -0.5 } else { v });
    let x1 = model.covariates().map_with_location(|_, c, v| if c == 0 { 0.5 } else { v });
    let truth = true_marginal_effect(&baseline, &data.beta(), &x0, &x1).unwrap();

    assert!(truth.mean < 0.0);
    assert_relative_eq!(estimated.mean.estimate, truth.mean, max_relative = 0.15);
}

#[test]
fn test_tvc_pipeline_with_bootstrap() {
    let baseline = common::baseline(40, 4, 31);
    let data = common::simulate(&baseline, 200, &[0.7], 0.1, SimType::Tvc, 32);
    let model = data.to_cox_model(data.beta()).unwrap();

    let config = QoiConfig::default().with_bootstrap(30).with_seed(3);
    let qoi = Coxed::new(&model, config).unwrap().with_execution(sequential());
    let result = qoi.expected_durations(None).unwrap();

    assert_eq!(result.estimates.len(), 200);
    assert_eq!(result.n_failed, 0);
    let ci = result.mean.interval.unwrap();
    assert!(ci.contains(result.mean.estimate));
    assert!(result.estimates.iter().all(|e| e.estimate > 0.0 && e.estimate <= 40.0));
}
