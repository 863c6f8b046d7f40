//! Common test utilities for the gridworld test suite.

#![allow(dead_code)]

use gridworld::{
    grid::{BuiltinLayout, GridEnvironment, GridLayout, Rewards},
    pipeline::{TrainingConfig, TrainingOutcome, TrainingPipeline},
};
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Environment over a built-in layout with the default rewards.
pub fn builtin_env(layout: BuiltinLayout) -> GridEnvironment {
    GridEnvironment::new(layout.layout(), Rewards::default())
}

/// Environment over integer cell codes.
pub fn env_from_codes<R: AsRef<[i32]>>(codes: &[R]) -> GridEnvironment {
    let layout = GridLayout::from_codes(codes).expect("test layout should be valid");
    GridEnvironment::new(layout, Rewards::default())
}

/// Run a pipeline with no observers.
pub fn train(env: &GridEnvironment, config: TrainingConfig) -> TrainingOutcome {
    TrainingPipeline::new(config)
        .run(env)
        .expect("training should succeed")
}

/// Pearson chi-squared test of `counts` against a uniform distribution.
///
/// # Returns
///
/// `true` when uniformity is not rejected at significance `alpha`.
pub fn is_uniform(counts: &[usize], alpha: f64) -> bool {
    let total: usize = counts.iter().sum();
    let expected = total as f64 / counts.len() as f64;
    let statistic: f64 = counts
        .iter()
        .map(|&observed| {
            let diff = observed as f64 - expected;
            diff * diff / expected
        })
        .sum();

    let dist = ChiSquared::new((counts.len() - 1) as f64).expect("valid degrees of freedom");
    statistic <= dist.inverse_cdf(1.0 - alpha)
}
