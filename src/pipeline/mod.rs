//! Training and evaluation pipeline
//!
//! This module provides:
//! - The episode/step Q-learning loop
//! - Observers that record what happens during training
//! - Greedy evaluation of a learned table

pub mod evaluation;
pub mod observers;
pub mod training;

pub use evaluation::{EvaluationReport, GreedyRollout, RolloutEnd, evaluate_greedy, greedy_rollout};
pub use observers::{JsonlObserver, MetricsObserver, MetricsSummary, ProgressObserver, TracingObserver};
pub use training::{
    EpisodeSummary, StartPolicy, TrainingConfig, TrainingOutcome, TrainingPipeline, TrainingResult,
};

pub use crate::ports::Observer;
