//! Tabular Q-learning on grid worlds
//!
//! This crate provides:
//! - Grid layouts with free, forbidden and goal cells, plus a deterministic
//!   transition and reward model
//! - A dense Q-table with the off-policy Q-learning update and ε-greedy exploration
//! - An episode/step training pipeline with pluggable observers
//! - Greedy policy and state-value extraction, evaluation and CSV export
//! - A command-line front end (`gridworld train`, `gridworld show`)

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod grid;
pub mod pipeline;
pub mod ports;
pub mod q_learning;

pub use config::ExperimentConfig;
pub use error::{Error, Result};
pub use grid::{Action, BuiltinLayout, CellKind, GridEnvironment, GridLayout, GridPos, Rewards};
pub use pipeline::{TrainingConfig, TrainingPipeline, TrainingResult};
pub use q_learning::{QLearningAgent, QTable, extract_policy, extract_state_values};
