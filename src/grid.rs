//! Gridworld layout, actions and transition model

pub mod action;
pub mod environment;
pub mod layout;

pub use action::{ACTION_COUNT, Action};
pub use environment::{GridEnvironment, Rewards, StepOutcome, Transition};
pub use layout::{BuiltinLayout, CellKind, GridLayout, GridPos};
