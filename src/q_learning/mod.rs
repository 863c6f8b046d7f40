//! Tabular Q-learning
//!
//! Q-learning is off-policy temporal difference (TD) control: each step moves
//! Q(s,a) toward `r + γ max_a' Q(s',a')`, independent of which action the
//! behaviour policy will actually take next.
//!
//! ## Pieces
//!
//! - [`QTable`]: dense (row, col, action) -> value table and the update rule
//! - [`EpsilonGreedy`]: exploration with optional per-episode decay
//! - [`QLearningAgent`]: owns table, schedule and RNG for one training run
//! - [`extract_policy`] / [`extract_state_values`]: read-only views of the result
//!
//! ## Usage Example
//!
//! ```no_run
//! use gridworld::{
//!     grid::{BuiltinLayout, GridEnvironment, Rewards},
//!     pipeline::{TrainingConfig, TrainingPipeline},
//!     q_learning::extract_policy,
//! };
//!
//! let env = GridEnvironment::new(BuiltinLayout::Walls.layout(), Rewards::default());
//! let config = TrainingConfig::default().with_episodes(5_000).with_seed(7);
//! let outcome = TrainingPipeline::new(config).run(&env)?;
//! println!("{}", extract_policy(outcome.agent.q_table(), env.layout()));
//! # Ok::<(), gridworld::Error>(())
//! ```

pub mod agent;
pub mod exploration;
pub mod extract;
pub mod q_table;

// Public re-exports
pub use agent::QLearningAgent;
pub use exploration::{EpsilonGreedy, select_action};
pub use extract::{PolicyMap, StateValueMap, extract_policy, extract_state_values};
pub use q_table::QTable;
