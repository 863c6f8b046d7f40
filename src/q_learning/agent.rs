//! Q-learning agent
//!
//! The agent owns the Q-table, the exploration schedule and the random number
//! generator, so a seeded agent replays a training run exactly.

use rand::{Rng, SeedableRng, rngs::StdRng};

use super::{exploration::EpsilonGreedy, q_table::QTable};
use crate::{
    Error, Result,
    grid::{Action, GridLayout, GridPos, Transition},
    pipeline::TrainingConfig,
};

fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}

/// Q-learning agent (off-policy TD control)
///
/// Learns the optimal Q* function by always updating toward the maximum
/// next-state value, regardless of the action the exploration policy takes
/// next.
#[derive(Debug, Clone)]
pub struct QLearningAgent {
    q_table: QTable,
    exploration: EpsilonGreedy,
    learning_rate: f64,
    discount_factor: f64,
    rng: StdRng,
    rng_seed: Option<u64>,
}

impl QLearningAgent {
    /// Create an agent for `layout` from a validated training configuration
    ///
    /// The Q-table is initialised from `config.q_init` using the agent's own
    /// generator, so the seed covers initialisation as well as exploration.
    pub fn new(layout: &GridLayout, config: &TrainingConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = build_rng(config.seed);
        let q_table = QTable::random_uniform(
            layout.rows(),
            layout.cols(),
            config.q_init_low..config.q_init_high,
            &mut rng,
        );
        Ok(Self {
            q_table,
            exploration: EpsilonGreedy::with_decay(
                config.epsilon,
                config.epsilon_decay,
                config.min_epsilon,
            ),
            learning_rate: config.learning_rate,
            discount_factor: config.discount_factor,
            rng,
            rng_seed: config.seed,
        })
    }

    /// Replace the Q-table, keeping hyperparameters and generator
    #[cfg(test)]
    fn with_table(mut self, q_table: QTable) -> Result<Self> {
        if (q_table.rows(), q_table.cols()) != (self.q_table.rows(), self.q_table.cols()) {
            return Err(Error::config(format!(
                "Q-table is {}x{} but the layout is {}x{}",
                q_table.rows(),
                q_table.cols(),
                self.q_table.rows(),
                self.q_table.cols()
            )));
        }
        self.q_table = q_table;
        Ok(self)
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    pub fn into_q_table(self) -> QTable {
        self.q_table
    }

    pub fn epsilon(&self) -> f64 {
        self.exploration.epsilon()
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn discount_factor(&self) -> f64 {
        self.discount_factor
    }

    pub fn rng_seed(&self) -> Option<u64> {
        self.rng_seed
    }

    /// ε-greedy action selection
    pub fn select_action(&mut self, state: GridPos) -> Action {
        self.exploration
            .select_action(state, &self.q_table, &mut self.rng)
    }

    /// Apply the Q-learning update for one observed transition
    ///
    /// Returns the temporal-difference error.
    pub fn learn(&mut self, state: GridPos, action: Action, transition: &Transition) -> f64 {
        self.q_table.q_learning_update(
            state,
            action,
            transition.reward,
            transition.next_state,
            self.learning_rate,
            self.discount_factor,
        )
    }

    /// Draw a start state uniformly from `candidates`
    pub fn sample_start(&mut self, candidates: &[GridPos]) -> Result<GridPos> {
        if candidates.is_empty() {
            return Err(Error::NoFreeCells);
        }
        Ok(candidates[self.rng.random_range(0..candidates.len())])
    }

    /// Decay epsilon after episode
    pub fn end_episode(&mut self) {
        self.exploration.decay();
    }
}
