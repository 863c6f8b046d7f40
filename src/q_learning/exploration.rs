//! ε-greedy exploration

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::q_table::QTable;
use crate::grid::{ACTION_COUNT, Action, GridPos};

/// ε-greedy action selection
///
/// With probability `epsilon` returns a uniformly random action, otherwise the
/// greedy action of `table` at `state`. One uniform draw decides the branch; the
/// explore branch makes a second draw for the action.
pub fn select_action<R: Rng + ?Sized>(
    state: GridPos,
    table: &QTable,
    epsilon: f64,
    rng: &mut R,
) -> Action {
    if rng.random::<f64>() < epsilon {
        Action::ALL[rng.random_range(0..ACTION_COUNT)]
    } else {
        table.greedy_action(state)
    }
}

/// Exploration schedule with per-episode multiplicative decay
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpsilonGreedy {
    epsilon: f64,
    epsilon_decay: f64,
    min_epsilon: f64,
}

impl EpsilonGreedy {
    /// Constant exploration rate
    pub fn new(epsilon: f64) -> Self {
        Self::with_decay(epsilon, 1.0, 0.0)
    }

    pub fn with_decay(epsilon: f64, epsilon_decay: f64, min_epsilon: f64) -> Self {
        Self {
            epsilon,
            epsilon_decay,
            min_epsilon,
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn select_action<R: Rng + ?Sized>(
        &self,
        state: GridPos,
        table: &QTable,
        rng: &mut R,
    ) -> Action {
        select_action(state, table, self.epsilon, rng)
    }

    /// Decay epsilon after episode
    pub fn decay(&mut self) {
        self.epsilon = (self.epsilon * self.epsilon_decay).max(self.min_epsilon);
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn test_zero_epsilon_is_greedy() {
        let mut table = QTable::zeros(1, 1);
        let s = GridPos::new(0, 0);
        table.set(s, Action::Left, 0.7);

        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            assert_eq!(select_action(s, &table, 0.0, &mut rng), Action::Left);
        }
    }

    #[test]
    fn test_full_epsilon_reaches_every_action() {
        let table = QTable::zeros(1, 1);
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = [false; ACTION_COUNT];
        for _ in 0..200 {
            seen[select_action(GridPos::new(0, 0), &table, 1.0, &mut rng).index()] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_decay_respects_floor() {
        let mut policy = EpsilonGreedy::with_decay(0.5, 0.5, 0.1);
        policy.decay();
        assert!((policy.epsilon() - 0.25).abs() < 1e-12);
        policy.decay();
        policy.decay();
        assert_eq!(policy.epsilon(), 0.1);
    }

    #[test]
    fn test_constant_schedule_never_changes() {
        let mut policy = EpsilonGreedy::new(0.1);
        for _ in 0..10 {
            policy.decay();
        }
        assert_eq!(policy.epsilon(), 0.1);
    }
}
