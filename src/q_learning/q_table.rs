//! Dense Q-table for temporal difference learning

use std::ops::Range;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::grid::{ACTION_COUNT, Action, GridPos};

/// Q-table mapping (state, action) pairs to Q-values
///
/// Values live in one flat buffer laid out row-major by cell, with the four
/// action values of a cell stored contiguously:
/// `index = row * cols * ACTION_COUNT + col * ACTION_COUNT + action`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QTable {
    rows: usize,
    cols: usize,
    q_values: Vec<f64>,
}

impl QTable {
    /// Create a Q-table with every value set to `value`
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            rows,
            cols,
            q_values: vec![value; rows * cols * ACTION_COUNT],
        }
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, 0.0)
    }

    /// Create a Q-table with values drawn uniformly from `init`
    ///
    /// An empty range (`start == end`) fills every entry with `start`.
    pub fn random_uniform<R: Rng + ?Sized>(
        rows: usize,
        cols: usize,
        init: Range<f64>,
        rng: &mut R,
    ) -> Self {
        if init.is_empty() {
            return Self::filled(rows, cols, init.start);
        }
        let q_values = (0..rows * cols * ACTION_COUNT)
            .map(|_| rng.random_range(init.clone()))
            .collect();
        Self {
            rows,
            cols,
            q_values,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The raw buffer in index order
    pub fn as_slice(&self) -> &[f64] {
        &self.q_values
    }

    fn offset(&self, state: GridPos) -> usize {
        debug_assert!(state.row < self.rows && state.col < self.cols);
        (state.row * self.cols + state.col) * ACTION_COUNT
    }

    /// Get Q-value for a state-action pair
    pub fn get(&self, state: GridPos, action: Action) -> f64 {
        self.q_values[self.offset(state) + action.index()]
    }

    /// Set Q-value for a state-action pair
    pub fn set(&mut self, state: GridPos, action: Action, value: f64) {
        let idx = self.offset(state) + action.index();
        self.q_values[idx] = value;
    }

    /// The four action values of `state`, in action order
    pub fn action_values(&self, state: GridPos) -> &[f64] {
        let start = self.offset(state);
        &self.q_values[start..start + ACTION_COUNT]
    }

    /// Maximum Q-value over all actions in a state
    pub fn max_q(&self, state: GridPos) -> f64 {
        self.action_values(state)
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Arithmetic mean of the action values in a state
    pub fn mean_q(&self, state: GridPos) -> f64 {
        self.action_values(state).iter().sum::<f64>() / ACTION_COUNT as f64
    }

    /// Select greedy action (highest Q-value)
    ///
    /// Ties resolve to the earliest action in [`Action::ALL`] order.
    pub fn greedy_action(&self, state: GridPos) -> Action {
        let values = self.action_values(state);
        let mut best = 0;
        for (idx, &value) in values.iter().enumerate().skip(1) {
            if value > values[best] {
                best = idx;
            }
        }
        Action::ALL[best]
    }

    /// Q-learning update: off-policy TD control
    ///
    /// Q(s,a) ← Q(s,a) + α[r + γ max_a' Q(s',a') - Q(s,a)]
    ///
    /// Returns the temporal-difference error the update was based on.
    pub fn q_learning_update(
        &mut self,
        state: GridPos,
        action: Action,
        reward: f64,
        next_state: GridPos,
        learning_rate: f64,
        discount_factor: f64,
    ) -> f64 {
        let current_q = self.get(state, action);
        let td_target = reward + discount_factor * self.max_q(next_state);
        let td_error = td_target - current_q;
        self.set(state, action, current_q + learning_rate * td_error);
        td_error
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn test_qtable_initialization() {
        let qtable = QTable::zeros(2, 3);
        assert_eq!(qtable.as_slice().len(), 2 * 3 * ACTION_COUNT);
        assert_eq!(qtable.get(GridPos::new(1, 2), Action::Right), 0.0);
    }

    #[test]
    fn test_random_init_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let qtable = QTable::random_uniform(4, 4, 0.0..0.1, &mut rng);
        assert!(qtable.as_slice().iter().all(|&q| (0.0..0.1).contains(&q)));
        // Distinct draws, not a constant fill
        assert!(qtable.as_slice().windows(2).any(|w| w[0] != w[1]));

        let constant = QTable::random_uniform(2, 2, 0.5..0.5, &mut rng);
        assert!(constant.as_slice().iter().all(|&q| q == 0.5));
    }

    #[test]
    fn test_flat_layout_offsets() {
        let mut qtable = QTable::zeros(2, 3);
        qtable.set(GridPos::new(1, 2), Action::Left, 4.0);
        let idx = 3 * ACTION_COUNT + 2 * ACTION_COUNT + Action::Left.index();
        assert_eq!(qtable.as_slice()[idx], 4.0);
        assert_eq!(qtable.action_values(GridPos::new(1, 2)), &[0.0, 0.0, 4.0, 0.0]);
    }

    #[test]
    fn test_max_and_mean_q() {
        let mut qtable = QTable::zeros(1, 1);
        let s = GridPos::new(0, 0);
        qtable.set(s, Action::Up, 0.5);
        qtable.set(s, Action::Down, 1.5);
        qtable.set(s, Action::Left, -0.8);
        qtable.set(s, Action::Right, 0.8);

        assert_eq!(qtable.max_q(s), 1.5);
        assert!((qtable.mean_q(s) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_greedy_action() {
        let mut qtable = QTable::zeros(1, 1);
        let s = GridPos::new(0, 0);
        qtable.set(s, Action::Left, 0.3);
        qtable.set(s, Action::Right, 0.2);
        assert_eq!(qtable.greedy_action(s), Action::Left);
    }

    #[test]
    fn test_greedy_tie_break_prefers_first_action() {
        let qtable = QTable::filled(1, 1, 0.25);
        assert_eq!(qtable.greedy_action(GridPos::new(0, 0)), Action::Up);

        let mut qtable = QTable::zeros(1, 1);
        let s = GridPos::new(0, 0);
        qtable.set(s, Action::Down, 1.0);
        qtable.set(s, Action::Right, 1.0);
        assert_eq!(qtable.greedy_action(s), Action::Down);
    }

    #[test]
    fn test_q_learning_update() {
        let mut qtable = QTable::zeros(1, 2);
        let s = GridPos::new(0, 0);
        let next = GridPos::new(0, 1);
        qtable.set(next, Action::Up, 1.0);
        qtable.set(next, Action::Left, 2.0);

        let td_error = qtable.q_learning_update(s, Action::Right, 0.0, next, 0.5, 0.99);

        // Q(s,right) = 0.0 + 0.5 * (0.0 + 0.99 * 2.0 - 0.0) = 0.99
        assert!((td_error - 1.98).abs() < 1e-12);
        assert!((qtable.get(s, Action::Right) - 0.99).abs() < 1e-12);
        // Other entries untouched
        assert_eq!(qtable.get(s, Action::Up), 0.0);
    }

    #[test]
    fn test_update_bootstraps_from_self_on_bump() {
        let mut qtable = QTable::filled(1, 1, 0.1);
        let s = GridPos::new(0, 0);

        qtable.q_learning_update(s, Action::Up, -1.0, s, 0.1, 0.9);

        // 0.1 + 0.1 * (-1.0 + 0.9 * 0.1 - 0.1) = 0.1 - 0.101
        assert!((qtable.get(s, Action::Up) - (-0.001)).abs() < 1e-12);
    }

    #[test]
    fn test_update_shrinks_td_error_on_two_state_chain() {
        // s0 --right--> s1 with fixed reward; s1 values stay constant.
        let mut qtable = QTable::zeros(1, 2);
        let s0 = GridPos::new(0, 0);
        let s1 = GridPos::new(0, 1);
        for action in Action::ALL {
            qtable.set(s1, action, 0.5);
        }

        let mut previous = f64::INFINITY;
        for _ in 0..50 {
            let td_error = qtable.q_learning_update(s0, Action::Right, 1.0, s1, 0.3, 0.9);
            assert!(td_error.abs() < previous);
            previous = td_error.abs();
        }
        assert!((qtable.get(s0, Action::Right) - 1.45).abs() < 1e-6);
    }
}
