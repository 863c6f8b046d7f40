//! Deterministic transition and reward model

use serde::{Deserialize, Serialize};

use super::{
    action::Action,
    layout::{CellKind, GridLayout, GridPos},
};
use crate::{Error, Result};

/// Reward constants
///
/// Bumping into the grid edge and bumping into a forbidden cell share the
/// single `boundary` penalty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rewards {
    /// Penalty for leaving the grid or entering a forbidden cell
    pub boundary: f64,
    /// Reward for entering a goal cell
    pub goal: f64,
}

impl Default for Rewards {
    fn default() -> Self {
        Self {
            boundary: -1.0,
            goal: 1.0,
        }
    }
}

impl Rewards {
    pub fn validate(&self) -> Result<()> {
        if !self.boundary.is_finite() || self.boundary >= 0.0 {
            return Err(Error::config("rewards.boundary must be a negative number"));
        }
        if !self.goal.is_finite() || self.goal <= 0.0 {
            return Err(Error::config("rewards.goal must be a positive number"));
        }
        Ok(())
    }
}

/// What happened on a single transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Moved,
    HitBoundary,
    HitForbidden,
    ReachedGoal,
}

impl StepOutcome {
    /// Whether the agent stayed in place
    pub fn is_bump(self) -> bool {
        matches!(self, StepOutcome::HitBoundary | StepOutcome::HitForbidden)
    }
}

/// Result of applying an action in a state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub next_state: GridPos,
    pub reward: f64,
    pub outcome: StepOutcome,
}

/// Grid environment: a layout plus its reward constants
#[derive(Debug, Clone)]
pub struct GridEnvironment {
    layout: GridLayout,
    rewards: Rewards,
}

impl GridEnvironment {
    pub fn new(layout: GridLayout, rewards: Rewards) -> Self {
        Self { layout, rewards }
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn rewards(&self) -> &Rewards {
        &self.rewards
    }

    /// Apply `action` in `state`
    ///
    /// Moves off the grid and moves onto forbidden cells leave the agent where
    /// it was and pay the boundary penalty. Any other move succeeds and pays the
    /// reward of the cell entered.
    pub fn transition(&self, state: GridPos, action: Action) -> Transition {
        let bump = |outcome| Transition {
            next_state: state,
            reward: self.rewards.boundary,
            outcome,
        };

        let (dr, dc) = action.delta();
        let candidate = match (
            state.row.checked_add_signed(dr),
            state.col.checked_add_signed(dc),
        ) {
            (Some(row), Some(col)) => GridPos::new(row, col),
            _ => return bump(StepOutcome::HitBoundary),
        };

        match self.layout.cell(candidate) {
            None => bump(StepOutcome::HitBoundary),
            Some(CellKind::Forbidden) => bump(StepOutcome::HitForbidden),
            Some(CellKind::Free) => Transition {
                next_state: candidate,
                reward: 0.0,
                outcome: StepOutcome::Moved,
            },
            Some(CellKind::Goal) => Transition {
                next_state: candidate,
                reward: self.rewards.goal,
                outcome: StepOutcome::ReachedGoal,
            },
        }
    }

    /// Whether `reward` is the terminal goal reward
    pub fn is_goal_reward(&self, reward: f64) -> bool {
        reward == self.rewards.goal
    }
}
