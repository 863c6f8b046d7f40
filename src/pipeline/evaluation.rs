//! Greedy policy evaluation
//!
//! Follows the greedy policy from every free cell without learning or
//! randomness, and reports which starts reach a goal.

use std::collections::HashSet;

use serde::Serialize;

use crate::{
    grid::{GridEnvironment, GridPos},
    q_learning::QTable,
};

/// Why a greedy rollout stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RolloutEnd {
    ReachedGoal,
    /// Revisited a state; a deterministic policy will loop forever
    Cycle,
    StepLimit,
}

/// One greedy rollout from a single start
#[derive(Debug, Clone, Serialize)]
pub struct GreedyRollout {
    pub start: GridPos,
    pub end: RolloutEnd,
    pub steps: usize,
    /// Visited states, starting with `start`
    pub path: Vec<GridPos>,
}

impl GreedyRollout {
    pub fn reached_goal(&self) -> bool {
        self.end == RolloutEnd::ReachedGoal
    }
}

/// Greedy evaluation over all free cells
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub rollouts: Vec<GreedyRollout>,
    pub success_rate: f64,
    /// Mean path length over the successful rollouts
    pub mean_steps_to_goal: Option<f64>,
}

impl EvaluationReport {
    pub fn failures(&self) -> impl Iterator<Item = &GreedyRollout> {
        self.rollouts.iter().filter(|r| !r.reached_goal())
    }
}

/// Follow the greedy policy of `table` from `start` for at most `max_steps`
pub fn greedy_rollout(
    env: &GridEnvironment,
    table: &QTable,
    start: GridPos,
    max_steps: usize,
) -> GreedyRollout {
    let mut state = start;
    let mut path = vec![start];
    let mut seen = HashSet::from([start]);

    for step in 0..max_steps {
        let transition = env.transition(state, table.greedy_action(state));
        state = transition.next_state;
        path.push(state);

        if env.is_goal_reward(transition.reward) {
            return GreedyRollout {
                start,
                end: RolloutEnd::ReachedGoal,
                steps: step + 1,
                path,
            };
        }
        if !seen.insert(state) {
            return GreedyRollout {
                start,
                end: RolloutEnd::Cycle,
                steps: step + 1,
                path,
            };
        }
    }

    GreedyRollout {
        start,
        end: RolloutEnd::StepLimit,
        steps: max_steps,
        path,
    }
}

/// Run [`greedy_rollout`] from every free cell
pub fn evaluate_greedy(env: &GridEnvironment, table: &QTable, max_steps: usize) -> EvaluationReport {
    let rollouts: Vec<GreedyRollout> = env
        .layout()
        .free_cells()
        .iter()
        .map(|&start| greedy_rollout(env, table, start, max_steps))
        .collect();

    let successes: Vec<&GreedyRollout> = rollouts.iter().filter(|r| r.reached_goal()).collect();
    let success_rate = successes.len() as f64 / rollouts.len().max(1) as f64;
    let mean_steps_to_goal = (!successes.is_empty()).then(|| {
        successes.iter().map(|r| r.steps as f64).sum::<f64>() / successes.len() as f64
    });

    EvaluationReport {
        rollouts,
        success_rate,
        mean_steps_to_goal,
    }
}
