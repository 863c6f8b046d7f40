//! Observer port - abstraction for training observation and data collection
//!
//! This port defines the interface for observing training events,
//! allowing composable data collection without coupling the learning loop
//! to specific output formats or metrics.

use std::sync::{Arc, Mutex, PoisonError};

use crate::{
    Result,
    grid::{Action, GridPos, Transition},
    pipeline::EpisodeSummary,
};

/// Observer trait for monitoring training
///
/// Observers can be composed to collect different kinds of data during
/// training: progress bars, JSONL export, running metrics, structured logs.
///
/// # Event Sequence
///
/// 1. `on_training_start(total_episodes)` - once at the beginning
/// 2. For each episode:
///    - `on_episode_start(episode, start)`
///    - `on_step(...)` - after every table update
///    - `on_episode_end(summary)`
/// 3. `on_training_end()` - once at the end
///
/// # Examples
///
/// ```no_run
/// use gridworld::{pipeline::EpisodeSummary, ports::Observer};
///
/// struct GoalCounter {
///     goals: usize,
/// }
///
/// impl Observer for GoalCounter {
///     fn on_episode_end(&mut self, summary: &EpisodeSummary) -> gridworld::Result<()> {
///         if summary.reached_goal {
///             self.goals += 1;
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Observer: Send {
    /// Called when training starts.
    ///
    /// # Parameters
    ///
    /// * `total_episodes` - Number of episodes that will be run
    fn on_training_start(&mut self, _total_episodes: usize) -> Result<()> {
        Ok(())
    }

    /// Called after the start state of an episode has been sampled.
    fn on_episode_start(&mut self, _episode: usize, _start: GridPos) -> Result<()> {
        Ok(())
    }

    /// Called for each step, after the Q-table has been updated.
    ///
    /// # Parameters
    ///
    /// * `episode` - Index of the current episode (0-based)
    /// * `step` - Step number within the episode (0-based)
    /// * `state` - State the action was taken in
    /// * `action` - Action selected by the exploration policy
    /// * `transition` - Environment response
    /// * `td_error` - Temporal-difference error of the update
    fn on_step(
        &mut self,
        _episode: usize,
        _step: usize,
        _state: GridPos,
        _action: Action,
        _transition: &Transition,
        _td_error: f64,
    ) -> Result<()> {
        Ok(())
    }

    /// Called when an episode ends, by reaching the goal or by the step cap.
    fn on_episode_end(&mut self, _summary: &EpisodeSummary) -> Result<()> {
        Ok(())
    }

    /// Called when training completes.
    ///
    /// Use this to finalize outputs, close files, or display summaries.
    fn on_training_end(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A shared handle lets the caller read an observer back after the pipeline
/// has taken ownership of its boxed copy.
impl<O: Observer> Observer for Arc<Mutex<O>> {
    fn on_training_start(&mut self, total_episodes: usize) -> Result<()> {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on_training_start(total_episodes)
    }

    fn on_episode_start(&mut self, episode: usize, start: GridPos) -> Result<()> {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on_episode_start(episode, start)
    }

    fn on_step(
        &mut self,
        episode: usize,
        step: usize,
        state: GridPos,
        action: Action,
        transition: &Transition,
        td_error: f64,
    ) -> Result<()> {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on_step(episode, step, state, action, transition, td_error)
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on_episode_end(summary)
    }

    fn on_training_end(&mut self) -> Result<()> {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on_training_end()
    }
}
