//! Observer pattern for training pipelines
//!
//! Observers allow composable data collection during training without coupling
//! the learning loop to specific output formats.

use std::{
    collections::VecDeque,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::training::EpisodeSummary;
use crate::{
    Result,
    grid::{Action, GridPos, Transition},
    ports::Observer,
};

/// Progress bar observer - Shows training progress
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    successes: usize,
    episodes: usize,
}

impl ProgressObserver {
    /// Create a new progress observer
    pub fn new() -> Self {
        Self {
            progress_bar: None,
            successes: 0,
            episodes: 0,
        }
    }

    fn message(&self) -> String {
        let rate = if self.episodes == 0 {
            0.0
        } else {
            100.0 * self.successes as f64 / self.episodes as f64
        };
        format!("{rate:.1}% to goal")
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for ProgressObserver {
    fn on_training_start(&mut self, total_episodes: usize) -> Result<()> {
        let pb = ProgressBar::new(total_episodes as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} episodes ({msg})")
                .map_err(|e| crate::Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        self.episodes += 1;
        if summary.reached_goal {
            self.successes += 1;
        }

        if let Some(pb) = &self.progress_bar {
            pb.set_position(self.episodes as u64);
            if self.episodes.is_multiple_of(100) {
                pb.set_message(self.message());
            }
        }
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message(self.message());
        }
        Ok(())
    }
}

/// Summary of training metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total_episodes: usize,
    pub successes: usize,
    pub success_rate: f64,
    pub recent_success_rate: f64,
    pub avg_episode_length: f64,
    pub avg_return: f64,
    pub boundary_bumps: usize,
}

/// Metrics observer - Tracks training metrics
pub struct MetricsObserver {
    window: usize,
    total_episodes: usize,
    successes: usize,
    total_steps: usize,
    total_return: f64,
    boundary_bumps: usize,
    recent: VecDeque<bool>,
}

impl MetricsObserver {
    /// Create a new metrics observer with a 100-episode recent window
    pub fn new() -> Self {
        Self::with_window(100)
    }

    pub fn with_window(window: usize) -> Self {
        Self {
            window: window.max(1),
            total_episodes: 0,
            successes: 0,
            total_steps: 0,
            total_return: 0.0,
            boundary_bumps: 0,
            recent: VecDeque::new(),
        }
    }

    /// Fraction of all episodes that reached the goal
    pub fn success_rate(&self) -> f64 {
        if self.total_episodes == 0 {
            0.0
        } else {
            self.successes as f64 / self.total_episodes as f64
        }
    }

    /// Fraction of the most recent `window` episodes that reached the goal
    pub fn recent_success_rate(&self) -> f64 {
        if self.recent.is_empty() {
            0.0
        } else {
            self.recent.iter().filter(|&&hit| hit).count() as f64 / self.recent.len() as f64
        }
    }

    /// Get average episode length
    pub fn avg_episode_length(&self) -> f64 {
        if self.total_episodes == 0 {
            0.0
        } else {
            self.total_steps as f64 / self.total_episodes as f64
        }
    }

    pub fn avg_return(&self) -> f64 {
        if self.total_episodes == 0 {
            0.0
        } else {
            self.total_return / self.total_episodes as f64
        }
    }

    /// Get metrics summary
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_episodes: self.total_episodes,
            successes: self.successes,
            success_rate: self.success_rate(),
            recent_success_rate: self.recent_success_rate(),
            avg_episode_length: self.avg_episode_length(),
            avg_return: self.avg_return(),
            boundary_bumps: self.boundary_bumps,
        }
    }
}

impl Default for MetricsObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for MetricsObserver {
    fn on_step(
        &mut self,
        _episode: usize,
        _step: usize,
        _state: GridPos,
        _action: Action,
        transition: &Transition,
        _td_error: f64,
    ) -> Result<()> {
        if transition.outcome.is_bump() {
            self.boundary_bumps += 1;
        }
        Ok(())
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        self.total_episodes += 1;
        self.total_steps += summary.steps;
        self.total_return += summary.total_reward;
        if summary.reached_goal {
            self.successes += 1;
        }
        self.recent.push_back(summary.reached_goal);
        if self.recent.len() > self.window {
            self.recent.pop_front();
        }
        Ok(())
    }
}

/// JSONL observer - Writes one episode summary per line
pub struct JsonlObserver {
    writer: BufWriter<File>,
}

impl JsonlObserver {
    /// Create a new JSONL observer
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        Ok(Self { writer })
    }
}

impl Observer for JsonlObserver {
    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        serde_json::to_writer(&mut self.writer, summary)?;
        writeln!(&mut self.writer)?;
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Tracing observer - Emits an `info` event every `interval` episodes
pub struct TracingObserver {
    interval: usize,
    total_episodes: usize,
    window_episodes: usize,
    successes: usize,
    steps: usize,
}

impl TracingObserver {
    /// Log every `interval` episodes; 0 is treated as 1
    pub fn new(interval: usize) -> Self {
        Self {
            interval: interval.max(1),
            total_episodes: 0,
            window_episodes: 0,
            successes: 0,
            steps: 0,
        }
    }
}

impl Observer for TracingObserver {
    fn on_training_start(&mut self, total_episodes: usize) -> Result<()> {
        self.total_episodes = total_episodes;
        self.window_episodes = 0;
        self.successes = 0;
        self.steps = 0;
        Ok(())
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        self.window_episodes += 1;
        if summary.reached_goal {
            self.successes += 1;
        }
        self.steps += summary.steps;

        let done = summary.episode + 1;
        if done.is_multiple_of(self.interval) || done == self.total_episodes {
            let window = self.window_episodes as f64;
            info!(
                episode = done,
                total = self.total_episodes,
                success_rate = self.successes as f64 / window,
                avg_steps = self.steps as f64 / window,
                epsilon = summary.epsilon,
                mean_abs_td_error = summary.mean_abs_td_error,
                "training progress"
            );
            self.window_episodes = 0;
            self.successes = 0;
            self.steps = 0;
        }
        Ok(())
    }
}
