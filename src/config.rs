//! Experiment configuration files
//!
//! An experiment file is JSON holding the layout (rows of integer cell codes),
//! the training hyperparameters and the reward constants:
//!
//! ```json
//! {
//!   "layout": [[0, 0, 0], [0, -1, 0], [0, 0, 1]],
//!   "training": { "num_episodes": 2000, "epsilon": 0.2, "seed": 7 },
//!   "rewards": { "boundary": -1.0, "goal": 1.0 }
//! }
//! ```
//!
//! Missing `training` or `rewards` fields take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    grid::{BuiltinLayout, GridEnvironment, GridLayout, Rewards},
    pipeline::TrainingConfig,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub layout: GridLayout,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub rewards: Rewards,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            layout: BuiltinLayout::default().layout(),
            training: TrainingConfig::default(),
            rewards: Rewards::default(),
        }
    }
}

impl ExperimentConfig {
    pub fn new(layout: GridLayout) -> Self {
        Self {
            layout,
            ..Self::default()
        }
    }

    /// Load and validate an experiment file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
            operation: format!("read config file {}", path.display()),
            source,
        })?;
        let config: ExperimentConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Validate hyperparameters, rewards and the start policy against the layout.
    pub fn validate(&self) -> Result<()> {
        self.rewards.validate()?;
        self.training.validate_for(&self.layout)
    }

    pub fn environment(&self) -> GridEnvironment {
        GridEnvironment::new(self.layout.clone(), self.rewards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{grid::GridPos, pipeline::StartPolicy};

    #[test]
    fn test_partial_file_uses_defaults() {
        let json = r#"{ "layout": [[0, 0, 1]], "training": { "num_episodes": 12 } }"#;
        let config: ExperimentConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.training.num_episodes, 12);
        assert_eq!(config.training.max_steps, TrainingConfig::default().max_steps);
        assert_eq!(config.rewards, Rewards::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_fixed_start_in_file() {
        let json = r#"{
            "layout": [[0, 0], [-1, 1]],
            "training": { "start": { "fixed": { "row": 0, "col": 1 } } }
        }"#;
        let config: ExperimentConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.training.start, StartPolicy::Fixed(GridPos::new(0, 1)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("experiment.json");
        std::fs::write(
            &path,
            r#"{ "layout": [[0, 1]], "training": { "epsilon": 2.0 } }"#,
        )
        .unwrap();

        let err = ExperimentConfig::load(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("experiment.json");
        let mut config = ExperimentConfig::new(BuiltinLayout::Open3x3.layout());
        config.training = config.training.with_seed(3).with_episodes(10);

        config.save(&path).unwrap();
        let loaded = ExperimentConfig::load(&path).unwrap();
        assert_eq!(loaded.layout, config.layout);
        assert_eq!(loaded.training.seed, Some(3));
        assert_eq!(loaded.training.num_episodes, 10);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ExperimentConfig::load("/nonexistent/experiment.json").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
