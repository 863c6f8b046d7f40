//! Training pipeline: the episode/step learning loop

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    Error, Result,
    grid::{GridEnvironment, GridLayout, GridPos},
    ports::Observer,
    q_learning::QLearningAgent,
};

/// How each episode picks its start state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartPolicy {
    /// Uniformly among the free cells
    #[default]
    UniformFree,
    /// Always the same free cell
    Fixed(GridPos),
}

/// Training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of training episodes
    pub num_episodes: usize,

    /// Step cap per episode
    pub max_steps: usize,

    /// Learning rate α, in (0, 1]
    pub learning_rate: f64,

    /// Discount factor γ, in [0, 1]
    pub discount_factor: f64,

    /// Exploration rate ε, in [0, 1]
    pub epsilon: f64,

    /// Multiplicative ε decay applied after each episode (1.0 keeps ε fixed)
    pub epsilon_decay: f64,

    /// Floor for the decayed ε
    pub min_epsilon: f64,

    /// Lower bound of the uniform Q-value initialisation
    pub q_init_low: f64,

    /// Upper bound (exclusive) of the uniform Q-value initialisation
    pub q_init_high: f64,

    /// Random seed
    pub seed: Option<u64>,

    /// Start state selection
    pub start: StartPolicy,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            num_episodes: 50_000,
            max_steps: 1_000,
            learning_rate: 0.1,
            discount_factor: 0.9,
            epsilon: 0.1,
            epsilon_decay: 1.0,
            min_epsilon: 0.0,
            q_init_low: 0.0,
            q_init_high: 0.1,
            seed: None,
            start: StartPolicy::UniformFree,
        }
    }
}

impl TrainingConfig {
    pub fn with_episodes(mut self, num_episodes: usize) -> Self {
        self.num_episodes = num_episodes;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_discount_factor(mut self, discount_factor: f64) -> Self {
        self.discount_factor = discount_factor;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_epsilon_decay(mut self, epsilon_decay: f64, min_epsilon: f64) -> Self {
        self.epsilon_decay = epsilon_decay;
        self.min_epsilon = min_epsilon;
        self
    }

    pub fn with_q_init(mut self, low: f64, high: f64) -> Self {
        self.q_init_low = low;
        self.q_init_high = high;
        self
    }

    /// Set the random seed for deterministic behavior.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_start(mut self, start: StartPolicy) -> Self {
        self.start = start;
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.num_episodes == 0 {
            return Err(Error::config("num_episodes must be > 0"));
        }
        if self.max_steps == 0 {
            return Err(Error::config("max_steps must be > 0"));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(Error::config("learning_rate must be in (0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.discount_factor) {
            return Err(Error::config("discount_factor must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(Error::config("epsilon must be in [0, 1]"));
        }
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return Err(Error::config("epsilon_decay must be in (0, 1]"));
        }
        if !(0.0..=self.epsilon).contains(&self.min_epsilon) {
            return Err(Error::config("min_epsilon must be in [0, epsilon]"));
        }
        if !self.q_init_low.is_finite()
            || !self.q_init_high.is_finite()
            || self.q_init_low > self.q_init_high
        {
            return Err(Error::config(
                "q_init range must be finite with q_init_low <= q_init_high",
            ));
        }
        Ok(())
    }

    /// Validate against a concrete layout (fixed start must be a free cell).
    pub fn validate_for(&self, layout: &GridLayout) -> Result<()> {
        self.validate()?;
        self.validate_schedule_for(layout)
    }

    /// Validate only what the episode loop reads: episode count, step cap
    /// and start policy. Learning parameters belong to the agent.
    fn validate_schedule_for(&self, layout: &GridLayout) -> Result<()> {
        if self.num_episodes == 0 {
            return Err(Error::config("num_episodes must be > 0"));
        }
        if self.max_steps == 0 {
            return Err(Error::config("max_steps must be > 0"));
        }
        if let StartPolicy::Fixed(pos) = self.start {
            if !layout.contains(pos) {
                return Err(Error::PositionOutOfBounds {
                    row: pos.row,
                    col: pos.col,
                    rows: layout.rows(),
                    cols: layout.cols(),
                });
            }
            if !layout.is_free(pos) {
                return Err(Error::StartNotFree {
                    row: pos.row,
                    col: pos.col,
                });
            }
        }
        Ok(())
    }
}

/// Summary of a single episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    /// Episode index (0-based)
    pub episode: usize,
    /// Sampled start state
    pub start: GridPos,
    /// Steps taken
    pub steps: usize,
    /// Undiscounted sum of rewards
    pub total_reward: f64,
    /// Whether the episode ended on the goal (otherwise it hit the step cap)
    pub reached_goal: bool,
    /// Exploration rate used during the episode
    pub epsilon: f64,
    /// Mean absolute TD error over the episode's updates
    pub mean_abs_td_error: f64,
}

/// Result of a training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingResult {
    /// Total episodes run
    pub total_episodes: usize,

    /// Episodes that reached the goal
    pub successes: usize,

    /// Episodes stopped by the step cap
    pub timeouts: usize,

    /// Fraction of episodes that reached the goal
    pub success_rate: f64,

    /// Mean episode length
    pub mean_steps: f64,

    /// Mean undiscounted episode return
    pub mean_return: f64,

    /// Exploration rate after the last decay
    pub final_epsilon: f64,
}

impl TrainingResult {
    fn from_tally(tally: &Tally, final_epsilon: f64) -> Self {
        let ratio = |x: f64| {
            if tally.episodes > 0 {
                x / tally.episodes as f64
            } else {
                0.0
            }
        };
        Self {
            total_episodes: tally.episodes,
            successes: tally.successes,
            timeouts: tally.episodes - tally.successes,
            success_rate: ratio(tally.successes as f64),
            mean_steps: ratio(tally.steps as f64),
            mean_return: ratio(tally.reward),
            final_epsilon,
        }
    }

    /// Save result to JSON file
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load result from JSON file
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let result = serde_json::from_reader(file)?;
        Ok(result)
    }
}

#[derive(Default)]
struct Tally {
    episodes: usize,
    successes: usize,
    steps: usize,
    reward: f64,
}

/// A finished run: the trained agent and its statistics
#[derive(Debug)]
pub struct TrainingOutcome {
    pub agent: QLearningAgent,
    pub result: TrainingResult,
}

/// Q-learning training pipeline
pub struct TrainingPipeline {
    config: TrainingConfig,
    observers: Vec<Box<dyn Observer>>,
}

impl TrainingPipeline {
    /// Create a new training pipeline
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            observers: Vec::new(),
        }
    }

    /// Add an observer to the pipeline
    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Build a fresh agent for `env` and train it
    pub fn run(&mut self, env: &GridEnvironment) -> Result<TrainingOutcome> {
        self.config.validate_for(env.layout())?;
        let mut agent = QLearningAgent::new(env.layout(), &self.config)?;
        let result = self.train(env, &mut agent)?;
        Ok(TrainingOutcome { agent, result })
    }

    /// Train an existing agent for the configured number of episodes
    ///
    /// The agent keeps its own table, exploration state and generator; only
    /// the episode count, step cap and start policy come from the pipeline.
    pub fn train(
        &mut self,
        env: &GridEnvironment,
        agent: &mut QLearningAgent,
    ) -> Result<TrainingResult> {
        self.config.validate_schedule_for(env.layout())?;
        env.rewards().validate()?;

        if agent.epsilon() == 0.0 {
            warn!("epsilon is 0; exploration relies on the initial Q-values alone");
        }
        info!(
            episodes = self.config.num_episodes,
            max_steps = self.config.max_steps,
            alpha = agent.learning_rate(),
            gamma = agent.discount_factor(),
            epsilon = agent.epsilon(),
            seed = ?agent.rng_seed(),
            "starting Q-learning"
        );

        for observer in &mut self.observers {
            observer.on_training_start(self.config.num_episodes)?;
        }

        let mut tally = Tally::default();
        for episode in 0..self.config.num_episodes {
            let summary = self.run_episode(episode, env, agent)?;

            tally.episodes += 1;
            tally.steps += summary.steps;
            tally.reward += summary.total_reward;
            if summary.reached_goal {
                tally.successes += 1;
            }
            debug!(
                episode,
                steps = summary.steps,
                reached_goal = summary.reached_goal,
                "episode finished"
            );

            for observer in &mut self.observers {
                observer.on_episode_end(&summary)?;
            }

            agent.end_episode();
        }

        for observer in &mut self.observers {
            observer.on_training_end()?;
        }

        let result = TrainingResult::from_tally(&tally, agent.epsilon());
        info!(
            successes = result.successes,
            timeouts = result.timeouts,
            success_rate = result.success_rate,
            mean_steps = result.mean_steps,
            "training finished"
        );
        Ok(result)
    }

    fn start_state(&self, env: &GridEnvironment, agent: &mut QLearningAgent) -> Result<GridPos> {
        match self.config.start {
            StartPolicy::Fixed(pos) => Ok(pos),
            StartPolicy::UniformFree => agent.sample_start(env.layout().free_cells()),
        }
    }

    fn run_episode(
        &mut self,
        episode: usize,
        env: &GridEnvironment,
        agent: &mut QLearningAgent,
    ) -> Result<EpisodeSummary> {
        let start = self.start_state(env, agent)?;
        for observer in &mut self.observers {
            observer.on_episode_start(episode, start)?;
        }

        let epsilon = agent.epsilon();
        let mut state = start;
        let mut steps = 0;
        let mut total_reward = 0.0;
        let mut abs_td_sum = 0.0;
        let mut reached_goal = false;

        for step in 0..self.config.max_steps {
            let action = agent.select_action(state);
            let transition = env.transition(state, action);
            let td_error = agent.learn(state, action, &transition);

            for observer in &mut self.observers {
                observer.on_step(episode, step, state, action, &transition, td_error)?;
            }

            steps += 1;
            total_reward += transition.reward;
            abs_td_sum += td_error.abs();
            state = transition.next_state;

            if env.is_goal_reward(transition.reward) {
                reached_goal = true;
                break;
            }
        }

        Ok(EpisodeSummary {
            episode,
            start,
            steps,
            total_reward,
            reached_goal,
            epsilon,
            mean_abs_td_error: abs_td_sum / steps as f64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{BuiltinLayout, Rewards};

    fn env(layout: BuiltinLayout) -> GridEnvironment {
        GridEnvironment::new(layout.layout(), Rewards::default())
    }

    #[test]
    fn test_training_pipeline() {
        let config = TrainingConfig::default()
            .with_episodes(20)
            .with_max_steps(30)
            .with_seed(42);

        let mut pipeline = TrainingPipeline::new(config);
        let outcome = pipeline.run(&env(BuiltinLayout::Open3x3)).unwrap();

        assert_eq!(outcome.result.total_episodes, 20);
        assert_eq!(
            outcome.result.successes + outcome.result.timeouts,
            outcome.result.total_episodes
        );
        assert!(outcome.result.mean_steps <= 30.0);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(TrainingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_out_of_range_values() {
        let base = TrainingConfig::default();
        assert!(base.clone().with_episodes(0).validate().is_err());
        assert!(base.clone().with_max_steps(0).validate().is_err());
        assert!(base.clone().with_learning_rate(0.0).validate().is_err());
        assert!(base.clone().with_learning_rate(1.5).validate().is_err());
        assert!(base.clone().with_discount_factor(-0.1).validate().is_err());
        assert!(base.clone().with_epsilon(-0.01).validate().is_err());
        assert!(base.clone().with_epsilon(f64::NAN).validate().is_err());
        assert!(base.clone().with_epsilon_decay(0.0, 0.0).validate().is_err());
        assert!(base.clone().with_epsilon_decay(0.99, 0.5).validate().is_err());
        assert!(base.clone().with_q_init(0.2, 0.1).validate().is_err());
        assert!(base.with_learning_rate(1.0).with_epsilon(1.0).validate().is_ok());
    }

    #[test]
    fn test_fixed_start_must_be_free() {
        let layout = BuiltinLayout::Walls.layout();
        let wall = TrainingConfig::default().with_start(StartPolicy::Fixed(GridPos::new(1, 3)));
        assert!(matches!(
            wall.validate_for(&layout),
            Err(Error::StartNotFree { row: 1, col: 3 })
        ));

        let goal = TrainingConfig::default().with_start(StartPolicy::Fixed(GridPos::new(9, 9)));
        assert!(goal.validate_for(&layout).is_err());

        let outside = TrainingConfig::default().with_start(StartPolicy::Fixed(GridPos::new(10, 0)));
        assert!(matches!(
            outside.validate_for(&layout),
            Err(Error::PositionOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_train_ignores_learning_parameters_of_pipeline() {
        let env = env(BuiltinLayout::Corridor);
        let agent_config = TrainingConfig::default().with_seed(6);
        let mut agent = QLearningAgent::new(env.layout(), &agent_config).unwrap();

        // Out-of-range learning parameters are the agent's concern, not the loop's.
        let mut pipeline_config = TrainingConfig::default()
            .with_episodes(4)
            .with_max_steps(20);
        pipeline_config.learning_rate = 2.0;
        pipeline_config.epsilon = -1.0;

        let result = TrainingPipeline::new(pipeline_config.clone())
            .train(&env, &mut agent)
            .unwrap();
        assert_eq!(result.total_episodes, 4);
        assert_eq!(result.final_epsilon, agent.epsilon());

        // `run` builds the agent from the config, so it still rejects them.
        assert!(TrainingPipeline::new(pipeline_config).run(&env).is_err());

        let no_episodes = TrainingConfig::default().with_episodes(0);
        assert!(
            TrainingPipeline::new(no_episodes)
                .train(&env, &mut agent)
                .is_err()
        );
    }

    #[test]
    fn test_episode_stops_at_step_cap() {
        // Goal is unreachable behind a wall, so every episode times out.
        let layout = GridLayout::from_codes(&[[0, 0, -1, 1]]).unwrap();
        let env = GridEnvironment::new(layout, Rewards::default());
        let config = TrainingConfig::default()
            .with_episodes(5)
            .with_max_steps(17)
            .with_seed(1);

        let outcome = TrainingPipeline::new(config).run(&env).unwrap();
        assert_eq!(outcome.result.successes, 0);
        assert_eq!(outcome.result.timeouts, 5);
        assert_eq!(outcome.result.mean_steps, 17.0);
    }

    #[test]
    fn test_epsilon_decays_per_episode() {
        let config = TrainingConfig::default()
            .with_episodes(3)
            .with_max_steps(10)
            .with_epsilon(0.8)
            .with_epsilon_decay(0.5, 0.0)
            .with_seed(9);

        let outcome = TrainingPipeline::new(config)
            .run(&env(BuiltinLayout::Corridor))
            .unwrap();
        assert!((outcome.result.final_epsilon - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_result_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.json");
        let config = TrainingConfig::default().with_episodes(4).with_seed(5);
        let outcome = TrainingPipeline::new(config)
            .run(&env(BuiltinLayout::Corridor))
            .unwrap();

        outcome.result.save(&path).unwrap();
        let loaded = TrainingResult::load(&path).unwrap();
        assert_eq!(loaded.total_episodes, 4);
        assert_eq!(loaded.successes, outcome.result.successes);
    }
}
