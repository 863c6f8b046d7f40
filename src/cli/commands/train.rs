//! Train command - Run Q-learning on a grid and report the learned policy

use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use serde_json::to_writer_pretty;
use tracing::info;

use crate::{
    cli::{config::LayoutArgs, output},
    config::ExperimentConfig,
    export::GridReportExporter,
    grid::{GridPos, Rewards},
    pipeline::{
        EvaluationReport, JsonlObserver, MetricsObserver, MetricsSummary, ProgressObserver,
        StartPolicy, TracingObserver, TrainingConfig, TrainingPipeline, TrainingResult,
        evaluate_greedy,
    },
    q_learning::{extract_policy, extract_state_values},
};

#[derive(Debug, Serialize)]
struct EvaluationStats {
    starts: usize,
    success_rate: f64,
    mean_steps_to_goal: Option<f64>,
    failing_starts: Vec<GridPos>,
}

impl From<&EvaluationReport> for EvaluationStats {
    fn from(report: &EvaluationReport) -> Self {
        Self {
            starts: report.rollouts.len(),
            success_rate: report.success_rate,
            mean_steps_to_goal: report.mean_steps_to_goal,
            failing_starts: report.failures().map(|rollout| rollout.start).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct TrainingSummaryFile {
    training: TrainingResult,
    metrics: MetricsSummary,
    evaluation: EvaluationStats,
    policy: Vec<Vec<&'static str>>,
    state_values: Vec<Vec<f64>>,
    metadata: SummaryMetadata,
}

#[derive(Debug, Serialize)]
struct SummaryMetadata {
    layout: String,
    rows: usize,
    cols: usize,
    free_cells: usize,
    seed: Option<u64>,
    config: TrainingConfig,
    rewards: Rewards,
}

fn sanitize_summary_path(raw: &Path) -> PathBuf {
    let mut normalized = raw.to_path_buf();
    let raw_str = raw.as_os_str().to_string_lossy();

    // Trailing separator or no file name means a directory target.
    if raw_str.ends_with(std::path::MAIN_SEPARATOR) || normalized.file_name().is_none() {
        normalized.push("training_summary.json");
        return normalized;
    }

    match normalized.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => normalized,
        _ => {
            normalized.set_extension("json");
            normalized
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Train a tabular Q-learning agent", allow_negative_numbers = true)]
pub struct TrainArgs {
    #[command(flatten)]
    pub layout: LayoutArgs,

    /// Experiment file (JSON) with layout, training and reward settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of training episodes
    #[arg(long, short = 'e')]
    pub episodes: Option<usize>,

    /// Step cap per episode
    #[arg(long)]
    pub max_steps: Option<usize>,

    /// Learning rate
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Discount factor
    #[arg(long)]
    pub gamma: Option<f64>,

    /// Exploration rate
    #[arg(long)]
    pub epsilon: Option<f64>,

    /// Multiplicative exploration decay applied after each episode
    #[arg(long)]
    pub epsilon_decay: Option<f64>,

    /// Floor for the decayed exploration rate
    #[arg(long)]
    pub min_epsilon: Option<f64>,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Start every episode from this cell (`row,col`) instead of a random free cell
    #[arg(long)]
    pub start: Option<GridPos>,

    /// Optional path for writing a summary JSON file
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Optional file for JSONL episode observations
    #[arg(long)]
    pub observations: Option<PathBuf>,

    /// Optional CSV export of policy, values and Q-values per cell
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Show progress bar
    #[arg(long)]
    pub progress: bool,

    /// Skip the printed report
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

impl TrainArgs {
    /// Merge the experiment file and command-line overrides
    fn experiment(&self) -> Result<ExperimentConfig> {
        let mut experiment = match &self.config {
            Some(path) => ExperimentConfig::load(path)
                .with_context(|| format!("failed to load experiment {}", path.display()))?,
            None => ExperimentConfig::default(),
        };

        if let Some(layout) = self.layout.resolve()? {
            experiment.layout = layout;
        }

        let training = &mut experiment.training;
        if let Some(episodes) = self.episodes {
            training.num_episodes = episodes;
        }
        if let Some(max_steps) = self.max_steps {
            training.max_steps = max_steps;
        }
        if let Some(alpha) = self.alpha {
            training.learning_rate = alpha;
        }
        if let Some(gamma) = self.gamma {
            training.discount_factor = gamma;
        }
        if let Some(epsilon) = self.epsilon {
            training.epsilon = epsilon;
        }
        if let Some(decay) = self.epsilon_decay {
            training.epsilon_decay = decay;
        }
        if let Some(min_epsilon) = self.min_epsilon {
            training.min_epsilon = min_epsilon;
        }
        if let Some(seed) = self.seed {
            training.seed = Some(seed);
        }
        if let Some(start) = self.start {
            training.start = StartPolicy::Fixed(start);
        }

        experiment.validate()?;
        Ok(experiment)
    }

    fn layout_description(&self) -> String {
        match (&self.config, self.layout.layout_file.is_some() || self.layout.builtin.is_some()) {
            (Some(path), false) => path.display().to_string(),
            _ => self.layout.describe(),
        }
    }
}

pub fn execute(args: TrainArgs) -> Result<()> {
    let experiment = args.experiment()?;
    let env = experiment.environment();
    let config = experiment.training.clone();

    let summary_spec = args.summary.as_ref().map(|raw| {
        let sanitized = sanitize_summary_path(raw);
        let normalized = sanitized != *raw;
        (sanitized, normalized)
    });

    if !args.quiet {
        output::print_section("Q-learning");
        output::print_kv("Layout", &args.layout_description());
        output::print_kv("Episodes", &output::format_number(config.num_episodes));
        output::print_kv("Max steps", &output::format_number(config.max_steps));
        output::print_kv(
            "alpha / gamma",
            &format!("{} / {}", config.learning_rate, config.discount_factor),
        );
        output::print_kv("epsilon", &config.epsilon.to_string());
        if let Some(seed) = config.seed {
            output::print_kv("Seed", &seed.to_string());
        }
    }

    let metrics = Arc::new(Mutex::new(MetricsObserver::new()));
    let log_interval = (config.num_episodes / 10).max(1);
    let mut pipeline = TrainingPipeline::new(config.clone())
        .with_observer(Box::new(TracingObserver::new(log_interval)))
        .with_observer(Box::new(Arc::clone(&metrics)));
    if args.progress && !args.quiet {
        pipeline = pipeline.with_observer(Box::new(ProgressObserver::new()));
    }
    if let Some(path) = &args.observations {
        let observer = JsonlObserver::new(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        pipeline = pipeline.with_observer(Box::new(observer));
    }

    let outcome = pipeline.run(&env)?;
    let table = outcome.agent.q_table();
    let layout = env.layout();

    let policy = extract_policy(table, layout);
    let values = extract_state_values(table, layout);
    let evaluation = evaluate_greedy(&env, table, config.max_steps);
    let metrics_summary = metrics
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .summary();

    if !args.quiet {
        output::print_training_result(&outcome.result);
        output::print_q_values(table, layout);
        output::print_policy(&policy);
        output::print_state_values(&values);
        output::print_evaluation(&evaluation);
    }

    if let Some(path) = &args.export {
        GridReportExporter::write_csv(path, table, layout)
            .with_context(|| format!("failed to export {}", path.display()))?;
        info!(path = %path.display(), "grid report exported");
        if !args.quiet {
            println!("\nGrid report written to {}", path.display());
        }
    }

    if let Some((summary_path, normalized)) = summary_spec {
        if normalized && !args.quiet {
            println!(
                "\nNormalizing summary path to {}",
                summary_path.display()
            );
        }

        if let Some(parent) = summary_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let summary = TrainingSummaryFile {
            training: outcome.result.clone(),
            metrics: metrics_summary,
            evaluation: EvaluationStats::from(&evaluation),
            policy: policy.labels(),
            state_values: values.to_dense(),
            metadata: SummaryMetadata {
                layout: args.layout_description(),
                rows: layout.rows(),
                cols: layout.cols(),
                free_cells: layout.free_cells().len(),
                seed: config.seed,
                config: config.clone(),
                rewards: *env.rewards(),
            },
        };

        let file = File::create(&summary_path)?;
        to_writer_pretty(file, &summary)?;
        if !args.quiet {
            println!("\nSummary written to {}", summary_path.display());
        }
    }

    Ok(())
}
