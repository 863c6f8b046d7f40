//! Show command - Print a layout and its statistics

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    cli::{config::LayoutArgs, output},
    config::ExperimentConfig,
    grid::GridLayout,
};

#[derive(Parser, Debug)]
#[command(about = "Print a grid layout")]
pub struct ShowArgs {
    #[command(flatten)]
    pub layout: LayoutArgs,

    /// Take the layout from an experiment file
    #[arg(long, conflicts_with_all = ["layout_file", "builtin"])]
    pub config: Option<PathBuf>,

    /// Also print the integer cell codes
    #[arg(long)]
    pub codes: bool,
}

impl ShowArgs {
    fn load_layout(&self) -> Result<GridLayout> {
        match &self.config {
            Some(path) => {
                let experiment = ExperimentConfig::load(path)
                    .with_context(|| format!("failed to load experiment {}", path.display()))?;
                Ok(experiment.layout)
            }
            None => self.layout.resolve_or_default(),
        }
    }
}

pub fn execute(args: ShowArgs) -> Result<()> {
    let layout = args.load_layout()?;

    let source = match &args.config {
        Some(path) => path.display().to_string(),
        None => args.layout.describe(),
    };
    output::print_section(&format!("Grid {source}"));
    output::print_layout(&layout);

    if args.codes {
        output::print_subsection("Cell codes");
        for row in layout.to_codes() {
            let line = row
                .iter()
                .map(|code| format!("{code:>2}"))
                .collect::<Vec<_>>()
                .join(" ");
            println!("{line}");
        }
    }

    Ok(())
}
