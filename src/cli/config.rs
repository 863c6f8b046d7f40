//! Shared configuration types for CLI commands

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::grid::{BuiltinLayout, GridLayout};

/// Where to take the grid layout from
#[derive(Args, Debug, Clone, Default)]
pub struct LayoutArgs {
    /// Text layout file: whitespace-separated cell codes (0 free, negative forbidden, positive goal)
    #[arg(long, conflicts_with = "builtin")]
    pub layout_file: Option<PathBuf>,

    /// Built-in layout
    #[arg(long, value_enum)]
    pub builtin: Option<BuiltinLayout>,
}

impl LayoutArgs {
    /// The explicitly requested layout, if any
    pub fn resolve(&self) -> Result<Option<GridLayout>> {
        if let Some(path) = &self.layout_file {
            let layout = GridLayout::load(path)
                .with_context(|| format!("failed to load layout from {}", path.display()))?;
            return Ok(Some(layout));
        }
        Ok(self.builtin.map(BuiltinLayout::layout))
    }

    /// The requested layout, falling back to the default built-in
    pub fn resolve_or_default(&self) -> Result<GridLayout> {
        Ok(self
            .resolve()?
            .unwrap_or_else(|| BuiltinLayout::default().layout()))
    }

    /// Human-readable name of the layout source
    pub fn describe(&self) -> String {
        match (&self.layout_file, self.builtin) {
            (Some(path), _) => path.display().to_string(),
            (None, builtin) => format!("builtin:{}", builtin.unwrap_or_default().name()),
        }
    }
}
