//! CLI subcommands

pub mod show;
pub mod train;
