//! CLI infrastructure for the gridworld toolkit
//!
//! This module provides the command-line interface for training Q-learning
//! agents on grid layouts and inspecting those layouts.

pub mod commands;
pub mod config;
pub mod output;
