//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::commands::{analyze::AnalyzeArgs, compare::CompareArgs, config::ConfigArgs, dedup::DedupArgs};

#[derive(Parser, Debug)]
#[command(name = "scenario-dedup")]
#[command(about = "Semantic deduplication of Given/When/Then scenarios", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file merged above the project config
    #[arg(short, long, global = true, env = "SCENARIO_DEDUP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deduplicate a scenario collection
    Dedup(DedupArgs),

    /// Compare every step pair and report the decisions without removing anything
    Analyze(AnalyzeArgs),

    /// Compare two deduplication results
    Compare(CompareArgs),

    /// Inspect the effective configuration
    Config(ConfigArgs),
}
