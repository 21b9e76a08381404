//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    catalog::CatalogCommands, completions::CompletionsArgs, consolidate::ConsolidateArgs,
    estimate::EstimateArgs, init::InitArgs, order::OrderCommands,
};

#[derive(Parser)]
#[command(name = "fabest")]
#[command(author, version, about = "Rule-driven estimating for fabricated products")]
#[command(long_about = "Estimate weight, cost and price of configurable fabricated products from \
formula-based rule sets, and turn configured order lines into production BOMs.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging on stderr)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .fabest/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new fabest project
    Init(InitArgs),

    /// Estimate price, weight and cut list for a configured product
    Estimate(EstimateArgs),

    /// Consolidate a stored estimate snapshot into BOM quantities
    Consolidate(ConsolidateArgs),

    /// Sales order operations
    #[command(subcommand)]
    Order(OrderCommands),

    /// Inspect and check master data (material sets, rule sets, items)
    #[command(subcommand)]
    Catalog(CatalogCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Use the configured default, or a table on the terminal
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// JSON format (same shape as stored snapshots)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Human-readable tables
    Table,
}
