//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    calib::CalibCommands,
    completions::CompletionsArgs,
    config::ConfigCommands,
    eqp::EqpCommands,
    flr::FlrCommands,
    init::InitArgs,
    rdg::RdgCommands,
    report::ReportCommands,
    status::StatusArgs,
    validate::ValidateArgs,
};

#[derive(Parser)]
#[command(name = "mrt")]
#[command(author, version, about = "Machine Reliability Toolkit")]
#[command(long_about = "A Unix-style toolkit for tracking industrial equipment condition as plain text files: vibration readings, severity zones, Weibull reliability and failure history.")]
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

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .mrt/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new MRT project
    Init(InitArgs),

    /// Equipment management (assets under monitoring)
    #[command(subcommand)]
    Eqp(EqpCommands),

    /// Reading management (vibration measurements)
    #[command(subcommand)]
    Rdg(RdgCommands),

    /// Failure event management (failure history)
    #[command(subcommand)]
    Flr(FlrCommands),

    /// Calibration management (zone bands, Weibull tables, base rates)
    #[command(subcommand)]
    Calib(CalibCommands),

    /// Generate reliability reports (Pareto, fleet condition, survival)
    #[command(subcommand)]
    Report(ReportCommands),

    /// Validate project files against schemas and recompute stored results
    Validate(ValidateArgs),

    /// Show fleet status dashboard
    Status(StatusArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (yaml for show, tsv for list)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just IDs, one per line
    Id,
}
