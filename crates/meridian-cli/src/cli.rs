//! CLI argument definitions.

use clap::{Parser, Subcommand, ValueEnum};

use crate::commands::{
    CompareArgs, DiagnosticsArgs, FrontierArgs, ImpliedArgs, OptimizeArgs, PosteriorArgs,
    RiskParityArgs,
};

/// Meridian - Black-Litterman synthesis and constrained portfolio allocation
#[derive(Parser)]
#[command(name = "meridian")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log solver and iteration details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Blend the prior with the problem's views into a posterior
    Posterior(PosteriorArgs),

    /// Reverse-optimize equilibrium returns from market weights
    Implied(ImpliedArgs),

    /// Solve for optimal weights
    Optimize(OptimizeArgs),

    /// Sweep the efficient frontier
    Frontier(FrontierArgs),

    /// Allocate by equal (or budgeted) risk contributions
    RiskParity(RiskParityArgs),

    /// Run several strategies side by side
    Compare(CompareArgs),

    /// Inspect the covariance matrix
    Diagnostics(DiagnosticsArgs),
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
    /// Minimal output (just the value)
    Minimal,
}
