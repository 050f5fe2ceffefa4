//! Meridian CLI - Black-Litterman posteriors and portfolio allocation.
//!
//! Every command reads a problem file (TOML or JSON) describing the asset
//! universe, covariance, prior or market weights, views and constraints.
//!
//! # Usage
//!
//! ```bash
//! # Blend the prior with the views
//! meridian posterior problem.toml
//!
//! # Equilibrium returns from market weights
//! meridian implied problem.toml --risk-aversion 3.0
//!
//! # Optimize against the posterior
//! meridian optimize problem.toml --method max-sharpe --posterior
//!
//! # Efficient frontier as JSON
//! meridian --format json frontier problem.toml --points 25
//!
//! # Equal risk contributions, compare all strategies
//! meridian risk-parity problem.toml
//! meridian compare problem.toml --posterior
//!
//! # Covariance conditioning
//! meridian diagnostics problem.toml --repair
//! ```
//!
//! Logging goes to stderr and honours `RUST_LOG`.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod commands;
mod error;
mod output;
mod problem;

use cli::{Cli, Commands};

fn init_tracing(verbose: bool, quiet: bool) {
    let default = if verbose {
        "meridian=debug,meridian_portfolio=debug,meridian_math=debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // stdout carries the report
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let format = cli.format;

    match cli.command {
        Commands::Posterior(args) => commands::posterior::execute(args, format)?,
        Commands::Implied(args) => commands::implied::execute(args, format)?,
        Commands::Optimize(args) => commands::optimize::execute(args, format)?,
        Commands::Frontier(args) => commands::frontier::execute(args, format)?,
        Commands::RiskParity(args) => commands::risk_parity::execute(args, format)?,
        Commands::Compare(args) => commands::compare::execute(args, format)?,
        Commands::Diagnostics(args) => commands::diagnostics::execute(args, format)?,
    }

    Ok(())
}
