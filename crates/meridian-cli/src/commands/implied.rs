//! Implied command implementation.
//!
//! Reverse-optimizes equilibrium returns `π = δΣw` from market weights.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use meridian_portfolio::implied_returns;

use crate::cli::OutputFormat;
use crate::commands::ProblemArgs;
use crate::output::{display_rate, print_header, print_output};

/// Arguments for the implied command.
#[derive(Args, Debug)]
pub struct ImpliedArgs {
    #[command(flatten)]
    pub input: ProblemArgs,

    /// Override the problem's risk aversion (delta)
    #[arg(short = 'd', long)]
    pub risk_aversion: Option<f64>,
}

/// One asset's equilibrium return.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct ImpliedRow {
    #[tabled(rename = "Asset")]
    pub asset: String,
    #[tabled(rename = "Market Weight", display_with = "display_rate")]
    pub market_weight: f64,
    #[tabled(rename = "Implied Return", display_with = "display_rate")]
    pub implied_return: f64,
}

/// Execute the implied command.
pub fn execute(args: ImpliedArgs, format: OutputFormat) -> Result<()> {
    let problem = args.input.load()?;
    let delta = args.risk_aversion.unwrap_or(problem.risk_aversion);
    let weights = problem.market_weights()?.normalized()?;

    let implied = implied_returns(&weights, &problem.covariance, delta)?;
    let rows: Vec<ImpliedRow> = implied
        .iter()
        .map(|(asset, value)| ImpliedRow {
            asset: asset.to_string(),
            market_weight: weights.get(asset).unwrap_or(0.0),
            implied_return: value,
        })
        .collect();

    if format == OutputFormat::Table {
        print_header(&format!("Implied Returns (delta = {delta})"));
    }
    print_output(&rows, format)
}
