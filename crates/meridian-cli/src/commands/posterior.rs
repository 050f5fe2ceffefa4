//! Posterior command implementation.
//!
//! Blends the prior with the problem's views and reports how far each
//! asset's expected return moved.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use meridian_portfolio::view_deviations;

use crate::cli::OutputFormat;
use crate::commands::ProblemArgs;
use crate::output::{display_percent, display_rate, print_header, print_output, print_single};

/// Arguments for the posterior command.
#[derive(Args, Debug)]
pub struct PosteriorArgs {
    #[command(flatten)]
    pub input: ProblemArgs,

    /// Override the problem's tau
    #[arg(long)]
    pub tau: Option<f64>,

    /// Ignore the views and print the prior unchanged
    #[arg(long)]
    pub no_views: bool,
}

/// One asset's prior and posterior.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct PosteriorRow {
    #[tabled(rename = "Asset")]
    pub asset: String,
    #[tabled(rename = "Prior", display_with = "display_rate")]
    pub prior: f64,
    #[tabled(rename = "Posterior", display_with = "display_rate")]
    pub posterior: f64,
    #[tabled(rename = "Change", display_with = "display_rate")]
    pub deviation: f64,
    #[tabled(rename = "Change (rel)", display_with = "display_percent")]
    pub pct_change: Option<f64>,
    #[tabled(rename = "Posterior Vol", display_with = "display_rate")]
    pub volatility: f64,
}

#[derive(Serialize)]
struct PosteriorReport<'a> {
    tau: f64,
    views: Vec<String>,
    assets: &'a [PosteriorRow],
}

/// Execute the posterior command.
pub fn execute(args: PosteriorArgs, format: OutputFormat) -> Result<()> {
    let mut problem = args.input.load()?;
    if let Some(tau) = args.tau {
        problem.tau = tau;
    }
    if args.no_views {
        problem.views.clear();
    }

    let prior = problem.prior()?;
    let posterior = problem.posterior()?;
    let deviations = view_deviations(&prior, &posterior.mean)?;

    let rows: Vec<PosteriorRow> = deviations
        .into_iter()
        .map(|d| {
            let variance = posterior.covariance.get(&d.asset, &d.asset).unwrap_or(0.0);
            PosteriorRow {
                volatility: variance.max(0.0).sqrt(),
                asset: d.asset,
                prior: d.prior,
                posterior: d.posterior,
                deviation: d.deviation,
                pct_change: d.pct_change,
            }
        })
        .collect();

    match format {
        OutputFormat::Table => {
            print_header(&format!(
                "Posterior (tau = {}, {} view(s))",
                problem.tau,
                problem.views.len()
            ));
            print_output(&rows, format)?;
        }
        OutputFormat::Json => print_single(&PosteriorReport {
            tau: problem.tau,
            views: problem.views.iter().map(|v| v.label()).collect(),
            assets: &rows,
        })?,
        OutputFormat::Csv | OutputFormat::Minimal => print_output(&rows, format)?,
    }

    Ok(())
}
