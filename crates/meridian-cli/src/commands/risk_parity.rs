//! Risk parity command implementation.
//!
//! Runs the fixed-point iteration and reports each asset's share of risk.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use meridian_portfolio::{risk_contributions, risk_parity, PortfolioError, RiskParityOutcome};

use crate::cli::OutputFormat;
use crate::commands::{validate_count, ProblemArgs};
use crate::error::CliError;
use crate::output::{display_rate, print_header, print_output, print_single, print_warning};

/// Arguments for the risk-parity command.
#[derive(Args, Debug)]
pub struct RiskParityArgs {
    #[command(flatten)]
    pub input: ProblemArgs,

    /// Use the problem's risk_budgets instead of equal budgets
    #[arg(long)]
    pub budgets: bool,

    /// Iteration cap
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Convergence tolerance on the largest weight change
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Fail instead of reporting best-effort weights when not converged
    #[arg(long)]
    pub strict: bool,
}

/// One asset's weight and risk share.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct RiskParityRow {
    #[tabled(rename = "Asset")]
    pub asset: String,
    #[tabled(rename = "Weight", display_with = "display_rate")]
    pub weight: f64,
    #[tabled(rename = "Risk Contribution", display_with = "display_rate")]
    pub contribution: f64,
    #[tabled(rename = "Risk Share", display_with = "display_rate")]
    pub fraction: f64,
    #[tabled(rename = "Budget", display_with = "display_rate")]
    pub budget: f64,
}

#[derive(Serialize)]
struct RiskParityReport<'a> {
    converged: bool,
    iterations: usize,
    volatility: f64,
    assets: &'a [RiskParityRow],
}

/// Execute the risk-parity command.
pub fn execute(args: RiskParityArgs, format: OutputFormat) -> Result<()> {
    let problem = args.input.load()?;
    let mut config = problem.compute.risk_parity;
    if let Some(max_iterations) = args.max_iterations {
        config = config.with_max_iterations(validate_count("max-iterations", max_iterations)?);
    }
    if let Some(tolerance) = args.tolerance {
        config = config.with_tolerance(tolerance);
    }

    let budgets = if args.budgets {
        Some(
            problem
                .risk_budgets
                .as_ref()
                .ok_or(CliError::MissingField("risk_budgets"))?,
        )
    } else {
        None
    };

    let outcome = risk_parity(&problem.covariance, budgets, &config)?;
    if let RiskParityOutcome::DidNotConverge {
        iterations,
        max_change,
        ..
    } = outcome
    {
        if args.strict {
            return Err(CliError::from(PortfolioError::NonConvergence {
                iterations,
                max_change,
            })
            .into());
        }
        print_warning(&format!(
            "did not converge after {iterations} iterations (max change {max_change:.2e}); weights are best effort"
        ));
    }

    let report = risk_contributions(outcome.weights(), &problem.covariance)?;
    let n = report.by_asset.len();
    let rows: Vec<RiskParityRow> = report
        .by_asset
        .iter()
        .map(|c| RiskParityRow {
            asset: c.asset.clone(),
            weight: c.weight,
            contribution: c.contribution,
            fraction: c.fraction,
            budget: budgets
                .and_then(|b| b.get(&c.asset))
                .unwrap_or(1.0 / n as f64),
        })
        .collect();

    match format {
        OutputFormat::Table => {
            print_header(&format!(
                "Risk Parity ({} after {} iterations)",
                if outcome.is_converged() { "converged" } else { "not converged" },
                outcome.iterations()
            ));
            print_output(&rows, format)?;
        }
        OutputFormat::Json => print_single(&RiskParityReport {
            converged: outcome.is_converged(),
            iterations: outcome.iterations(),
            volatility: report.volatility,
            assets: &rows,
        })?,
        OutputFormat::Csv | OutputFormat::Minimal => print_output(&rows, format)?,
    }

    Ok(())
}
