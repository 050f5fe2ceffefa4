//! Frontier command implementation.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use meridian_portfolio::{efficient_frontier, FrontierPoint};

use crate::cli::OutputFormat;
use crate::commands::{validate_count, ProblemArgs};
use crate::output::{display_percent, display_rate, print_header, print_output, print_warning};

/// Arguments for the frontier command.
#[derive(Args, Debug)]
pub struct FrontierArgs {
    #[command(flatten)]
    pub input: ProblemArgs,

    /// Number of target returns to sweep
    #[arg(short = 'n', long, default_value = "20")]
    pub points: usize,

    /// Sweep against the posterior instead of the prior
    #[arg(long)]
    pub posterior: bool,
}

/// One frontier target.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct FrontierRow {
    #[tabled(rename = "Target", display_with = "display_rate")]
    pub target_return: f64,
    #[tabled(rename = "Return", display_with = "display_percent")]
    pub expected_return: Option<f64>,
    #[tabled(rename = "Volatility", display_with = "display_percent")]
    pub volatility: Option<f64>,
    #[tabled(rename = "Status")]
    pub status: String,
}

impl From<&FrontierPoint> for FrontierRow {
    fn from(point: &FrontierPoint) -> Self {
        match &point.outcome {
            Ok(solution) => Self {
                target_return: point.target_return,
                expected_return: Some(solution.expected_return),
                volatility: Some(solution.volatility),
                status: solution.status.as_str().to_string(),
            },
            Err(err) => Self {
                target_return: point.target_return,
                expected_return: None,
                volatility: None,
                status: err.to_string(),
            },
        }
    }
}

/// Execute the frontier command.
pub fn execute(args: FrontierArgs, format: OutputFormat) -> Result<()> {
    let problem = args.input.load()?;
    let points = validate_count("points", args.points)?;
    let (returns, covariance) = problem.inputs(args.posterior)?;

    let frontier = efficient_frontier(
        &returns,
        &covariance,
        points,
        &problem.constraints,
        &problem.compute,
    )?;
    if frontier.failures() > 0 {
        print_warning(&format!(
            "{} of {} frontier targets could not be solved",
            frontier.failures(),
            frontier.len()
        ));
    }

    let rows: Vec<FrontierRow> = frontier.points.iter().map(FrontierRow::from).collect();
    if format == OutputFormat::Table {
        print_header(&format!("Efficient Frontier ({points} points)"));
    }
    print_output(&rows, format)
}
