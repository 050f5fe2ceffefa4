//! Optimize command implementation.
//!
//! Solves one of the conic allocation problems and reports weights and
//! portfolio statistics.

use anyhow::Result;
use clap::{Args, ValueEnum};
use serde::Serialize;

use meridian_portfolio::{
    max_sharpe, mean_variance, minimum_variance, portfolio_statistics, Allocation,
    PortfolioStatistics,
};

use crate::cli::OutputFormat;
use crate::commands::ProblemArgs;
use crate::output::{
    print_header, print_output, print_single, print_warning, weight_rows, KeyValue,
};

/// Optimization objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Method {
    /// Maximize return minus risk penalty
    MeanVariance,
    /// Minimize variance
    MinVariance,
    /// Maximize the Sharpe ratio
    MaxSharpe,
}

impl Method {
    fn as_str(self) -> &'static str {
        match self {
            Self::MeanVariance => "mean_variance",
            Self::MinVariance => "minimum_variance",
            Self::MaxSharpe => "max_sharpe",
        }
    }
}

/// Arguments for the optimize command.
#[derive(Args, Debug)]
pub struct OptimizeArgs {
    #[command(flatten)]
    pub input: ProblemArgs,

    /// Objective to optimize
    #[arg(short, long, value_enum, default_value = "mean-variance")]
    pub method: Method,

    /// Optimize against the posterior instead of the prior
    #[arg(long)]
    pub posterior: bool,

    /// Override the problem's risk aversion (lambda)
    #[arg(short = 'l', long)]
    pub risk_aversion: Option<f64>,
}

#[derive(Serialize)]
struct OptimizeReport<'a> {
    method: &'static str,
    #[serde(flatten)]
    allocation: &'a Allocation,
    statistics: &'a PortfolioStatistics,
}

/// Execute the optimize command.
pub fn execute(args: OptimizeArgs, format: OutputFormat) -> Result<()> {
    let problem = args.input.load()?;
    let (returns, covariance) = problem.inputs(args.posterior)?;
    let constraints = &problem.constraints;
    let config = &problem.compute;

    let allocation = match args.method {
        Method::MeanVariance => {
            let lambda = args.risk_aversion.unwrap_or(problem.risk_aversion);
            mean_variance(&returns, &covariance, lambda, constraints, config)?
        }
        Method::MinVariance => minimum_variance(&covariance, constraints, config)?,
        Method::MaxSharpe => {
            max_sharpe(&returns, &covariance, problem.risk_free_rate, constraints, config)?
        }
    };
    if allocation.approximate {
        print_warning("weights were clipped to the box after solving and are approximate");
    }

    let statistics =
        portfolio_statistics(&allocation.weights, &returns, &covariance, problem.risk_free_rate)?;

    match format {
        OutputFormat::Table => {
            print_header(&format!(
                "{} ({})",
                args.method.as_str(),
                allocation.status.as_str()
            ));
            print_output(&weight_rows(&allocation.weights), format)?;
            print_header("Statistics");
            print_output(&statistics_rows(&allocation, &statistics), format)?;
        }
        OutputFormat::Json => print_single(&OptimizeReport {
            method: args.method.as_str(),
            allocation: &allocation,
            statistics: &statistics,
        })?,
        OutputFormat::Csv => print_output(&weight_rows(&allocation.weights), format)?,
        OutputFormat::Minimal => println!("{:.6}", allocation.objective),
    }

    Ok(())
}

/// Key figures of an allocation.
pub fn statistics_rows(allocation: &Allocation, stats: &PortfolioStatistics) -> Vec<KeyValue> {
    vec![
        KeyValue::from_f64("Objective", allocation.objective, 6),
        KeyValue::from_percent("Expected Return", stats.expected_return),
        KeyValue::from_percent("Volatility", stats.volatility),
        KeyValue::from_f64("Sharpe Ratio", stats.sharpe_ratio, 4),
        KeyValue::from_percent("Annual Return", stats.annual_return),
        KeyValue::from_percent("Annual Volatility", stats.annual_volatility),
        KeyValue::from_f64("Annual Sharpe", stats.annual_sharpe, 4),
        KeyValue::from_f64("Weights Sum", stats.weights_sum, 6),
        KeyValue::new("Positions", stats.n_positions.to_string()),
    ]
}
