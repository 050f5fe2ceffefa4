//! Compare command implementation.
//!
//! Runs several allocation strategies on the same inputs and tabulates
//! their statistics.

use anyhow::Result;
use clap::{Args, ValueEnum};
use serde::Serialize;
use tabled::Tabled;

use meridian_portfolio::{compare_strategies, Strategy, StrategyResult};

use crate::cli::OutputFormat;
use crate::commands::ProblemArgs;
use crate::output::{display_percent, print_header, print_output, print_warning};

/// Strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyKind {
    /// Mean-variance at the problem's risk aversion
    MeanVariance,
    /// Minimum variance
    MinVariance,
    /// Maximum Sharpe ratio at the problem's risk-free rate
    MaxSharpe,
    /// Equal risk contributions
    RiskParity,
    /// 1/n in every asset
    EqualWeight,
}

impl StrategyKind {
    fn strategy(self, risk_aversion: f64, risk_free_rate: f64) -> Strategy {
        match self {
            Self::MeanVariance => Strategy::MeanVariance { risk_aversion },
            Self::MinVariance => Strategy::MinimumVariance,
            Self::MaxSharpe => Strategy::MaxSharpe { risk_free_rate },
            Self::RiskParity => Strategy::RiskParity,
            Self::EqualWeight => Strategy::EqualWeight,
        }
    }
}

/// Arguments for the compare command.
#[derive(Args, Debug)]
pub struct CompareArgs {
    #[command(flatten)]
    pub input: ProblemArgs,

    /// Strategies to run (default: all)
    #[arg(short = 's', long = "strategy", value_enum, value_delimiter = ',')]
    pub strategies: Vec<StrategyKind>,

    /// Compare against the posterior instead of the prior
    #[arg(long)]
    pub posterior: bool,
}

/// One strategy's summary.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct CompareRow {
    #[tabled(rename = "Strategy")]
    pub strategy: String,
    #[tabled(rename = "Return", display_with = "display_percent")]
    pub expected_return: Option<f64>,
    #[tabled(rename = "Volatility", display_with = "display_percent")]
    pub volatility: Option<f64>,
    #[tabled(rename = "Sharpe", display_with = "display_ratio")]
    pub sharpe_ratio: Option<f64>,
    #[tabled(rename = "Annual Sharpe", display_with = "display_ratio")]
    pub annual_sharpe: Option<f64>,
    #[tabled(rename = "Positions", display_with = "display_count")]
    pub n_positions: Option<usize>,
    #[tabled(rename = "Note")]
    pub note: String,
}

fn display_ratio(value: &Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"))
}

fn display_count(value: &Option<usize>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

impl From<&StrategyResult> for CompareRow {
    fn from(result: &StrategyResult) -> Self {
        match &result.outcome {
            Ok(report) => Self {
                strategy: result.name.to_string(),
                expected_return: Some(report.statistics.expected_return),
                volatility: Some(report.statistics.volatility),
                sharpe_ratio: Some(report.statistics.sharpe_ratio),
                annual_sharpe: Some(report.statistics.annual_sharpe),
                n_positions: Some(report.statistics.n_positions),
                note: if report.approximate {
                    "approximate".to_string()
                } else {
                    String::new()
                },
            },
            Err(err) => Self {
                strategy: result.name.to_string(),
                expected_return: None,
                volatility: None,
                sharpe_ratio: None,
                annual_sharpe: None,
                n_positions: None,
                note: err.to_string(),
            },
        }
    }
}

/// Execute the compare command.
pub fn execute(args: CompareArgs, format: OutputFormat) -> Result<()> {
    let problem = args.input.load()?;
    let (returns, covariance) = problem.inputs(args.posterior)?;

    let strategies: Vec<Strategy> = if args.strategies.is_empty() {
        Strategy::standard_set(problem.risk_aversion, problem.risk_free_rate)
    } else {
        args.strategies
            .iter()
            .map(|kind| kind.strategy(problem.risk_aversion, problem.risk_free_rate))
            .collect()
    };

    let results = compare_strategies(
        &returns,
        &covariance,
        &strategies,
        &problem.constraints,
        problem.risk_free_rate,
        &problem.compute,
    )?;
    for failed in results.iter().filter(|r| r.outcome.is_err()) {
        print_warning(&format!("{} failed", failed.name));
    }

    let rows: Vec<CompareRow> = results.iter().map(CompareRow::from).collect();
    if format == OutputFormat::Table {
        print_header(&format!("Strategy Comparison (rf = {})", problem.risk_free_rate));
    }
    print_output(&rows, format)
}
