//! Side-by-side strategy comparison on one (μ, Σ) snapshot.
//!
//! Each strategy is solved independently and scored with
//! [`portfolio_statistics`]. A strategy that fails keeps its error in its own
//! [`StrategyResult`]; the others are unaffected.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::allocation::{max_sharpe, mean_variance, minimum_variance};
use crate::analytics::{maybe_parallel_map, portfolio_statistics, PortfolioStatistics};
use crate::error::PortfolioResult;
use crate::risk_parity::risk_parity;
use crate::types::{
    align_returns, ComputeConfig, ConstraintConfig, CovarianceMatrix, ReturnVector, Weights,
};

/// An allocation strategy and its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Strategy {
    /// [`mean_variance`] with the given `λ`.
    MeanVariance {
        /// Risk aversion `λ`.
        risk_aversion: f64,
    },
    /// [`minimum_variance`].
    MinimumVariance,
    /// [`max_sharpe`] at the given risk-free rate.
    MaxSharpe {
        /// Risk-free rate per period.
        risk_free_rate: f64,
    },
    /// Equal risk contributions.
    RiskParity,
    /// `1/n` in every asset.
    EqualWeight,
}

impl Strategy {
    /// Short display name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::MeanVariance { .. } => "mean_variance",
            Self::MinimumVariance => "minimum_variance",
            Self::MaxSharpe { .. } => "max_sharpe",
            Self::RiskParity => "risk_parity",
            Self::EqualWeight => "equal_weight",
        }
    }

    /// The usual line-up: mean-variance at `risk_aversion`, minimum variance,
    /// max-Sharpe at `risk_free_rate`, risk parity and equal weight.
    #[must_use]
    pub fn standard_set(risk_aversion: f64, risk_free_rate: f64) -> Vec<Self> {
        vec![
            Self::MeanVariance { risk_aversion },
            Self::MinimumVariance,
            Self::MaxSharpe { risk_free_rate },
            Self::RiskParity,
            Self::EqualWeight,
        ]
    }
}

/// Weights and statistics of a solved strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyReport {
    /// Strategy weights.
    pub weights: Weights,
    /// Statistics of those weights.
    pub statistics: PortfolioStatistics,
    /// Weights were adjusted after solving (see [`max_sharpe`]).
    pub approximate: bool,
}

/// One strategy's outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyResult {
    /// [`Strategy::name`].
    pub name: &'static str,
    /// The strategy that was run.
    pub strategy: Strategy,
    /// Report, or why the strategy failed.
    pub outcome: PortfolioResult<StrategyReport>,
}

/// Runs every strategy in `strategies` against the same inputs.
///
/// Results come back in input order. `risk_free_rate` is used for the
/// Sharpe statistics of every strategy; max-Sharpe solves at its own rate.
/// Strategies run in parallel when `config` allows. Input alignment errors
/// fail the whole call.
pub fn compare_strategies(
    expected_returns: &ReturnVector,
    covariance: &CovarianceMatrix,
    strategies: &[Strategy],
    constraints: &ConstraintConfig,
    risk_free_rate: f64,
    config: &ComputeConfig,
) -> PortfolioResult<Vec<StrategyResult>> {
    let (returns, covariance) = align_returns(expected_returns, covariance)?;

    let results = maybe_parallel_map(strategies, config, |strategy| StrategyResult {
        name: strategy.name(),
        strategy: *strategy,
        outcome: run_strategy(strategy, &returns, &covariance, constraints, risk_free_rate, config),
    });

    for failed in results.iter().filter(|r| r.outcome.is_err()) {
        if let Err(err) = &failed.outcome {
            warn!(strategy = failed.name, error = %err, "strategy failed");
        }
    }
    debug!(strategies = results.len(), "strategy comparison finished");
    Ok(results)
}

fn run_strategy(
    strategy: &Strategy,
    returns: &ReturnVector,
    covariance: &CovarianceMatrix,
    constraints: &ConstraintConfig,
    risk_free_rate: f64,
    config: &ComputeConfig,
) -> PortfolioResult<StrategyReport> {
    let (weights, approximate) = match *strategy {
        Strategy::MeanVariance { risk_aversion } => {
            let allocation = mean_variance(returns, covariance, risk_aversion, constraints, config)?;
            (allocation.weights, allocation.approximate)
        }
        Strategy::MinimumVariance => {
            let allocation = minimum_variance(covariance, constraints, config)?;
            (allocation.weights, allocation.approximate)
        }
        Strategy::MaxSharpe { risk_free_rate } => {
            let allocation = max_sharpe(returns, covariance, risk_free_rate, constraints, config)?;
            (allocation.weights, allocation.approximate)
        }
        Strategy::RiskParity => {
            let weights = risk_parity(covariance, None, &config.risk_parity)?.into_result()?;
            (weights, false)
        }
        Strategy::EqualWeight => (Weights::equal(covariance.universe())?, false),
    };

    let statistics = portfolio_statistics(&weights, returns, covariance, risk_free_rate)?;
    Ok(StrategyReport {
        weights,
        statistics,
        approximate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PortfolioError;
    use approx::assert_relative_eq;

    fn covariance() -> CovarianceMatrix {
        CovarianceMatrix::from_rows(
            ["A", "B", "C"],
            &[
                vec![0.04, 0.01, 0.02],
                vec![0.01, 0.09, 0.03],
                vec![0.02, 0.03, 0.16],
            ],
        )
        .unwrap()
    }

    fn returns() -> ReturnVector {
        ReturnVector::from_pairs([("A", 0.08), ("B", 0.10), ("C", 0.12)]).unwrap()
    }

    #[test]
    fn test_standard_set_all_solve() {
        let results = compare_strategies(
            &returns(),
            &covariance(),
            &Strategy::standard_set(2.5, 0.02),
            &ConstraintConfig::default(),
            0.02,
            &ComputeConfig::default(),
        )
        .unwrap();

        let names: Vec<_> = results.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            ["mean_variance", "minimum_variance", "max_sharpe", "risk_parity", "equal_weight"]
        );
        for result in &results {
            let report = result.outcome.as_ref().unwrap();
            assert_relative_eq!(report.statistics.weights_sum, 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_min_variance_has_lowest_volatility() {
        let results = compare_strategies(
            &returns(),
            &covariance(),
            &Strategy::standard_set(2.5, 0.0),
            &ConstraintConfig::default(),
            0.0,
            &ComputeConfig::sequential(),
        )
        .unwrap();

        let vol = |name: &str| {
            results
                .iter()
                .find(|r| r.name == name)
                .and_then(|r| r.outcome.as_ref().ok())
                .map(|r| r.statistics.volatility)
                .unwrap()
        };
        let floor = vol("minimum_variance");
        for name in ["mean_variance", "max_sharpe", "risk_parity", "equal_weight"] {
            assert!(vol(name) >= floor - 1e-6, "{name} below minimum variance");
        }
    }

    #[test]
    fn test_failure_is_isolated() {
        // Every excess return is negative, so only max-Sharpe fails.
        let strategies = [Strategy::MaxSharpe { risk_free_rate: 0.5 }, Strategy::EqualWeight];
        let results = compare_strategies(
            &returns(),
            &covariance(),
            &strategies,
            &ConstraintConfig::default(),
            0.0,
            &ComputeConfig::default(),
        )
        .unwrap();

        assert!(results[0].outcome.is_err());
        let equal = results[1].outcome.as_ref().unwrap();
        assert_relative_eq!(equal.weights.get("B").unwrap(), 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_strategy_serde_tag() {
        let json = serde_json::to_string(&Strategy::MaxSharpe { risk_free_rate: 0.01 }).unwrap();
        assert_eq!(json, r#"{"strategy":"max_sharpe","risk_free_rate":0.01}"#);

        let parsed: Strategy = serde_json::from_str(r#"{"strategy":"risk_parity"}"#).unwrap();
        assert_eq!(parsed, Strategy::RiskParity);
    }

    #[test]
    fn test_disjoint_inputs_fail() {
        let other = ReturnVector::from_pairs([("X", 0.1)]).unwrap();
        let result = compare_strategies(
            &other,
            &covariance(),
            &[Strategy::EqualWeight],
            &ConstraintConfig::default(),
            0.0,
            &ComputeConfig::default(),
        );
        assert!(matches!(result, Err(PortfolioError::InsufficientData { .. })));
    }
}
