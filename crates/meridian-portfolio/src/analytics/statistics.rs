//! Portfolio statistics.
//!
//! Inputs are per-period (monthly) figures; annualized fields scale the
//! return by 12 and volatility and Sharpe by √12.

use meridian_math::linear_algebra::{quad_form, PERIODS_PER_YEAR};
use serde::{Deserialize, Serialize};

use crate::error::PortfolioResult;
use crate::types::{align_all, CovarianceMatrix, ReturnVector, Weights};

/// Scalar performance metrics for a weight vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioStatistics {
    /// Expected portfolio return `μᵀw`.
    pub expected_return: f64,

    /// Portfolio variance `wᵀΣw`.
    pub variance: f64,

    /// Portfolio volatility.
    pub volatility: f64,

    /// `(return - rf) / volatility`, or 0 when volatility is exactly 0.
    pub sharpe_ratio: f64,

    /// Return × 12.
    pub annual_return: f64,

    /// Volatility × √12.
    pub annual_volatility: f64,

    /// Sharpe × √12.
    pub annual_sharpe: f64,

    /// Sum of weights.
    pub weights_sum: f64,

    /// Positions with `|w| > 1e-4`.
    pub n_positions: usize,
}

/// Computes [`PortfolioStatistics`] on the assets shared by all three inputs.
pub fn portfolio_statistics(
    weights: &Weights,
    expected_returns: &ReturnVector,
    covariance: &CovarianceMatrix,
    risk_free_rate: f64,
) -> PortfolioResult<PortfolioStatistics> {
    let (weights, returns, covariance) = align_all(weights, expected_returns, covariance)?;
    let w = weights.values();

    let expected_return = returns.values().dot(w);
    let variance = quad_form(w, covariance.matrix());
    let volatility = variance.max(0.0).sqrt();
    let sharpe_ratio = if volatility > 0.0 {
        (expected_return - risk_free_rate) / volatility
    } else {
        0.0
    };

    let root_periods = PERIODS_PER_YEAR.sqrt();
    Ok(PortfolioStatistics {
        expected_return,
        variance,
        volatility,
        sharpe_ratio,
        annual_return: expected_return * PERIODS_PER_YEAR,
        annual_volatility: volatility * root_periods,
        annual_sharpe: sharpe_ratio * root_periods,
        weights_sum: weights.sum(),
        n_positions: weights.n_positions(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn covariance() -> CovarianceMatrix {
        CovarianceMatrix::from_rows(["A", "B"], &[vec![0.04, 0.0], vec![0.0, 0.09]]).unwrap()
    }

    #[test]
    fn test_statistics() {
        let weights = Weights::from_pairs([("A", 0.5), ("B", 0.5)]).unwrap();
        let returns = ReturnVector::from_pairs([("A", 0.01), ("B", 0.02)]).unwrap();
        let stats = portfolio_statistics(&weights, &returns, &covariance(), 0.005).unwrap();

        assert_relative_eq!(stats.expected_return, 0.015, epsilon = 1e-12);
        // 0.25 * 0.04 + 0.25 * 0.09
        assert_relative_eq!(stats.variance, 0.0325, epsilon = 1e-12);
        assert_relative_eq!(stats.volatility, 0.0325_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(
            stats.sharpe_ratio,
            0.01 / 0.0325_f64.sqrt(),
            epsilon = 1e-12
        );
        assert_relative_eq!(stats.annual_return, 0.18, epsilon = 1e-12);
        assert_relative_eq!(
            stats.annual_sharpe,
            stats.sharpe_ratio * 12f64.sqrt(),
            epsilon = 1e-12
        );
        assert_relative_eq!(stats.weights_sum, 1.0);
        assert_eq!(stats.n_positions, 2);
    }

    #[test]
    fn test_zero_volatility_sharpe() {
        let cov = CovarianceMatrix::from_rows(["A"], &[vec![0.0]]).unwrap();
        let weights = Weights::from_pairs([("A", 1.0)]).unwrap();
        let returns = ReturnVector::from_pairs([("A", 0.03)]).unwrap();
        let stats = portfolio_statistics(&weights, &returns, &cov, 0.0).unwrap();

        assert_eq!(stats.volatility, 0.0);
        assert_eq!(stats.sharpe_ratio, 0.0);
        assert_eq!(stats.annual_sharpe, 0.0);
    }

    #[test]
    fn test_statistics_align_inputs() {
        let weights = Weights::from_pairs([("B", 1.0), ("X", 0.5)]).unwrap();
        let returns = ReturnVector::from_pairs([("A", 0.01), ("B", 0.02)]).unwrap();
        let stats = portfolio_statistics(&weights, &returns, &covariance(), 0.0).unwrap();

        assert_relative_eq!(stats.expected_return, 0.02, epsilon = 1e-12);
        assert_relative_eq!(stats.variance, 0.09, epsilon = 1e-12);
        assert_eq!(stats.n_positions, 1);
    }
}
