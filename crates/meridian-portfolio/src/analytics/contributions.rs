//! Risk contribution analysis.
//!
//! Decomposes portfolio volatility into per-asset contributions:
//! `rcᵢ = wᵢ (Σw)ᵢ / σ`, which sum to `σ`.

use serde::{Deserialize, Serialize};

use crate::error::{PortfolioError, PortfolioResult};
use crate::types::{align_weights, CovarianceMatrix, Weights};

/// Contribution of a single asset to portfolio volatility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetContribution {
    /// Asset identifier.
    pub asset: String,

    /// Portfolio weight.
    pub weight: f64,

    /// Marginal contribution `(Σw)ᵢ / σ`.
    pub marginal: f64,

    /// Absolute contribution `wᵢ · marginal`.
    pub contribution: f64,

    /// Contribution as a fraction of volatility.
    pub fraction: f64,
}

/// Risk contribution report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskContributions {
    /// Contributions in universe order.
    pub by_asset: Vec<AssetContribution>,

    /// Portfolio volatility.
    pub volatility: f64,
}

impl RiskContributions {
    /// Fractional contributions in universe order.
    #[must_use]
    pub fn fractions(&self) -> Vec<f64> {
        self.by_asset.iter().map(|c| c.fraction).collect()
    }

    /// Sum of absolute contributions (equals the volatility).
    #[must_use]
    pub fn total(&self) -> f64 {
        self.by_asset.iter().map(|c| c.contribution).sum()
    }
}

/// Computes volatility contributions on the assets shared by both inputs.
///
/// Fails with [`PortfolioError::InvalidInput`] when the portfolio has zero
/// volatility, where contributions are undefined.
pub fn risk_contributions(
    weights: &Weights,
    covariance: &CovarianceMatrix,
) -> PortfolioResult<RiskContributions> {
    let (weights, covariance) = align_weights(weights, covariance)?;
    let w = weights.values();
    let sigma_w = covariance.matrix() * w;
    let variance = w.dot(&sigma_w);

    if variance.is_nan() || variance <= 0.0 {
        return Err(PortfolioError::invalid_input(
            "portfolio volatility is zero, risk contributions are undefined",
        ));
    }
    let volatility = variance.sqrt();

    let by_asset = weights
        .iter()
        .zip(sigma_w.iter())
        .map(|((asset, weight), &sw)| {
            let marginal = sw / volatility;
            let contribution = weight * marginal;
            AssetContribution {
                asset: asset.to_string(),
                weight,
                marginal,
                contribution,
                fraction: contribution / volatility,
            }
        })
        .collect();

    Ok(RiskContributions {
        by_asset,
        volatility,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_contributions_sum_to_volatility() {
        let cov = CovarianceMatrix::from_rows(
            ["A", "B", "C"],
            &[
                vec![0.04, 0.01, 0.02],
                vec![0.01, 0.09, 0.03],
                vec![0.02, 0.03, 0.16],
            ],
        )
        .unwrap();
        let weights = Weights::from_pairs([("A", 0.5), ("B", 0.3), ("C", 0.2)]).unwrap();
        let report = risk_contributions(&weights, &cov).unwrap();

        assert_relative_eq!(report.total(), report.volatility, epsilon = 1e-12);
        assert_relative_eq!(report.fractions().iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_uncorrelated_contributions() {
        let cov = CovarianceMatrix::from_rows(["A", "B"], &[vec![0.04, 0.0], vec![0.0, 0.01]]).unwrap();
        let weights = Weights::from_pairs([("A", 1.0 / 3.0), ("B", 2.0 / 3.0)]).unwrap();
        let report = risk_contributions(&weights, &cov).unwrap();

        // w²σ² equal for both assets: 0.04/9 and 0.04/9
        assert_relative_eq!(report.by_asset[0].fraction, 0.5, epsilon = 1e-12);
        assert_relative_eq!(report.by_asset[1].fraction, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_volatility() {
        let cov = CovarianceMatrix::from_rows(["A"], &[vec![0.0]]).unwrap();
        let weights = Weights::from_pairs([("A", 1.0)]).unwrap();
        assert!(risk_contributions(&weights, &cov).is_err());
    }
}
