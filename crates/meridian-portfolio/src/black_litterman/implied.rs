//! Reverse optimization of equilibrium returns.

use crate::error::{PortfolioError, PortfolioResult};
use crate::types::{align_weights, CovarianceMatrix, ReturnVector, Weights};

/// Computes market-implied equilibrium returns `π = δ Σ w`.
///
/// Market weights are restricted to the assets they share with the
/// covariance and normalized to sum to one before use.
///
/// # Example
///
/// ```ignore
/// let prior = implied_returns(&market_caps, &covariance, DEFAULT_RISK_AVERSION)?;
/// ```
pub fn implied_returns(
    market_weights: &Weights,
    covariance: &CovarianceMatrix,
    risk_aversion: f64,
) -> PortfolioResult<ReturnVector> {
    if !risk_aversion.is_finite() {
        return Err(PortfolioError::invalid_input(format!(
            "risk aversion must be finite, got {risk_aversion}"
        )));
    }

    let (weights, covariance) = align_weights(market_weights, covariance)?;
    let weights = weights.normalized()?;
    let pi = covariance.matrix() * weights.values() * risk_aversion;

    ReturnVector::new(weights.universe().clone(), pi)
}

#[cfg(test)]
mod tests {
    use super::*;
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

    #[test]
    fn test_implied_returns() {
        let weights = Weights::from_pairs([("A", 0.5), ("B", 0.3), ("C", 0.2)]).unwrap();
        let pi = implied_returns(&weights, &covariance(), 2.5).unwrap();

        // Σw = [0.027, 0.038, 0.051]
        assert_relative_eq!(pi.get("A").unwrap(), 2.5 * 0.027, epsilon = 1e-12);
        assert_relative_eq!(pi.get("B").unwrap(), 2.5 * 0.038, epsilon = 1e-12);
        assert_relative_eq!(pi.get("C").unwrap(), 2.5 * 0.051, epsilon = 1e-12);
    }

    #[test]
    fn test_weights_are_normalized() {
        let caps = Weights::from_pairs([("A", 500.0), ("B", 300.0), ("C", 200.0)]).unwrap();
        let shares = Weights::from_pairs([("A", 0.5), ("B", 0.3), ("C", 0.2)]).unwrap();

        let from_caps = implied_returns(&caps, &covariance(), 2.5).unwrap();
        let from_shares = implied_returns(&shares, &covariance(), 2.5).unwrap();
        for (a, b) in from_caps.values().iter().zip(from_shares.values().iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_partial_overlap() {
        let weights = Weights::from_pairs([("C", 1.0), ("X", 3.0)]).unwrap();
        let pi = implied_returns(&weights, &covariance(), 1.0).unwrap();
        assert_eq!(pi.len(), 1);
        assert_relative_eq!(pi.get("C").unwrap(), 0.16, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_weights_rejected() {
        let weights = Weights::from_pairs([("A", 0.0), ("B", 0.0)]).unwrap();
        assert!(implied_returns(&weights, &covariance(), 2.5).is_err());
    }
}
