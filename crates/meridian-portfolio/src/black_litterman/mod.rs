//! Black-Litterman posterior synthesis.
//!
//! Blends a prior (equilibrium) return vector with a [`ViewSet`] using the
//! master formula
//!
//! ```text
//! M      = (τΣ)⁻¹ + Pᵀ Ω⁻¹ P
//! Σ_post = M⁻¹
//! μ_post = M⁻¹ [(τΣ)⁻¹ π + Pᵀ Ω⁻¹ q]
//! ```
//!
//! Without views the posterior is the prior, copied unchanged.

mod deviations;
mod implied;

pub use deviations::{view_deviations, ViewDeviation};
pub use implied::implied_returns;

use meridian_math::linear_algebra::{invert, invert_positive_diagonal, symmetrize};
use nalgebra::DMatrix;
use tracing::debug;

use crate::error::{PortfolioError, PortfolioResult};
use crate::types::{align_returns, AssetUniverse, CovarianceMatrix, ReturnVector};
use crate::views::ViewSet;

/// Default prior uncertainty scale.
pub const DEFAULT_TAU: f64 = 0.025;

/// Default market risk aversion `δ`.
pub const DEFAULT_RISK_AVERSION: f64 = 2.5;

/// Posterior mean and covariance, over the same universe as the prior.
#[derive(Debug, Clone, PartialEq)]
pub struct PosteriorDistribution {
    /// Posterior expected returns.
    pub mean: ReturnVector,
    /// Posterior covariance `M⁻¹`.
    pub covariance: CovarianceMatrix,
}

/// Blends `prior` with `views` under covariance `covariance`.
///
/// The prior and covariance are first restricted to their common assets,
/// in the prior's order. Pick-matrix columns are matched to that universe
/// by asset name, so the view set may be built over the full covariance.
///
/// # Errors
///
/// - [`PortfolioError::SingularMatrix`] when `τΣ`, `Ω` or `M` cannot be
///   inverted
/// - [`PortfolioError::UnknownAsset`] when a view references an asset
///   outside the aligned prior
/// - [`PortfolioError::InvalidInput`] for a non-positive `tau`
pub fn synthesize(
    prior: &ReturnVector,
    covariance: &CovarianceMatrix,
    tau: f64,
    views: Option<&ViewSet>,
) -> PortfolioResult<PosteriorDistribution> {
    let (prior, covariance) = align_returns(prior, covariance)?;

    let Some(views) = views.filter(|v| !v.is_empty()) else {
        return Ok(PosteriorDistribution {
            mean: prior,
            covariance,
        });
    };

    if !(tau.is_finite() && tau > 0.0) {
        return Err(PortfolioError::invalid_input(format!(
            "tau must be positive, got {tau}"
        )));
    }

    let sigma = covariance.matrix();
    let pi = prior.values();
    let p = &aligned_pick_matrix(views, prior.universe())?;

    let tau_sigma_inv =
        invert(&(sigma * tau)).map_err(|e| PortfolioError::from(e).in_context("tau * covariance"))?;
    let omega_inv = invert_positive_diagonal(views.uncertainty())
        .map_err(|e| PortfolioError::from(e).in_context("view uncertainty"))?;

    let pt_omega_inv = p.transpose() * omega_inv;
    let m = &tau_sigma_inv + &pt_omega_inv * p;
    let m_inv = symmetrize(
        &invert(&m).map_err(|e| PortfolioError::from(e).in_context("posterior precision"))?,
    );

    let mean = &m_inv * (&tau_sigma_inv * pi + &pt_omega_inv * views.targets());

    debug!(
        assets = prior.len(),
        views = views.len(),
        tau,
        "synthesized posterior"
    );

    Ok(PosteriorDistribution {
        mean: ReturnVector::new(prior.universe().clone(), mean)?,
        covariance: CovarianceMatrix::new(prior.universe().clone(), m_inv)?,
    })
}

/// Reorders the pick matrix columns onto `universe`.
fn aligned_pick_matrix(views: &ViewSet, universe: &AssetUniverse) -> PortfolioResult<DMatrix<f64>> {
    let source = views.pick_matrix();
    if views.universe() == universe {
        return Ok(source.clone());
    }

    let mut pick = DMatrix::zeros(source.nrows(), universe.len());
    for (column, asset) in views.universe().iter().enumerate() {
        let entries = source.column(column);
        match universe.index_of(asset) {
            Some(target) => pick.set_column(target, &entries),
            None if entries.iter().any(|v| *v != 0.0) => {
                return Err(PortfolioError::unknown_asset(asset));
            }
            None => {}
        }
    }
    Ok(pick)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::{View, ViewSetBuilder};
    use approx::assert_relative_eq;

    fn prior() -> ReturnVector {
        ReturnVector::from_pairs([("A", 0.08), ("B", 0.10), ("C", 0.12)]).unwrap()
    }

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

    fn posterior_a(confidence: f64) -> f64 {
        let cov = covariance();
        let views = ViewSetBuilder::new(&cov, DEFAULT_TAU)
            .view(View::absolute("A", 0.15).with_confidence(confidence))
            .build()
            .unwrap();
        let posterior = synthesize(&prior(), &cov, DEFAULT_TAU, Some(&views)).unwrap();
        posterior.mean.get("A").unwrap()
    }

    #[test]
    fn test_no_views_is_identity() {
        let posterior = synthesize(&prior(), &covariance(), DEFAULT_TAU, None).unwrap();
        assert_eq!(posterior.mean, prior());
        assert_eq!(posterior.covariance, covariance());
    }

    #[test]
    fn test_single_view_pulls_toward_target() {
        let a = posterior_a(0.5);
        assert!(a > 0.08 && a < 0.15, "posterior {a}");
    }

    #[test]
    fn test_confidence_monotonicity() {
        let low = posterior_a(0.1);
        let mid = posterior_a(0.5);
        let high = posterior_a(0.9);
        assert!((0.15 - high).abs() < (0.15 - mid).abs());
        assert!((0.15 - mid).abs() < (0.15 - low).abs());
    }

    #[test]
    fn test_single_asset_closed_form() {
        // One asset: μ = (π/(τσ²) + q/ω) / (1/(τσ²) + 1/ω) with ω = τσ²/c.
        let prior = ReturnVector::from_pairs([("A", 0.05)]).unwrap();
        let cov = CovarianceMatrix::from_rows(["A"], &[vec![0.04]]).unwrap();
        let views = ViewSetBuilder::new(&cov, 0.1)
            .view(View::absolute("A", 0.10).with_confidence(0.5))
            .build()
            .unwrap();
        let posterior = synthesize(&prior, &cov, 0.1, Some(&views)).unwrap();

        // Precisions 1/(0.004) = 250 and 1/(0.008) = 125.
        let expected = (250.0 * 0.05 + 125.0 * 0.10) / 375.0;
        assert_relative_eq!(posterior.mean.get("A").unwrap(), expected, epsilon = 1e-12);
        assert_relative_eq!(posterior.covariance.matrix()[(0, 0)], 1.0 / 375.0, epsilon = 1e-12);
    }

    #[test]
    fn test_posterior_covariance_is_symmetric_pd() {
        let cov = covariance();
        let views = ViewSetBuilder::new(&cov, DEFAULT_TAU)
            .absolute("A", 0.15)
            .relative("C", "B", 0.03)
            .build()
            .unwrap();
        let posterior = synthesize(&prior(), &cov, DEFAULT_TAU, Some(&views)).unwrap();

        let m = posterior.covariance.matrix();
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(m[(i, j)], m[(j, i)], epsilon = 1e-15);
            }
        }
        assert!(m.clone().cholesky().is_some());
    }

    #[test]
    fn test_singular_covariance() {
        let prior = ReturnVector::from_pairs([("A", 0.05), ("B", 0.06)]).unwrap();
        let cov = CovarianceMatrix::from_rows(["A", "B"], &[vec![1.0, 1.0], vec![1.0, 1.0]]).unwrap();
        let views = ViewSetBuilder::new(&cov, DEFAULT_TAU)
            .absolute("A", 0.1)
            .build()
            .unwrap();
        let result = synthesize(&prior, &cov, DEFAULT_TAU, Some(&views));
        assert!(matches!(result, Err(PortfolioError::SingularMatrix { .. })));
    }

    #[test]
    fn test_zero_uncertainty_is_singular() {
        let prior = ReturnVector::from_pairs([("A", 0.05), ("B", 0.06)]).unwrap();
        let cov =
            CovarianceMatrix::from_rows(["A", "B"], &[vec![0.0, 0.0], vec![0.0, 0.04]]).unwrap();
        let views = ViewSetBuilder::new(&cov, DEFAULT_TAU)
            .absolute("A", 0.1)
            .build()
            .unwrap();
        let result = synthesize(&prior, &cov, DEFAULT_TAU, Some(&views));
        assert!(matches!(result, Err(PortfolioError::SingularMatrix { .. })));
    }

    #[test]
    fn test_reordered_prior_matches_covariance_order() {
        let cov = covariance();
        let views = ViewSetBuilder::new(&cov, DEFAULT_TAU)
            .absolute("A", 0.15)
            .build()
            .unwrap();
        let shuffled = ReturnVector::from_pairs([("B", 0.10), ("A", 0.08), ("C", 0.12)]).unwrap();

        let reference = synthesize(&prior(), &cov, DEFAULT_TAU, Some(&views)).unwrap();
        let posterior = synthesize(&shuffled, &cov, DEFAULT_TAU, Some(&views)).unwrap();

        assert_eq!(posterior.mean.universe().assets(), ["B", "A", "C"]);
        for asset in ["A", "B", "C"] {
            assert_relative_eq!(
                posterior.mean.get(asset).unwrap(),
                reference.mean.get(asset).unwrap(),
                epsilon = 1e-12
            );
        }
        assert_relative_eq!(
            posterior.covariance.get("A", "C").unwrap(),
            reference.covariance.get("A", "C").unwrap(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_subset_prior_drops_unviewed_columns() {
        let cov = covariance();
        let views = ViewSetBuilder::new(&cov, DEFAULT_TAU)
            .absolute("A", 0.15)
            .build()
            .unwrap();
        let partial = ReturnVector::from_pairs([("A", 0.08), ("B", 0.10)]).unwrap();

        let posterior = synthesize(&partial, &cov, DEFAULT_TAU, Some(&views)).unwrap();

        assert_eq!(posterior.mean.universe().assets(), ["A", "B"]);
        let a = posterior.mean.get("A").unwrap();
        assert!(a > 0.08 && a < 0.15, "posterior {a}");
    }

    #[test]
    fn test_view_outside_prior_is_unknown_asset() {
        let cov = covariance();
        let views = ViewSetBuilder::new(&cov, DEFAULT_TAU)
            .relative("C", "B", 0.02)
            .build()
            .unwrap();
        let partial = ReturnVector::from_pairs([("A", 0.08), ("B", 0.10)]).unwrap();

        let result = synthesize(&partial, &cov, DEFAULT_TAU, Some(&views));
        assert!(matches!(result, Err(PortfolioError::UnknownAsset { ref asset }) if asset == "C"));
    }
}
