//! View set construction.

use std::collections::{HashMap, HashSet};

use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

use super::{View, ViewSet};
use crate::error::{PortfolioError, PortfolioResult};
use crate::types::CovarianceMatrix;

/// Builder for a [`ViewSet`] mixing absolute and relative views.
///
/// # Example
///
/// ```ignore
/// let views = ViewSetBuilder::new(&covariance, 0.025)
///     .absolute("A", 0.15)
///     .view(View::relative("B", "C", 0.02).with_confidence(0.8))
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct ViewSetBuilder<'a> {
    covariance: &'a CovarianceMatrix,
    tau: f64,
    views: Vec<View>,
}

impl<'a> ViewSetBuilder<'a> {
    /// Starts an empty view set over the covariance universe.
    #[must_use]
    pub fn new(covariance: &'a CovarianceMatrix, tau: f64) -> Self {
        Self {
            covariance,
            tau,
            views: Vec::new(),
        }
    }

    /// Adds an absolute view with the default confidence.
    #[must_use]
    pub fn absolute(self, asset: impl Into<String>, target: f64) -> Self {
        self.view(View::absolute(asset, target))
    }

    /// Adds a relative view with the default confidence.
    #[must_use]
    pub fn relative(
        self,
        outperformer: impl Into<String>,
        underperformer: impl Into<String>,
        spread: f64,
    ) -> Self {
        self.view(View::relative(outperformer, underperformer, spread))
    }

    /// Adds a view.
    #[must_use]
    pub fn view(mut self, view: View) -> Self {
        self.views.push(view);
        self
    }

    /// Adds several views.
    #[must_use]
    pub fn views(mut self, views: impl IntoIterator<Item = View>) -> Self {
        self.views.extend(views);
        self
    }

    /// Encodes the views.
    ///
    /// Every referenced asset is resolved before any matrix is built, so an
    /// unknown asset fails with [`PortfolioError::UnknownAsset`] regardless
    /// of its position.
    pub fn build(self) -> PortfolioResult<ViewSet> {
        if !(self.tau.is_finite() && self.tau > 0.0) {
            return Err(PortfolioError::invalid_input(format!(
                "tau must be positive, got {}",
                self.tau
            )));
        }

        let universe = self.covariance.universe();
        let rows = self
            .views
            .iter()
            .map(|view| resolve(view, |asset| universe.require(asset)))
            .collect::<PortfolioResult<Vec<_>>>()?;

        let k = rows.len();
        let n = universe.len();
        let sigma = self.covariance.matrix();
        let mut pick = DMatrix::zeros(k, n);
        let mut targets = DVector::zeros(k);
        let mut uncertainty = DVector::zeros(k);

        for (row, (view, entries)) in self.views.iter().zip(&rows).enumerate() {
            let mut variance = 0.0;
            for &(i, pi) in entries {
                pick[(row, i)] = pi;
                for &(j, pj) in entries {
                    variance += pi * pj * sigma[(i, j)];
                }
            }
            targets[row] = view.target();
            uncertainty[row] = self.tau * variance / view.confidence();
        }

        debug!(views = k, assets = n, tau = self.tau, "encoded view set");

        Ok(ViewSet {
            universe: universe.clone(),
            views: self.views,
            pick,
            targets,
            uncertainty,
        })
    }
}

/// Validates a view and returns its non-zero pick entries.
fn resolve<F>(view: &View, index_of: F) -> PortfolioResult<Vec<(usize, f64)>>
where
    F: Fn(&str) -> PortfolioResult<usize>,
{
    let confidence = view.confidence();
    if !(confidence.is_finite() && confidence > 0.0 && confidence <= 1.0) {
        return Err(PortfolioError::invalid_input(format!(
            "confidence for view '{}' must lie in (0, 1], got {confidence}",
            view.label()
        )));
    }
    if !view.target().is_finite() {
        return Err(PortfolioError::invalid_input(format!(
            "target for view '{}' is not finite",
            view.label()
        )));
    }

    match view {
        View::Absolute { asset, .. } => Ok(vec![(index_of(asset)?, 1.0)]),
        View::Relative {
            outperformer,
            underperformer,
            ..
        } => {
            let long = index_of(outperformer)?;
            let short = index_of(underperformer)?;
            if long == short {
                return Err(PortfolioError::invalid_input(format!(
                    "relative view compares '{outperformer}' with itself"
                )));
            }
            Ok(vec![(long, 1.0), (short, -1.0)])
        }
    }
}

/// Encodes absolute views `asset → expected return`.
///
/// Views without an entry in `confidences` use the default confidence.
/// Confidences naming an asset without a view are ignored.
pub fn build_absolute_views<I, S>(
    covariance: &CovarianceMatrix,
    tau: f64,
    views: I,
    confidences: Option<&HashMap<String, f64>>,
) -> PortfolioResult<ViewSet>
where
    I: IntoIterator<Item = (S, f64)>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    let mut builder = ViewSetBuilder::new(covariance, tau);
    for (asset, target) in views {
        let asset = asset.into();
        let mut view = View::absolute(asset.clone(), target);
        if let Some(&c) = confidences.and_then(|map| map.get(&asset)) {
            view = view.with_confidence(c);
        }
        seen.insert(asset);
        builder = builder.view(view);
    }

    if let Some(map) = confidences {
        for asset in map.keys().filter(|a| !seen.contains(*a)) {
            warn!(asset = %asset, "ignoring confidence for asset without a view");
        }
    }
    builder.build()
}

/// Encodes relative views `(outperformer, underperformer) → outperformance`.
///
/// Views without an entry in `confidences` use the default confidence.
/// Confidences naming a pair without a view are ignored.
pub fn build_relative_views<I, S>(
    covariance: &CovarianceMatrix,
    tau: f64,
    views: I,
    confidences: Option<&HashMap<(String, String), f64>>,
) -> PortfolioResult<ViewSet>
where
    I: IntoIterator<Item = ((S, S), f64)>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    let mut builder = ViewSetBuilder::new(covariance, tau);
    for ((outperformer, underperformer), spread) in views {
        let pair = (outperformer.into(), underperformer.into());
        let mut view = View::relative(pair.0.clone(), pair.1.clone(), spread);
        if let Some(&c) = confidences.and_then(|map| map.get(&pair)) {
            view = view.with_confidence(c);
        }
        seen.insert(pair);
        builder = builder.view(view);
    }

    if let Some(map) = confidences {
        for (a, b) in map.keys().filter(|pair| !seen.contains(*pair)) {
            warn!(outperformer = %a, underperformer = %b, "ignoring confidence for pair without a view");
        }
    }
    builder.build()
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
    fn test_absolute_encoding() {
        let cov = covariance();
        let views = build_absolute_views(&cov, 0.025, [("B", 0.12)], None).unwrap();

        assert_eq!(views.len(), 1);
        assert_eq!(views.pick_matrix().shape(), (1, 3));
        assert_relative_eq!(views.pick_matrix()[(0, 1)], 1.0);
        assert_relative_eq!(views.pick_matrix()[(0, 0)], 0.0);
        assert_relative_eq!(views.targets()[0], 0.12);
        // 0.025 * 0.09 / 0.5
        assert_relative_eq!(views.uncertainty()[0], 0.0045, epsilon = 1e-15);
    }

    #[test]
    fn test_relative_encoding() {
        let cov = covariance();
        let mut confidences = HashMap::new();
        confidences.insert(("A".to_string(), "C".to_string()), 0.25);

        let views =
            build_relative_views(&cov, 0.025, [(("A", "C"), 0.03)], Some(&confidences)).unwrap();

        assert_relative_eq!(views.pick_matrix()[(0, 0)], 1.0);
        assert_relative_eq!(views.pick_matrix()[(0, 2)], -1.0);
        // τ (σ_AA + σ_CC - 2σ_AC) / c = 0.025 * 0.16 / 0.25
        assert_relative_eq!(views.uncertainty()[0], 0.016, epsilon = 1e-15);
    }

    #[test]
    fn test_mixed_views() {
        let cov = covariance();
        let views = ViewSetBuilder::new(&cov, 0.05)
            .absolute("A", 0.1)
            .relative("B", "A", 0.02)
            .view(View::absolute("C", 0.2).with_confidence(1.0))
            .build()
            .unwrap();

        assert_eq!(views.len(), 3);
        assert_relative_eq!(views.pick_matrix()[(1, 1)], 1.0);
        assert_relative_eq!(views.pick_matrix()[(1, 0)], -1.0);
        assert_relative_eq!(views.uncertainty()[2], 0.05 * 0.16, epsilon = 1e-15);
        assert_relative_eq!(views.omega()[(2, 2)], views.uncertainty()[2]);
    }

    #[test]
    fn test_unknown_asset_fails_eagerly() {
        let cov = covariance();
        let result = ViewSetBuilder::new(&cov, 0.025)
            .absolute("A", 0.1)
            .relative("B", "ZZZ", 0.02)
            .build();
        assert_eq!(result.unwrap_err(), PortfolioError::unknown_asset("ZZZ"));
    }

    #[test]
    fn test_confidence_bounds() {
        let cov = covariance();
        for bad in [0.0, -0.1, 1.5, f64::NAN] {
            let result = ViewSetBuilder::new(&cov, 0.025)
                .view(View::absolute("A", 0.1).with_confidence(bad))
                .build();
            assert!(matches!(result, Err(PortfolioError::InvalidInput { .. })));
        }
    }

    #[test]
    fn test_invalid_tau_and_self_relative() {
        let cov = covariance();
        assert!(ViewSetBuilder::new(&cov, 0.0).absolute("A", 0.1).build().is_err());
        assert!(ViewSetBuilder::new(&cov, 0.025)
            .relative("A", "A", 0.1)
            .build()
            .is_err());
    }

    #[test]
    fn test_unused_confidence_is_ignored() {
        let cov = covariance();
        let mut confidences = HashMap::new();
        confidences.insert("C".to_string(), 0.9);

        let views = build_absolute_views(&cov, 0.025, [("A", 0.15)], Some(&confidences)).unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views.views()[0].confidence(), 0.5);
    }
}
