//! Investor views and their matrix encoding.
//!
//! A view is either absolute ("A returns 15%") or relative ("A outperforms
//! B by 2%"). A [`ViewSet`] is the encoded triple `(P, q, Ω)`:
//!
//! - `P`: pick matrix, one row per view, `1` at the referenced asset for an
//!   absolute view and `+1`/`-1` for a relative view
//! - `q`: per-view target return or outperformance
//! - `Ω`: diagonal view uncertainty, `Ωᵢ = τ · Pᵢ Σ Pᵢᵀ / confidenceᵢ`
//!
//! Confidence lies in `(0, 1]` and defaults to [`DEFAULT_CONFIDENCE`].
//! Every referenced asset is resolved against the covariance universe
//! before any matrix is built.

mod builder;

pub use builder::{build_absolute_views, build_relative_views, ViewSetBuilder};

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::types::AssetUniverse;

/// Confidence used for views that do not state one.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// A single investor view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum View {
    /// The asset returns `target`.
    Absolute {
        /// Referenced asset.
        asset: String,
        /// Expected return.
        target: f64,
        /// Confidence in `(0, 1]`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        confidence: Option<f64>,
    },
    /// `outperformer` beats `underperformer` by `spread`.
    Relative {
        /// Asset with the `+1` pick entry.
        outperformer: String,
        /// Asset with the `-1` pick entry.
        underperformer: String,
        /// Expected outperformance.
        spread: f64,
        /// Confidence in `(0, 1]`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        confidence: Option<f64>,
    },
}

impl View {
    /// Absolute view with the default confidence.
    #[must_use]
    pub fn absolute(asset: impl Into<String>, target: f64) -> Self {
        Self::Absolute {
            asset: asset.into(),
            target,
            confidence: None,
        }
    }

    /// Relative view with the default confidence.
    #[must_use]
    pub fn relative(
        outperformer: impl Into<String>,
        underperformer: impl Into<String>,
        spread: f64,
    ) -> Self {
        Self::Relative {
            outperformer: outperformer.into(),
            underperformer: underperformer.into(),
            spread,
            confidence: None,
        }
    }

    /// Sets the confidence.
    #[must_use]
    pub fn with_confidence(mut self, value: f64) -> Self {
        match &mut self {
            Self::Absolute { confidence, .. } | Self::Relative { confidence, .. } => {
                *confidence = Some(value);
            }
        }
        self
    }

    /// Stated confidence, or [`DEFAULT_CONFIDENCE`].
    #[must_use]
    pub fn confidence(&self) -> f64 {
        match self {
            Self::Absolute { confidence, .. } | Self::Relative { confidence, .. } => {
                confidence.unwrap_or(DEFAULT_CONFIDENCE)
            }
        }
    }

    /// Target return or outperformance.
    #[must_use]
    pub fn target(&self) -> f64 {
        match self {
            Self::Absolute { target, .. } => *target,
            Self::Relative { spread, .. } => *spread,
        }
    }

    /// Human-readable label, e.g. `A` or `A > B`.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Absolute { asset, .. } => asset.clone(),
            Self::Relative {
                outperformer,
                underperformer,
                ..
            } => format!("{outperformer} > {underperformer}"),
        }
    }
}

/// Encoded views `(P, q, Ω)` over a fixed asset universe.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSet {
    universe: AssetUniverse,
    views: Vec<View>,
    pick: DMatrix<f64>,
    targets: DVector<f64>,
    uncertainty: DVector<f64>,
}

impl ViewSet {
    /// The universe the pick matrix columns refer to.
    #[must_use]
    pub fn universe(&self) -> &AssetUniverse {
        &self.universe
    }

    /// The views, in row order.
    #[must_use]
    pub fn views(&self) -> &[View] {
        &self.views
    }

    /// Number of views.
    #[must_use]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// True when there are no views.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Pick matrix `P` (views × assets).
    #[must_use]
    pub fn pick_matrix(&self) -> &DMatrix<f64> {
        &self.pick
    }

    /// View targets `q`.
    #[must_use]
    pub fn targets(&self) -> &DVector<f64> {
        &self.targets
    }

    /// Diagonal of `Ω`.
    #[must_use]
    pub fn uncertainty(&self) -> &DVector<f64> {
        &self.uncertainty
    }

    /// `Ω` as a dense diagonal matrix.
    #[must_use]
    pub fn omega(&self) -> DMatrix<f64> {
        DMatrix::from_diagonal(&self.uncertainty)
    }
}
