//! Asset universes and the labelled vectors and matrices built on them.
//!
//! Every numeric input to the allocation pipeline is paired with an
//! [`AssetUniverse`]. Operations that combine two or three inputs first
//! restrict all of them to their common assets, in the order of the first
//! input, so that vector entries always line up with matrix rows.

use std::collections::HashMap;
use std::fmt;

use meridian_math::linear_algebra::{
    check_symmetric, covariance_diagnostics, nearest_psd, CovarianceDiagnostics,
    SYMMETRY_TOLERANCE,
};
use nalgebra::{DMatrix, DVector};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{PortfolioError, PortfolioResult};

/// Absolute weight above which a position counts as held.
pub const POSITION_THRESHOLD: f64 = 1e-4;

/// An ordered set of unique asset identifiers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct AssetUniverse {
    assets: Vec<String>,
    index: HashMap<String, usize>,
}

impl AssetUniverse {
    /// Creates a universe from identifiers, rejecting duplicates and blanks.
    pub fn new<I, S>(assets: I) -> PortfolioResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let assets: Vec<String> = assets.into_iter().map(Into::into).collect();
        let mut index = HashMap::with_capacity(assets.len());
        for (i, asset) in assets.iter().enumerate() {
            if asset.trim().is_empty() {
                return Err(PortfolioError::invalid_input(format!(
                    "asset identifier at position {i} is empty"
                )));
            }
            if index.insert(asset.clone(), i).is_some() {
                return Err(PortfolioError::invalid_input(format!(
                    "duplicate asset '{asset}'"
                )));
            }
        }
        Ok(Self { assets, index })
    }

    /// Number of assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// True when the universe holds no assets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Asset identifiers in order.
    #[must_use]
    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    /// Iterates over asset identifiers in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.assets.iter().map(String::as_str)
    }

    /// Position of `asset`, if present.
    #[must_use]
    pub fn index_of(&self, asset: &str) -> Option<usize> {
        self.index.get(asset).copied()
    }

    /// True when `asset` is part of the universe.
    #[must_use]
    pub fn contains(&self, asset: &str) -> bool {
        self.index.contains_key(asset)
    }

    /// Position of `asset`, or [`PortfolioError::UnknownAsset`].
    pub fn require(&self, asset: &str) -> PortfolioResult<usize> {
        self.index_of(asset)
            .ok_or_else(|| PortfolioError::unknown_asset(asset))
    }

    /// Assets present in both universes, in the order of `self`.
    #[must_use]
    pub fn intersect(&self, other: &AssetUniverse) -> AssetUniverse {
        let assets: Vec<String> = self
            .assets
            .iter()
            .filter(|a| other.contains(a))
            .cloned()
            .collect();
        let index = assets
            .iter()
            .enumerate()
            .map(|(i, a)| (a.clone(), i))
            .collect();
        AssetUniverse { assets, index }
    }

    /// Positions of `subset`'s assets within `self`.
    fn positions_of(&self, subset: &AssetUniverse) -> PortfolioResult<Vec<usize>> {
        subset.iter().map(|a| self.require(a)).collect()
    }
}

impl PartialEq for AssetUniverse {
    fn eq(&self, other: &Self) -> bool {
        self.assets == other.assets
    }
}

impl Eq for AssetUniverse {}

impl TryFrom<Vec<String>> for AssetUniverse {
    type Error = PortfolioError;

    fn try_from(assets: Vec<String>) -> PortfolioResult<Self> {
        Self::new(assets)
    }
}

impl From<AssetUniverse> for Vec<String> {
    fn from(universe: AssetUniverse) -> Self {
        universe.assets
    }
}

impl fmt::Display for AssetUniverse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.assets.join(", "))
    }
}

fn ensure_finite(values: &DVector<f64>, universe: &AssetUniverse, what: &str) -> PortfolioResult<()> {
    if let Some((i, v)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(PortfolioError::invalid_input(format!(
            "{what} for '{}' is not finite ({v})",
            universe.assets[i]
        )));
    }
    Ok(())
}

fn serialize_labelled<S: Serializer>(
    universe: &AssetUniverse,
    values: &DVector<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(universe.len()))?;
    for (asset, value) in universe.iter().zip(values.iter()) {
        map.serialize_entry(asset, value)?;
    }
    map.end()
}

macro_rules! labelled_vector {
    ($(#[$meta:meta])* $name:ident, $what:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            universe: AssetUniverse,
            values: DVector<f64>,
        }

        impl $name {
            #[doc = concat!("Creates a ", $what, " vector; every entry must be finite.")]
            pub fn new(universe: AssetUniverse, values: DVector<f64>) -> PortfolioResult<Self> {
                if universe.len() != values.len() {
                    return Err(PortfolioError::dimension_mismatch(universe.len(), values.len()));
                }
                ensure_finite(&values, &universe, $what)?;
                Ok(Self { universe, values })
            }

            /// Builds the vector from `(asset, value)` pairs in iteration order.
            pub fn from_pairs<I, S>(pairs: I) -> PortfolioResult<Self>
            where
                I: IntoIterator<Item = (S, f64)>,
                S: Into<String>,
            {
                let (assets, values): (Vec<String>, Vec<f64>) =
                    pairs.into_iter().map(|(a, v)| (a.into(), v)).unzip();
                Self::new(AssetUniverse::new(assets)?, DVector::from_vec(values))
            }

            /// The asset universe.
            #[must_use]
            pub fn universe(&self) -> &AssetUniverse {
                &self.universe
            }

            /// The raw values, ordered like [`Self::universe`].
            #[must_use]
            pub fn values(&self) -> &DVector<f64> {
                &self.values
            }

            /// Number of entries.
            #[must_use]
            pub fn len(&self) -> usize {
                self.values.len()
            }

            /// True when the vector is empty.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.values.is_empty()
            }

            /// Value for `asset`, if present.
            #[must_use]
            pub fn get(&self, asset: &str) -> Option<f64> {
                self.universe.index_of(asset).map(|i| self.values[i])
            }

            /// Iterates over `(asset, value)` pairs.
            pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
                self.universe.iter().zip(self.values.iter().copied())
            }

            /// Sum of all entries.
            #[must_use]
            pub fn sum(&self) -> f64 {
                self.values.sum()
            }

            /// Restricts and reorders the vector to `universe`.
            ///
            /// Every asset of `universe` must be present.
            pub fn restrict(&self, universe: &AssetUniverse) -> PortfolioResult<Self> {
                if *universe == self.universe {
                    return Ok(self.clone());
                }
                let positions = self.universe.positions_of(universe)?;
                let values = DVector::from_iterator(
                    positions.len(),
                    positions.iter().map(|&i| self.values[i]),
                );
                Ok(Self {
                    universe: universe.clone(),
                    values,
                })
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serialize_labelled(&self.universe, &self.values, serializer)
            }
        }
    };
}

labelled_vector!(
    /// Expected (or realized) return per asset.
    ReturnVector,
    "return"
);

labelled_vector!(
    /// Portfolio weight per asset.
    Weights,
    "weight"
);

impl Weights {
    /// Equal weights `1/n` over `universe`.
    pub fn equal(universe: &AssetUniverse) -> PortfolioResult<Self> {
        if universe.is_empty() {
            return Err(PortfolioError::insufficient_data(1, 0));
        }
        let n = universe.len();
        Self::new(universe.clone(), DVector::from_element(n, 1.0 / n as f64))
    }

    /// Weights scaled to sum to one.
    pub fn normalized(&self) -> PortfolioResult<Self> {
        let total = self.sum();
        if total.abs() < f64::EPSILON || !total.is_finite() {
            return Err(PortfolioError::invalid_input(format!(
                "weights sum to {total}, cannot normalize"
            )));
        }
        Ok(Self {
            universe: self.universe.clone(),
            values: &self.values / total,
        })
    }

    /// Number of positions with `|w| > 1e-4`.
    #[must_use]
    pub fn n_positions(&self) -> usize {
        self.values
            .iter()
            .filter(|w| w.abs() > POSITION_THRESHOLD)
            .count()
    }
}

/// A symmetric covariance matrix indexed by an [`AssetUniverse`] on both axes.
#[derive(Debug, Clone, PartialEq)]
pub struct CovarianceMatrix {
    universe: AssetUniverse,
    values: DMatrix<f64>,
}

impl CovarianceMatrix {
    /// Creates a covariance matrix.
    ///
    /// The matrix must be square, match the universe, contain only finite
    /// values and be symmetric within `1e-10`. Positive semi-definiteness is
    /// not checked here; see [`CovarianceMatrix::nearest_psd`].
    pub fn new(universe: AssetUniverse, values: DMatrix<f64>) -> PortfolioResult<Self> {
        if values.nrows() != universe.len() || values.ncols() != universe.len() {
            return Err(PortfolioError::dimension_mismatch(
                universe.len(),
                values.nrows().max(values.ncols()),
            ));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(PortfolioError::invalid_input(
                "covariance contains NaN or infinity",
            ));
        }
        check_symmetric(&values, SYMMETRY_TOLERANCE)?;
        Ok(Self { universe, values })
    }

    /// Builds a covariance matrix from row-major nested rows.
    pub fn from_rows<I, S>(assets: I, rows: &[Vec<f64>]) -> PortfolioResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let universe = AssetUniverse::new(assets)?;
        let n = universe.len();
        if rows.len() != n {
            return Err(PortfolioError::dimension_mismatch(n, rows.len()));
        }
        if let Some(row) = rows.iter().find(|r| r.len() != n) {
            return Err(PortfolioError::dimension_mismatch(n, row.len()));
        }
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        Self::new(universe, DMatrix::from_row_slice(n, n, &flat))
    }

    /// The asset universe.
    #[must_use]
    pub fn universe(&self) -> &AssetUniverse {
        &self.universe
    }

    /// The raw matrix, rows and columns ordered like [`Self::universe`].
    #[must_use]
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.values
    }

    /// Number of assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.universe.len()
    }

    /// True when the matrix is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.universe.is_empty()
    }

    /// Covariance between two assets.
    #[must_use]
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.universe.index_of(a)?;
        let j = self.universe.index_of(b)?;
        Some(self.values[(i, j)])
    }

    /// Restricts and reorders both axes to `universe`.
    pub fn restrict(&self, universe: &AssetUniverse) -> PortfolioResult<Self> {
        if *universe == self.universe {
            return Ok(self.clone());
        }
        let positions = self.universe.positions_of(universe)?;
        let n = positions.len();
        let values = DMatrix::from_fn(n, n, |i, j| self.values[(positions[i], positions[j])]);
        Ok(Self {
            universe: universe.clone(),
            values,
        })
    }

    /// Returns a repaired copy with eigenvalues floored at `epsilon`.
    pub fn nearest_psd(&self, epsilon: f64) -> PortfolioResult<Self> {
        Ok(Self {
            universe: self.universe.clone(),
            values: nearest_psd(&self.values, epsilon)?,
        })
    }

    /// Conditioning diagnostics for the matrix.
    pub fn diagnostics(&self) -> PortfolioResult<CovarianceDiagnostics> {
        Ok(covariance_diagnostics(&self.values)?)
    }
}

fn require_overlap(universe: AssetUniverse) -> PortfolioResult<AssetUniverse> {
    if universe.is_empty() {
        return Err(PortfolioError::insufficient_data(1, 0));
    }
    Ok(universe)
}

/// Restricts a return vector and a covariance matrix to their common assets.
///
/// The order of `returns` wins. Fails with
/// [`PortfolioError::InsufficientData`] when nothing overlaps.
pub fn align_returns(
    returns: &ReturnVector,
    covariance: &CovarianceMatrix,
) -> PortfolioResult<(ReturnVector, CovarianceMatrix)> {
    let common = require_overlap(returns.universe().intersect(covariance.universe()))?;
    Ok((returns.restrict(&common)?, covariance.restrict(&common)?))
}

/// Restricts weights and a covariance matrix to their common assets.
pub fn align_weights(
    weights: &Weights,
    covariance: &CovarianceMatrix,
) -> PortfolioResult<(Weights, CovarianceMatrix)> {
    let common = require_overlap(weights.universe().intersect(covariance.universe()))?;
    Ok((weights.restrict(&common)?, covariance.restrict(&common)?))
}

/// Restricts weights, returns and covariance to their three-way intersection.
pub fn align_all(
    weights: &Weights,
    returns: &ReturnVector,
    covariance: &CovarianceMatrix,
) -> PortfolioResult<(Weights, ReturnVector, CovarianceMatrix)> {
    let common = require_overlap(
        weights
            .universe()
            .intersect(returns.universe())
            .intersect(covariance.universe()),
    )?;
    Ok((
        weights.restrict(&common)?,
        returns.restrict(&common)?,
        covariance.restrict(&common)?,
    ))
}
