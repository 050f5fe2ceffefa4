//! Linear constraint rows shared by the weight optimizers.

use meridian_math::optimization::ConicProblem;
use nalgebra::{DMatrix, DVector};
use tracing::trace;

use crate::error::PortfolioResult;
use crate::types::{AssetUniverse, ConstraintConfig};

/// Rows of a linear system `A x (= or <=) b`, accumulated one at a time.
#[derive(Debug, Clone)]
pub(crate) struct LinearRows {
    width: usize,
    coefficients: Vec<f64>,
    rhs: Vec<f64>,
}

impl LinearRows {
    pub(crate) fn new(width: usize) -> Self {
        Self {
            width,
            coefficients: Vec::new(),
            rhs: Vec::new(),
        }
    }

    /// Appends a dense row; `row` must have `width` entries.
    pub(crate) fn push(&mut self, row: &[f64], rhs: f64) {
        debug_assert_eq!(row.len(), self.width);
        self.coefficients.extend_from_slice(row);
        self.rhs.push(rhs);
    }

    /// Appends `scale · x[index] (= or <=) rhs`.
    pub(crate) fn push_unit(&mut self, index: usize, scale: f64, rhs: f64) {
        let start = self.coefficients.len();
        self.coefficients.resize(start + self.width, 0.0);
        self.coefficients[start + index] = scale;
        self.rhs.push(rhs);
    }

    pub(crate) fn len(&self) -> usize {
        self.rhs.len()
    }

    pub(crate) fn into_parts(self) -> (DMatrix<f64>, DVector<f64>) {
        let rows = self.rhs.len();
        (
            DMatrix::from_row_slice(rows, self.width, &self.coefficients),
            DVector::from_vec(self.rhs),
        )
    }
}

/// Equality and inequality rows over the weight vector.
#[derive(Debug, Clone)]
pub(crate) struct WeightConstraints {
    pub(crate) equalities: LinearRows,
    pub(crate) inequalities: LinearRows,
}

impl WeightConstraints {
    /// Budget, pinning, long-only and box rows for `config`.
    ///
    /// Pinned assets are resolved eagerly; an unknown one fails with
    /// [`PortfolioError::UnknownAsset`](crate::PortfolioError::UnknownAsset).
    pub(crate) fn from_config(
        universe: &AssetUniverse,
        config: &ConstraintConfig,
    ) -> PortfolioResult<Self> {
        config.validate()?;
        let n = universe.len();

        let mut equalities = LinearRows::new(n);
        equalities.push(&vec![1.0; n], config.leverage);
        for (asset, &target) in &config.target_weights {
            equalities.push_unit(universe.require(asset)?, 1.0, target);
        }

        let mut inequalities = LinearRows::new(n);
        for i in 0..n {
            if config.long_only {
                inequalities.push_unit(i, -1.0, 0.0);
            }
            if config.has_max_weight() {
                inequalities.push_unit(i, 1.0, config.max_weight);
            }
            if config.has_min_weight() {
                inequalities.push_unit(i, -1.0, -config.min_weight);
            }
        }

        trace!(
            equalities = equalities.len(),
            inequalities = inequalities.len(),
            "built weight constraints"
        );
        Ok(Self {
            equalities,
            inequalities,
        })
    }

    /// Attaches the rows to `problem`.
    pub(crate) fn apply(self, problem: ConicProblem) -> ConicProblem {
        let (a_eq, b_eq) = self.equalities.into_parts();
        let (a_in, b_in) = self.inequalities.into_parts();
        problem
            .with_equalities(a_eq, b_eq)
            .with_inequalities(a_in, b_in)
    }
}
