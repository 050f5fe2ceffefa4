//! Error types for allocation and posterior synthesis.
//!
//! This module defines the error types used throughout the portfolio crate.

use std::time::Duration;

use meridian_math::MathError;
use thiserror::Error;

/// Result type for portfolio operations.
pub type PortfolioResult<T> = Result<T, PortfolioError>;

/// Errors that can occur during portfolio operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PortfolioError {
    /// A view or constraint references an asset outside the active universe.
    #[error("Unknown asset '{asset}': not in the active universe")]
    UnknownAsset {
        /// The asset identifier.
        asset: String,
    },

    /// Fewer inputs than the operation requires.
    #[error("Insufficient data: need at least {required}, got {actual}")]
    InsufficientData {
        /// Minimum required count.
        required: usize,
        /// Actual count.
        actual: usize,
    },

    /// A required inversion failed.
    #[error("Singular matrix in {context}")]
    SingularMatrix {
        /// Which matrix could not be inverted.
        context: String,
    },

    /// The convex solver finished with a status that cannot be used.
    #[error("Optimization failed: {status}")]
    InfeasibleOptimization {
        /// Raw solver status.
        status: String,
    },

    /// The risk parity iteration did not reach its tolerance.
    #[error("Risk parity did not converge after {iterations} iterations (max change: {max_change:.2e})")]
    NonConvergence {
        /// Iterations performed.
        iterations: usize,
        /// Largest weight change in the final iteration.
        max_change: f64,
    },

    /// The solver hit its wall-clock limit.
    #[error("Solver timed out after {limit:?}")]
    SolverTimeout {
        /// The configured limit.
        limit: Duration,
    },

    /// Invalid input parameter.
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// Description of the invalid input.
        reason: String,
    },

    /// Vector or matrix sizes disagree.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected size.
        expected: usize,
        /// Actual size.
        actual: usize,
    },

    /// A covariance matrix has a materially negative eigenvalue.
    #[error("Covariance is not positive semi-definite (min eigenvalue: {min_eigenvalue:.3e})")]
    NotPositiveSemiDefinite {
        /// Smallest eigenvalue found.
        min_eigenvalue: f64,
    },

    /// Calculation failed for a reason not covered above.
    #[error("Calculation failed: {reason}")]
    CalculationFailed {
        /// The reason the calculation failed.
        reason: String,
    },
}

impl PortfolioError {
    /// Create an unknown asset error.
    #[must_use]
    pub fn unknown_asset(asset: impl Into<String>) -> Self {
        Self::UnknownAsset {
            asset: asset.into(),
        }
    }

    /// Create an insufficient data error.
    #[must_use]
    pub fn insufficient_data(required: usize, actual: usize) -> Self {
        Self::InsufficientData { required, actual }
    }

    /// Create a singular matrix error.
    #[must_use]
    pub fn singular(context: impl Into<String>) -> Self {
        Self::SingularMatrix {
            context: context.into(),
        }
    }

    /// Create an infeasible optimization error.
    #[must_use]
    pub fn infeasible(status: impl Into<String>) -> Self {
        Self::InfeasibleOptimization {
            status: status.into(),
        }
    }

    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Create a dimension mismatch error.
    #[must_use]
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    /// Create a calculation failed error.
    #[must_use]
    pub fn calculation_failed(reason: impl Into<String>) -> Self {
        Self::CalculationFailed {
            reason: reason.into(),
        }
    }

    /// Attaches a context label to a [`PortfolioError::SingularMatrix`].
    ///
    /// Other variants pass through unchanged.
    #[must_use]
    pub fn in_context(self, context: &str) -> Self {
        match self {
            Self::SingularMatrix { .. } => Self::singular(context),
            other => other,
        }
    }
}

impl From<MathError> for PortfolioError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::SingularMatrix => Self::singular("matrix inversion"),
            MathError::NotPositiveSemiDefinite { min_eigenvalue } => {
                Self::NotPositiveSemiDefinite { min_eigenvalue }
            }
            MathError::NotSymmetric { row, col, difference } => Self::invalid_input(format!(
                "covariance is not symmetric at ({row}, {col}), difference {difference:.3e}"
            )),
            MathError::DimensionMismatch {
                rows1,
                cols1,
                rows2,
                cols2,
            } => Self::dimension_mismatch(rows2 * cols2, rows1 * cols1),
            MathError::InsufficientData { required, actual } => {
                Self::InsufficientData { required, actual }
            }
            MathError::InvalidInput { reason } => Self::InvalidInput { reason },
            MathError::SolverSetup { reason } => Self::CalculationFailed { reason },
        }
    }
}
