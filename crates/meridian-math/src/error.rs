//! Error types for mathematical operations.

use thiserror::Error;

/// A specialized Result type for mathematical operations.
pub type MathResult<T> = Result<T, MathError>;

/// Errors that can occur during mathematical operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    /// Matrix is singular (not invertible).
    #[error("Singular matrix: cannot invert")]
    SingularMatrix,

    /// Matrix has a negative eigenvalue below the accepted tolerance.
    #[error("Matrix is not positive semi-definite (min eigenvalue: {min_eigenvalue:.3e})")]
    NotPositiveSemiDefinite {
        /// Smallest eigenvalue found.
        min_eigenvalue: f64,
    },

    /// Matrix is not symmetric within tolerance.
    #[error("Matrix is not symmetric: |a[{row},{col}] - a[{col},{row}]| = {difference:.3e}")]
    NotSymmetric {
        /// Row of the worst offending entry.
        row: usize,
        /// Column of the worst offending entry.
        col: usize,
        /// Absolute asymmetry.
        difference: f64,
    },

    /// Matrix dimensions are incompatible.
    #[error("Incompatible matrix dimensions: ({rows1}x{cols1}) and ({rows2}x{cols2})")]
    DimensionMismatch {
        /// Rows in first matrix.
        rows1: usize,
        /// Columns in first matrix.
        cols1: usize,
        /// Rows in second matrix.
        rows2: usize,
        /// Columns in second matrix.
        cols2: usize,
    },

    /// Insufficient data points for operation.
    #[error("Insufficient data: need at least {required}, got {actual}")]
    InsufficientData {
        /// Minimum required points.
        required: usize,
        /// Actual number of points.
        actual: usize,
    },

    /// Invalid input parameter.
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// Description of the invalid input.
        reason: String,
    },

    /// The conic solver could not be set up for the given problem data.
    #[error("Solver setup failed: {reason}")]
    SolverSetup {
        /// Description reported by the solver.
        reason: String,
    },
}

impl MathError {
    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Creates an insufficient data error.
    #[must_use]
    pub fn insufficient_data(required: usize, actual: usize) -> Self {
        Self::InsufficientData { required, actual }
    }

    /// Creates a solver setup error.
    #[must_use]
    pub fn solver_setup(reason: impl Into<String>) -> Self {
        Self::SolverSetup {
            reason: reason.into(),
        }
    }

    /// Creates a dimension mismatch error from two shapes.
    #[must_use]
    pub fn dimension_mismatch(left: (usize, usize), right: (usize, usize)) -> Self {
        Self::DimensionMismatch {
            rows1: left.0,
            cols1: left.1,
            rows2: right.0,
            cols2: right.1,
        }
    }
}
