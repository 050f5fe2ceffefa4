//! Covariance matrix utilities.
//!
//! Repair and diagnostics for covariance matrices supplied by an
//! external risk model. None of these are applied implicitly; callers
//! opt in before handing a matrix to the allocation layer.

use nalgebra::{DMatrix, DVector, SymmetricEigen};
use serde::{Deserialize, Serialize};

use super::{ensure_square, symmetrize};
use crate::error::{MathError, MathResult};

/// Periods per year for monthly data.
pub const PERIODS_PER_YEAR: f64 = 12.0;

/// Projects a symmetric matrix onto the positive semi-definite cone by
/// flooring its eigenvalues at `epsilon`.
pub fn nearest_psd(matrix: &DMatrix<f64>, epsilon: f64) -> MathResult<DMatrix<f64>> {
    ensure_square(matrix)?;

    let eigen = SymmetricEigen::new(symmetrize(matrix));
    let floored = eigen.eigenvalues.map(|v| v.max(epsilon));
    let repaired =
        &eigen.eigenvectors * DMatrix::from_diagonal(&floored) * eigen.eigenvectors.transpose();

    Ok(symmetrize(&repaired))
}

/// Converts a covariance matrix into a correlation matrix.
pub fn correlation_matrix(covariance: &DMatrix<f64>) -> MathResult<DMatrix<f64>> {
    ensure_square(covariance)?;

    let std = covariance.diagonal().map(f64::sqrt);
    if let Some((i, _)) = std.iter().enumerate().find(|(_, s)| s.is_nan() || **s <= 0.0) {
        return Err(MathError::invalid_input(format!(
            "Variance at index {i} must be positive to compute correlation"
        )));
    }

    let n = covariance.nrows();
    Ok(DMatrix::from_fn(n, n, |i, j| covariance[(i, j)] / (std[i] * std[j])))
}

/// Extracts per-asset volatilities, optionally annualized from monthly data.
#[must_use]
pub fn volatilities(covariance: &DMatrix<f64>, annualize: bool) -> DVector<f64> {
    let vols = covariance.diagonal().map(|v| v.max(0.0).sqrt());
    if annualize {
        vols * PERIODS_PER_YEAR.sqrt()
    } else {
        vols
    }
}

/// Scales a per-period covariance matrix to annual units.
#[must_use]
pub fn annualize_covariance(covariance: &DMatrix<f64>, periods: u32) -> DMatrix<f64> {
    covariance * f64::from(periods)
}

/// Summary statistics describing the conditioning of a covariance matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CovarianceDiagnostics {
    /// Smallest eigenvalue.
    pub min_eigenvalue: f64,
    /// Largest eigenvalue.
    pub max_eigenvalue: f64,
    /// Ratio of largest to smallest absolute eigenvalue.
    pub condition_number: f64,
    /// True when every eigenvalue is strictly positive.
    pub is_positive_definite: bool,
    /// Sum of variances.
    pub trace: f64,
    /// Determinant.
    pub determinant: f64,
    /// Mean annualized asset volatility.
    pub avg_volatility: f64,
    /// Mean off-diagonal correlation (0 for a single asset).
    pub avg_correlation: f64,
}

/// Computes [`CovarianceDiagnostics`] for a covariance matrix.
pub fn covariance_diagnostics(covariance: &DMatrix<f64>) -> MathResult<CovarianceDiagnostics> {
    ensure_square(covariance)?;
    let n = covariance.nrows();
    if n == 0 {
        return Err(MathError::insufficient_data(1, 0));
    }

    let eigenvalues = SymmetricEigen::new(symmetrize(covariance)).eigenvalues;
    let min_eigenvalue = eigenvalues.min();
    let max_eigenvalue = eigenvalues.max();
    let min_abs = eigenvalues.iter().fold(f64::INFINITY, |acc, v| acc.min(v.abs()));
    let max_abs = eigenvalues.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let condition_number = if min_abs > 0.0 {
        max_abs / min_abs
    } else {
        f64::INFINITY
    };

    let avg_volatility = volatilities(covariance, true).mean();

    let avg_correlation = if n > 1 {
        let corr = correlation_matrix(covariance)?;
        let mut sum = 0.0;
        let mut count = 0usize;
        for i in 0..n {
            for j in (i + 1)..n {
                sum += corr[(i, j)];
                count += 1;
            }
        }
        sum / count as f64
    } else {
        0.0
    };

    Ok(CovarianceDiagnostics {
        min_eigenvalue,
        max_eigenvalue,
        condition_number,
        is_positive_definite: min_eigenvalue > 0.0,
        trace: covariance.trace(),
        determinant: covariance.determinant(),
        avg_volatility,
        avg_correlation,
    })
}
