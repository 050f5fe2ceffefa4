//! Linear algebra utilities.
//!
//! Dense matrix operations needed by the posterior update and the
//! allocation problems: exact inversion with singularity detection,
//! symmetry checks and square-root factorizations of covariance matrices.

mod covariance;

pub use covariance::{
    annualize_covariance, correlation_matrix, covariance_diagnostics, nearest_psd, volatilities,
    CovarianceDiagnostics, PERIODS_PER_YEAR,
};

use crate::error::{MathError, MathResult};
use nalgebra::{Cholesky, DMatrix, DVector, SymmetricEigen};

/// Ratio between the smallest and largest LU pivot below which a matrix
/// is treated as singular.
pub const SINGULARITY_THRESHOLD: f64 = 1e-14;

/// Default absolute tolerance for symmetry checks.
pub const SYMMETRY_TOLERANCE: f64 = 1e-10;

/// Inverts a square matrix using a pivoted LU decomposition.
///
/// Fails with [`MathError::SingularMatrix`] when a pivot vanishes or the
/// pivot ratio drops below [`SINGULARITY_THRESHOLD`].
pub fn invert(matrix: &DMatrix<f64>) -> MathResult<DMatrix<f64>> {
    ensure_square(matrix)?;
    let n = matrix.nrows();
    if n == 0 {
        return Ok(DMatrix::zeros(0, 0));
    }

    let lu = matrix.clone().lu();
    let pivots = lu.u().diagonal();

    let largest = pivots.iter().fold(0.0_f64, |acc, p| acc.max(p.abs()));
    let smallest = pivots.iter().fold(f64::INFINITY, |acc, p| acc.min(p.abs()));
    if largest == 0.0 || !largest.is_finite() || smallest / largest < SINGULARITY_THRESHOLD {
        return Err(MathError::SingularMatrix);
    }

    let inverse = lu.try_inverse().ok_or(MathError::SingularMatrix)?;
    if inverse.iter().any(|v| !v.is_finite()) {
        return Err(MathError::SingularMatrix);
    }
    Ok(inverse)
}

/// Inverts a diagonal matrix given by its diagonal entries.
///
/// Every entry must be strictly positive.
pub fn invert_positive_diagonal(diagonal: &DVector<f64>) -> MathResult<DMatrix<f64>> {
    if diagonal.iter().any(|d| *d <= 0.0 || !d.is_finite()) {
        return Err(MathError::SingularMatrix);
    }
    Ok(DMatrix::from_diagonal(&diagonal.map(|d| 1.0 / d)))
}

/// Checks that a matrix is square and symmetric within `tolerance`.
pub fn check_symmetric(matrix: &DMatrix<f64>, tolerance: f64) -> MathResult<()> {
    ensure_square(matrix)?;
    let n = matrix.nrows();

    let mut worst = (0, 0, 0.0_f64);
    for i in 0..n {
        for j in (i + 1)..n {
            let diff = (matrix[(i, j)] - matrix[(j, i)]).abs();
            if diff > worst.2 {
                worst = (i, j, diff);
            }
        }
    }

    if worst.2 > tolerance {
        return Err(MathError::NotSymmetric {
            row: worst.0,
            col: worst.1,
            difference: worst.2,
        });
    }
    Ok(())
}

/// Returns `(A + Aᵀ) / 2`.
#[must_use]
pub fn symmetrize(matrix: &DMatrix<f64>) -> DMatrix<f64> {
    (matrix + matrix.transpose()) * 0.5
}

/// Evaluates the quadratic form `xᵀ A x`.
#[must_use]
pub fn quad_form(x: &DVector<f64>, matrix: &DMatrix<f64>) -> f64 {
    x.dot(&(matrix * x))
}

/// Computes a square-root factor `F` with `Fᵀ F = A` for a symmetric
/// positive semi-definite matrix.
///
/// The Cholesky factor is used when it exists (`F = Lᵀ`). Otherwise the
/// factor is built from the eigendecomposition, flooring eigenvalues in
/// `[-tolerance·λmax, 0)` to zero. A more negative eigenvalue is an error.
pub fn psd_factor(matrix: &DMatrix<f64>, tolerance: f64) -> MathResult<DMatrix<f64>> {
    ensure_square(matrix)?;

    if let Some(cholesky) = Cholesky::new(matrix.clone()) {
        return Ok(cholesky.l().transpose());
    }

    let eigen = SymmetricEigen::new(symmetrize(matrix));
    let scale = eigen
        .eigenvalues
        .iter()
        .fold(1.0_f64, |acc, v| acc.max(v.abs()));
    let min_eigenvalue = eigen.eigenvalues.min();
    if min_eigenvalue < -tolerance * scale {
        return Err(MathError::NotPositiveSemiDefinite { min_eigenvalue });
    }

    let roots = eigen.eigenvalues.map(|v| v.max(0.0).sqrt());
    Ok(DMatrix::from_diagonal(&roots) * eigen.eigenvectors.transpose())
}

fn ensure_square(matrix: &DMatrix<f64>) -> MathResult<()> {
    if matrix.nrows() != matrix.ncols() {
        return Err(MathError::invalid_input(format!(
            "Matrix must be square, got {}x{}",
            matrix.nrows(),
            matrix.ncols()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_covariance() -> DMatrix<f64> {
        DMatrix::from_row_slice(
            3,
            3,
            &[0.04, 0.01, 0.02, 0.01, 0.09, 0.03, 0.02, 0.03, 0.16],
        )
    }

    #[test]
    fn test_invert_roundtrip_identity() {
        let a = sample_covariance();
        let inv = invert(&a).unwrap();
        let product = &a * &inv;

        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(product[(i, j)], expected, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_invert_singular() {
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        assert_eq!(invert(&a).unwrap_err(), MathError::SingularMatrix);

        let zero = DMatrix::<f64>::zeros(3, 3);
        assert_eq!(invert(&zero).unwrap_err(), MathError::SingularMatrix);
    }

    #[test]
    fn test_invert_non_square() {
        let a = DMatrix::<f64>::zeros(2, 3);
        assert!(matches!(invert(&a), Err(MathError::InvalidInput { .. })));
    }

    #[test]
    fn test_invert_positive_diagonal() {
        let d = DVector::from_vec(vec![2.0, 4.0]);
        let inv = invert_positive_diagonal(&d).unwrap();
        assert_relative_eq!(inv[(0, 0)], 0.5);
        assert_relative_eq!(inv[(1, 1)], 0.25);
        assert_relative_eq!(inv[(0, 1)], 0.0);

        let bad = DVector::from_vec(vec![1.0, 0.0]);
        assert!(invert_positive_diagonal(&bad).is_err());
    }

    #[test]
    fn test_check_symmetric() {
        assert!(check_symmetric(&sample_covariance(), SYMMETRY_TOLERANCE).is_ok());

        let mut a = sample_covariance();
        a[(0, 2)] = 0.5;
        match check_symmetric(&a, SYMMETRY_TOLERANCE) {
            Err(MathError::NotSymmetric { row, col, .. }) => {
                assert_eq!((row, col), (0, 2));
            }
            other => panic!("expected NotSymmetric, got {other:?}"),
        }
    }

    #[test]
    fn test_quad_form() {
        let a = sample_covariance();
        let w = DVector::from_vec(vec![1.0, 0.0, 0.0]);
        assert_relative_eq!(quad_form(&w, &a), 0.04);
    }

    #[test]
    fn test_psd_factor_positive_definite() {
        let a = sample_covariance();
        let f = psd_factor(&a, 1e-10).unwrap();
        let reconstructed = f.transpose() * &f;
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(reconstructed[(i, j)], a[(i, j)], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_psd_factor_singular_psd() {
        // Rank-one matrix: v vᵀ with v = (1, 2)
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        let f = psd_factor(&a, 1e-10).unwrap();
        let reconstructed = f.transpose() * &f;
        for i in 0..2 {
            for j in 0..2 {
                assert_relative_eq!(reconstructed[(i, j)], a[(i, j)], epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_psd_factor_indefinite() {
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 3.0, 3.0, 1.0]);
        assert!(matches!(
            psd_factor(&a, 1e-10),
            Err(MathError::NotPositiveSemiDefinite { .. })
        ));
    }
}
