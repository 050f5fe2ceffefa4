//! Maximum Sharpe ratio allocation.
//!
//! The ratio objective is made convex with the substitution `w = y/κ`.
//! Fixing the excess return of `y` at one gives the quadratic program
//!
//! ```text
//! minimize    yᵀΣy
//! subject to  (μ - rf)ᵀ y = 1
//!             y ≥ 0               (long-only)
//! ```
//!
//! with `κ = 1ᵀy` and `w = y/κ`. Only `long_only` and `max_weight` are
//! honoured; the box is applied afterwards by clipping and renormalizing,
//! which flags the result as approximate.

use meridian_math::linear_algebra::{psd_factor, quad_form};
use meridian_math::optimization::ConicProblem;
use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

use super::{solve, Allocation, LinearRows};
use crate::error::{PortfolioError, PortfolioResult};
use crate::types::{align_returns, ComputeConfig, ConstraintConfig, CovarianceMatrix, ReturnVector, Weights};

/// Relative eigenvalue tolerance for the PSD check.
const FACTOR_TOLERANCE: f64 = 1e-10;

/// `κ` at or below this means the tangency ray has no fully invested point.
const SCALE_FLOOR: f64 = 1e-10;

/// Maximizes the Sharpe ratio `(μ - rf)ᵀw / √(wᵀΣw)` with `1ᵀw = 1`.
///
/// # Errors
///
/// - [`PortfolioError::NotPositiveSemiDefinite`] if the covariance has a
///   materially negative eigenvalue
/// - [`PortfolioError::CalculationFailed`] if no asset has a positive excess
///   return (long-only), or if the optimal scale `κ` is not positive. A
///   non-positive `κ` means every fully invested portfolio on the tangency
///   ray has a negative excess return, so there is no maximizer with
///   `1ᵀw = 1`
pub fn max_sharpe(
    expected_returns: &ReturnVector,
    covariance: &CovarianceMatrix,
    risk_free_rate: f64,
    constraints: &ConstraintConfig,
    config: &ComputeConfig,
) -> PortfolioResult<Allocation> {
    if !risk_free_rate.is_finite() {
        return Err(PortfolioError::invalid_input(format!(
            "risk-free rate must be finite, got {risk_free_rate}"
        )));
    }
    constraints.validate()?;

    let (returns, covariance) = align_returns(expected_returns, covariance)?;
    let universe = returns.universe();
    for asset in constraints.target_weights.keys() {
        universe.require(asset)?;
    }
    if !constraints.target_weights.is_empty()
        || constraints.has_min_weight()
        || constraints.leverage != 1.0
    {
        warn!("max-Sharpe ignores target_weights, min_weight and leverage");
    }

    let n = universe.len();
    let excess = returns.values().add_scalar(-risk_free_rate);
    let no_upside = if constraints.long_only {
        excess.iter().all(|e| *e <= 0.0)
    } else {
        excess.iter().all(|e| *e == 0.0)
    };
    if no_upside {
        return Err(PortfolioError::calculation_failed(
            "max-Sharpe needs an asset with positive excess return",
        ));
    }

    // rejects indefinite Σ before the solver sees it
    psd_factor(covariance.matrix(), FACTOR_TOLERANCE)?;
    let problem = quadratic_form(&excess, covariance.matrix(), constraints.long_only);

    let solution = solve(&problem, &config.solver)?;
    let y = solution.x;
    let kappa = y.sum();
    if kappa <= SCALE_FLOOR {
        return Err(PortfolioError::calculation_failed(format!(
            "max-Sharpe scale is not positive (kappa = {kappa:.3e}); no fully invested portfolio has positive excess return"
        )));
    }

    let mut w = y / kappa;
    let mut approximate = false;
    if constraints.has_max_weight() {
        w = clip_and_renormalize(&w, constraints.max_weight)?;
        approximate = true;
    }

    let volatility = quad_form(&w, covariance.matrix()).max(0.0).sqrt();
    let sharpe = if volatility > 0.0 {
        excess.dot(&w) / volatility
    } else {
        0.0
    };

    debug!(
        assets = n,
        kappa,
        sharpe,
        approximate,
        iterations = solution.iterations,
        "max-Sharpe solved"
    );

    Ok(Allocation {
        weights: Weights::new(universe.clone(), w)?,
        status: solution.status,
        objective: sharpe,
        approximate,
    })
}

/// Builds the quadratic program over `y`.
fn quadratic_form(excess: &DVector<f64>, sigma: &DMatrix<f64>, long_only: bool) -> ConicProblem {
    let n = excess.len();

    let mut normalization = LinearRows::new(n);
    normalization.push(excess.as_slice(), 1.0);
    let (a_eq, b_eq) = normalization.into_parts();

    let mut bounds = LinearRows::new(n);
    if long_only {
        for i in 0..n {
            bounds.push_unit(i, -1.0, 0.0);
        }
    }
    let (a_in, b_in) = bounds.into_parts();

    ConicProblem::new(n)
        .with_quadratic(sigma.clone())
        .with_equalities(a_eq, b_eq)
        .with_inequalities(a_in, b_in)
}

/// Clips weights into `[0, max_weight]` and rescales them to sum to one.
fn clip_and_renormalize(weights: &DVector<f64>, max_weight: f64) -> PortfolioResult<DVector<f64>> {
    let clipped = weights.map(|w| w.clamp(0.0, max_weight.max(0.0)));
    let total = clipped.sum();
    if total <= f64::EPSILON {
        return Err(PortfolioError::calculation_failed(
            "max-Sharpe weights vanish after clipping to the box",
        ));
    }
    Ok(clipped / total)
}
