//! Mean-variance and minimum-variance allocation.

use meridian_math::linear_algebra::quad_form;
use meridian_math::optimization::ConicProblem;
use tracing::debug;

use super::{solve, Allocation, WeightConstraints};
use crate::error::{PortfolioError, PortfolioResult};
use crate::types::{align_returns, ComputeConfig, ConstraintConfig, CovarianceMatrix, ReturnVector, Weights};

/// Maximizes `μᵀw - (λ/2) wᵀΣw` subject to `constraints`.
///
/// `risk_aversion` is `λ`; zero reduces the problem to a linear program.
pub fn mean_variance(
    expected_returns: &ReturnVector,
    covariance: &CovarianceMatrix,
    risk_aversion: f64,
    constraints: &ConstraintConfig,
    config: &ComputeConfig,
) -> PortfolioResult<Allocation> {
    if !(risk_aversion.is_finite() && risk_aversion >= 0.0) {
        return Err(PortfolioError::invalid_input(format!(
            "risk aversion must be non-negative, got {risk_aversion}"
        )));
    }

    let (returns, covariance) = align_returns(expected_returns, covariance)?;
    let universe = returns.universe();
    let rows = WeightConstraints::from_config(universe, constraints)?;

    let sigma = covariance.matrix();
    let mu = returns.values();
    let problem = rows.apply(
        ConicProblem::new(universe.len())
            .with_quadratic(sigma * risk_aversion)
            .with_linear(-mu),
    );

    let solution = solve(&problem, &config.solver)?;
    let weights = Weights::new(universe.clone(), solution.x)?;
    let w = weights.values();
    let utility = mu.dot(w) - 0.5 * risk_aversion * quad_form(w, sigma);

    debug!(
        assets = universe.len(),
        risk_aversion,
        utility,
        iterations = solution.iterations,
        "mean-variance solved"
    );

    Ok(Allocation {
        weights,
        status: solution.status,
        objective: utility,
        approximate: false,
    })
}

/// Minimizes `wᵀΣw` subject to `constraints`, ignoring expected returns.
pub fn minimum_variance(
    covariance: &CovarianceMatrix,
    constraints: &ConstraintConfig,
    config: &ComputeConfig,
) -> PortfolioResult<Allocation> {
    let universe = covariance.universe();
    if universe.is_empty() {
        return Err(PortfolioError::insufficient_data(1, 0));
    }
    let rows = WeightConstraints::from_config(universe, constraints)?;

    let sigma = covariance.matrix();
    let problem = rows.apply(ConicProblem::new(universe.len()).with_quadratic(sigma * 2.0));

    let solution = solve(&problem, &config.solver)?;
    let weights = Weights::new(universe.clone(), solution.x)?;
    let variance = quad_form(weights.values(), sigma);

    debug!(
        assets = universe.len(),
        variance,
        iterations = solution.iterations,
        "minimum-variance solved"
    );

    Ok(Allocation {
        weights,
        status: solution.status,
        objective: variance,
        approximate: false,
    })
}
