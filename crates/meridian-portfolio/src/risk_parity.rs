//! Risk parity allocation.
//!
//! Fixed-point iteration towards weights whose risk contributions match a
//! target budget (equal by default). Starting from equal weights:
//!
//! ```text
//! σ     = √(wᵀΣw)
//! rc    = w ⊙ Σw / σ
//! w_new = normalize(w ⊙ √(target / (rc + ε)))
//! ```
//!
//! until the largest elementwise change drops below the tolerance. Only the
//! sum-to-one constraint applies; there are no bounds or leverage.

use nalgebra::DVector;
use tracing::{debug, trace, warn};

use crate::error::{PortfolioError, PortfolioResult};
use crate::types::{CovarianceMatrix, RiskParityConfig, Weights};

/// Tolerance on `sum(targets) = 1`.
const BUDGET_TOLERANCE: f64 = 1e-6;

/// Outcome of a risk parity run.
#[derive(Debug, Clone, PartialEq)]
pub enum RiskParityOutcome {
    /// The change between iterates fell below the tolerance.
    Converged {
        /// Final weights.
        weights: Weights,
        /// Iterations used.
        iterations: usize,
    },
    /// The iteration budget ran out first.
    DidNotConverge {
        /// Last iterate (best effort).
        weights: Weights,
        /// Iterations used.
        iterations: usize,
        /// Largest weight change in the final iteration.
        max_change: f64,
    },
}

impl RiskParityOutcome {
    /// The weights, converged or not.
    #[must_use]
    pub fn weights(&self) -> &Weights {
        match self {
            Self::Converged { weights, .. } | Self::DidNotConverge { weights, .. } => weights,
        }
    }

    /// Iterations performed.
    #[must_use]
    pub fn iterations(&self) -> usize {
        match self {
            Self::Converged { iterations, .. } | Self::DidNotConverge { iterations, .. } => {
                *iterations
            }
        }
    }

    /// True for [`RiskParityOutcome::Converged`].
    #[must_use]
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged { .. })
    }

    /// Converged weights, or [`PortfolioError::NonConvergence`].
    pub fn into_result(self) -> PortfolioResult<Weights> {
        match self {
            Self::Converged { weights, .. } => Ok(weights),
            Self::DidNotConverge {
                iterations,
                max_change,
                ..
            } => Err(PortfolioError::NonConvergence {
                iterations,
                max_change,
            }),
        }
    }
}

/// Runs the risk parity iteration on `covariance`.
///
/// `targets` are per-asset risk budgets; they must cover exactly the
/// covariance universe, be non-negative and sum to one. `None` means equal
/// budgets `1/n`.
pub fn risk_parity(
    covariance: &CovarianceMatrix,
    targets: Option<&Weights>,
    config: &RiskParityConfig,
) -> PortfolioResult<RiskParityOutcome> {
    let universe = covariance.universe();
    let n = universe.len();
    if n == 0 {
        return Err(PortfolioError::insufficient_data(1, 0));
    }

    let budget = match targets {
        Some(targets) => risk_budget(targets, covariance)?,
        None => DVector::from_element(n, 1.0 / n as f64),
    };

    let sigma = covariance.matrix();
    let mut w = DVector::from_element(n, 1.0 / n as f64);
    let mut max_change = f64::INFINITY;

    for iteration in 1..=config.max_iterations {
        let sigma_w = sigma * &w;
        let volatility = w.dot(&sigma_w).sqrt();
        if volatility.is_nan() || volatility <= 0.0 {
            return Err(PortfolioError::invalid_input(
                "portfolio volatility vanished during risk parity iteration",
            ));
        }

        let rc = w.component_mul(&sigma_w) / volatility;
        let scale = budget.zip_map(&rc, |t, r| (t / (r + config.epsilon)).sqrt());
        let mut next = w.component_mul(&scale);
        let total = next.sum();
        if !total.is_finite() || total <= 0.0 {
            return Err(PortfolioError::calculation_failed(
                "risk parity weights degenerated",
            ));
        }
        next /= total;

        max_change = (&next - &w).amax();
        trace!(iteration, max_change, volatility, "risk parity step");

        if max_change < config.tolerance {
            debug!(iterations = iteration, "risk parity converged");
            return Ok(RiskParityOutcome::Converged {
                weights: Weights::new(universe.clone(), next)?,
                iterations: iteration,
            });
        }
        w = next;
    }

    warn!(
        iterations = config.max_iterations,
        max_change,
        "risk parity did not converge"
    );
    Ok(RiskParityOutcome::DidNotConverge {
        weights: Weights::new(universe.clone(), w)?,
        iterations: config.max_iterations,
        max_change,
    })
}

/// Validates risk budgets and orders them like the covariance.
fn risk_budget(targets: &Weights, covariance: &CovarianceMatrix) -> PortfolioResult<DVector<f64>> {
    let universe = covariance.universe();
    if targets.len() != universe.len() {
        return Err(PortfolioError::dimension_mismatch(
            universe.len(),
            targets.len(),
        ));
    }
    let ordered = targets.restrict(universe)?;

    if let Some((asset, value)) = ordered.iter().find(|(_, v)| *v < 0.0) {
        return Err(PortfolioError::invalid_input(format!(
            "risk budget for '{asset}' is negative ({value})"
        )));
    }
    let total = ordered.sum();
    if (total - 1.0).abs() > BUDGET_TOLERANCE {
        return Err(PortfolioError::invalid_input(format!(
            "risk budgets must sum to 1, got {total}"
        )));
    }
    Ok(ordered.values().clone())
}
