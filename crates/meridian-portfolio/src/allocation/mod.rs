//! Constrained portfolio optimization.
//!
//! Every optimizer is formulated as a convex conic program and handed to
//! [`ClarabelSolver`]:
//!
//! - [`mean_variance`]: maximize `μᵀw - (λ/2) wᵀΣw`
//! - [`minimum_variance`]: minimize `wᵀΣw`
//! - [`max_sharpe`]: maximize `(μ - rf)ᵀw / √(wᵀΣw)` via the `w = y/κ`
//!   substitution
//! - [`efficient_frontier`]: minimum variance at a sweep of target returns
//!
//! All entry points share [`ConstraintConfig`](crate::types::ConstraintConfig)
//! and take solver limits from [`ComputeConfig`](crate::types::ComputeConfig).
//! Only "solved" and "almost solved" statuses are accepted.

mod constraints;
mod frontier;
mod max_sharpe;
mod mean_variance;

pub use frontier::{efficient_frontier, EfficientFrontier, FrontierPoint, FrontierSolution};
pub use max_sharpe::max_sharpe;
pub use mean_variance::{mean_variance, minimum_variance};

pub(crate) use constraints::{LinearRows, WeightConstraints};

use meridian_math::optimization::{
    ClarabelSolver, ConicProblem, ConicSolution, ConicSolver, SolveStatus, SolverSettings,
};
use serde::Serialize;
use tracing::warn;

use crate::error::{PortfolioError, PortfolioResult};
use crate::types::Weights;

/// Optimizer output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Allocation {
    /// Optimal weights.
    pub weights: Weights,

    /// Solver termination status.
    pub status: SolveStatus,

    /// Objective in the optimizer's own terms: utility for mean-variance,
    /// variance for minimum-variance, Sharpe ratio for max-Sharpe.
    pub objective: f64,

    /// True when the weights were adjusted after solving, so they satisfy
    /// the constraints but are not the exact optimum.
    pub approximate: bool,
}

/// Solves `problem` and maps unusable statuses to errors.
pub(crate) fn solve(
    problem: &ConicProblem,
    settings: &SolverSettings,
) -> PortfolioResult<ConicSolution> {
    let solution = ClarabelSolver::new(*settings).solve(problem)?;

    match &solution.status {
        SolveStatus::Solved => Ok(solution),
        SolveStatus::AlmostSolved => {
            warn!(
                iterations = solution.iterations,
                "solver reached reduced accuracy only, accepting solution"
            );
            Ok(solution)
        }
        status if status.is_timeout() => Err(PortfolioError::SolverTimeout {
            limit: settings.time_limit.unwrap_or_default(),
        }),
        status => Err(PortfolioError::infeasible(status.as_str())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ComputeConfig, ConstraintConfig, CovarianceMatrix};
    use nalgebra::{DMatrix, DVector};
    use std::time::Duration;

    #[test]
    fn test_time_limit_maps_to_timeout() {
        let cov = CovarianceMatrix::from_rows(
            ["A", "B", "C"],
            &[
                vec![0.04, 0.01, 0.02],
                vec![0.01, 0.09, 0.03],
                vec![0.02, 0.03, 0.16],
            ],
        )
        .unwrap();
        let mut config = ComputeConfig::default();
        config.solver = SolverSettings::default().with_time_limit(Some(Duration::from_nanos(1)));

        let err = minimum_variance(&cov, &ConstraintConfig::default(), &config).unwrap_err();
        assert!(matches!(
            err,
            PortfolioError::SolverTimeout { limit } if limit == Duration::from_nanos(1)
        ));
    }

    #[test]
    fn test_solve_maps_infeasible() {
        let problem = ConicProblem::new(1)
            .with_linear(DVector::from_vec(vec![1.0]))
            .with_equalities(DMatrix::from_element(1, 1, 1.0), DVector::from_vec(vec![1.0]))
            .with_inequalities(DMatrix::from_element(1, 1, 1.0), DVector::from_vec(vec![0.0]));

        let err = solve(&problem, &SolverSettings::default()).unwrap_err();
        assert!(matches!(err, PortfolioError::InfeasibleOptimization { .. }));
    }

    #[test]
    fn test_solve_accepts_optimum() {
        let problem = ConicProblem::new(1)
            .with_quadratic(DMatrix::from_element(1, 1, 2.0))
            .with_inequalities(DMatrix::from_element(1, 1, -1.0), DVector::from_vec(vec![-1.0]));

        let solution = solve(&problem, &SolverSettings::default()).unwrap();
        assert!((solution.x[0] - 1.0).abs() < 1e-6);
    }
}
