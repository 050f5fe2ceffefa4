//! Efficient frontier sweep.

use meridian_math::linear_algebra::quad_form;
use meridian_math::optimization::{ConicProblem, SolveStatus, SolverSettings};
use nalgebra::DVector;
use tracing::{debug, warn};

use super::{max_sharpe, minimum_variance, solve, LinearRows};
use crate::analytics::maybe_parallel_map;
use crate::error::PortfolioResult;
use crate::types::{
    align_returns, AssetUniverse, ComputeConfig, ConstraintConfig, CovarianceMatrix, ReturnVector,
    Weights,
};

/// A solved frontier point.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontierSolution {
    /// Realized expected return `μᵀw`.
    pub expected_return: f64,
    /// Volatility `√(wᵀΣw)`.
    pub volatility: f64,
    /// Minimum-variance weights at the target.
    pub weights: Weights,
    /// Solver status.
    pub status: SolveStatus,
}

/// One target of the sweep and what became of it.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontierPoint {
    /// Target expected return.
    pub target_return: f64,
    /// The solved point, or why it could not be solved.
    pub outcome: PortfolioResult<FrontierSolution>,
}

/// Result of [`efficient_frontier`], one entry per target in increasing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EfficientFrontier {
    /// All points, including failed ones.
    pub points: Vec<FrontierPoint>,
}

impl EfficientFrontier {
    /// Number of targets swept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when no targets were swept.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Successfully solved points, in target order.
    pub fn feasible(&self) -> impl Iterator<Item = &FrontierSolution> + '_ {
        self.points.iter().filter_map(|p| p.outcome.as_ref().ok())
    }

    /// Number of points that failed.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.points.iter().filter(|p| p.outcome.is_err()).count()
    }

    /// Expected returns of the feasible points.
    #[must_use]
    pub fn returns(&self) -> Vec<f64> {
        self.feasible().map(|s| s.expected_return).collect()
    }

    /// Volatilities of the feasible points.
    #[must_use]
    pub fn volatilities(&self) -> Vec<f64> {
        self.feasible().map(|s| s.volatility).collect()
    }

    /// Weights of the feasible points.
    #[must_use]
    pub fn weights(&self) -> Vec<Weights> {
        self.feasible().map(|s| s.weights.clone()).collect()
    }
}

/// Sweeps `n_points` target returns and minimizes variance at each.
///
/// Targets are equally spaced from the minimum-variance portfolio's return
/// to the largest expected return (long-only) or the return of the
/// max-Sharpe portfolio at a zero risk-free rate (shorts allowed). Each
/// point is constrained by `1ᵀw = 1`, `μᵀw = target` and, if requested,
/// `w ≥ 0`.
///
/// Failure to find either end of the range is an error; failure at an
/// individual target is recorded in that point's outcome. Points are solved
/// in parallel when `config` allows.
pub fn efficient_frontier(
    expected_returns: &ReturnVector,
    covariance: &CovarianceMatrix,
    n_points: usize,
    constraints: &ConstraintConfig,
    config: &ComputeConfig,
) -> PortfolioResult<EfficientFrontier> {
    let (returns, covariance) = align_returns(expected_returns, covariance)?;
    if n_points == 0 {
        return Ok(EfficientFrontier::default());
    }

    let mu = returns.values();
    let min_variance = minimum_variance(&covariance, constraints, config)?;
    let min_return = mu.dot(min_variance.weights.values());
    let max_return = if constraints.long_only {
        mu.max()
    } else {
        let tangency = max_sharpe(&returns, &covariance, 0.0, constraints, config)?;
        mu.dot(tangency.weights.values())
    };

    let targets = linspace(min_return, max_return, n_points);
    let points = maybe_parallel_map(&targets, config, |&target| FrontierPoint {
        target_return: target,
        outcome: solve_point(
            returns.universe(),
            mu,
            &covariance,
            target,
            constraints.long_only,
            &config.solver,
        ),
    });

    let frontier = EfficientFrontier { points };
    if frontier.failures() > 0 {
        warn!(
            failures = frontier.failures(),
            points = n_points,
            "some frontier targets could not be solved"
        );
    }
    debug!(
        points = n_points,
        min_return,
        max_return,
        "efficient frontier swept"
    );
    Ok(frontier)
}

fn solve_point(
    universe: &AssetUniverse,
    mu: &DVector<f64>,
    covariance: &CovarianceMatrix,
    target: f64,
    long_only: bool,
    settings: &SolverSettings,
) -> PortfolioResult<FrontierSolution> {
    let n = universe.len();
    let sigma = covariance.matrix();

    let mut equalities = LinearRows::new(n);
    equalities.push(&vec![1.0; n], 1.0);
    equalities.push(mu.as_slice(), target);
    let (a_eq, b_eq) = equalities.into_parts();

    let mut bounds = LinearRows::new(n);
    if long_only {
        for i in 0..n {
            bounds.push_unit(i, -1.0, 0.0);
        }
    }
    let (a_in, b_in) = bounds.into_parts();

    let problem = ConicProblem::new(n)
        .with_quadratic(sigma * 2.0)
        .with_equalities(a_eq, b_eq)
        .with_inequalities(a_in, b_in);

    let solution = solve(&problem, settings)?;
    let weights = Weights::new(universe.clone(), solution.x)?;
    let w = weights.values();

    Ok(FrontierSolution {
        expected_return: mu.dot(w),
        volatility: quad_form(w, sigma).max(0.0).sqrt(),
        weights,
        status: solution.status,
    })
}

/// `count` equally spaced values from `start` to `end` inclusive.
fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count).map(|i| start + step * i as f64).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PortfolioError;
    use approx::assert_relative_eq;

    fn covariance() -> CovarianceMatrix {
        CovarianceMatrix::from_rows(
            ["A", "B", "C"],
            &[
                vec![0.04, 0.01, 0.02],
                vec![0.01, 0.09, 0.03],
                vec![0.02, 0.03, 0.16],
            ],
        )
        .unwrap()
    }

    fn returns() -> ReturnVector {
        ReturnVector::from_pairs([("A", 0.08), ("B", 0.10), ("C", 0.12)]).unwrap()
    }

    #[test]
    fn test_linspace() {
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(0.3, 1.0, 1), vec![0.3]);
        let values = linspace(0.0, 1.0, 5);
        assert_eq!(values.len(), 5);
        assert_relative_eq!(values[4], 1.0);
        assert_relative_eq!(values[1], 0.25);
    }

    #[test]
    fn test_long_only_frontier() {
        let frontier = efficient_frontier(
            &returns(),
            &covariance(),
            8,
            &ConstraintConfig::default(),
            &ComputeConfig::default(),
        )
        .unwrap();

        assert_eq!(frontier.len(), 8);
        assert_eq!(frontier.failures(), 0);
        let top = frontier.points.last().unwrap().outcome.as_ref().unwrap();
        assert_relative_eq!(top.expected_return, 0.12, epsilon = 1e-6);

        let rets = frontier.returns();
        let vols = frontier.volatilities();
        for i in 1..rets.len() {
            assert!(rets[i] >= rets[i - 1] - 1e-6);
            assert!(vols[i] >= vols[i - 1] - 1e-6);
        }
        for w in frontier.weights() {
            assert_relative_eq!(w.sum(), 1.0, epsilon = 1e-6);
            assert!(w.values().iter().all(|x| *x >= -1e-6));
        }
    }

    #[test]
    fn test_points_hit_targets() {
        let frontier = efficient_frontier(
            &returns(),
            &covariance(),
            5,
            &ConstraintConfig::default(),
            &ComputeConfig::sequential(),
        )
        .unwrap();

        for point in frontier.points.iter().filter(|p| p.outcome.is_ok()) {
            let solution = point.outcome.as_ref().unwrap();
            assert_relative_eq!(solution.expected_return, point.target_return, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_long_short_frontier() {
        let frontier = efficient_frontier(
            &returns(),
            &covariance(),
            4,
            &ConstraintConfig::long_short(),
            &ComputeConfig::default(),
        )
        .unwrap();
        assert_eq!(frontier.len(), 4);
        assert_eq!(frontier.failures(), 0);
    }

    #[test]
    fn test_single_and_empty_sweep() {
        let cfg = ComputeConfig::default();
        let constraints = ConstraintConfig::default();
        let empty = efficient_frontier(&returns(), &covariance(), 0, &constraints, &cfg).unwrap();
        assert!(empty.is_empty());

        let single = efficient_frontier(&returns(), &covariance(), 1, &constraints, &cfg).unwrap();
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn test_failed_points_are_kept() {
        let frontier = EfficientFrontier {
            points: vec![
                FrontierPoint {
                    target_return: 0.1,
                    outcome: Err(PortfolioError::infeasible("primal_infeasible")),
                },
            ],
        };
        assert_eq!(frontier.failures(), 1);
        assert!(frontier.returns().is_empty());
    }
}
