//! Interior point back-end built on the `clarabel` solver.

use std::time::Duration;

use ::clarabel::algebra::CscMatrix;
use nalgebra::{DMatrix, DVector};
use tracing::debug;

use super::{ConeBlock, ConicProblem, ConicSolution, ConicSolver, SolveStatus, SolverSettings};
use crate::error::{MathError, MathResult};

/// Entries with magnitude below this are dropped from sparse problem data.
const SPARSITY_THRESHOLD: f64 = 1e-14;

/// Conic solver using Clarabel's primal-dual interior point method.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClarabelSolver {
    settings: SolverSettings,
}

impl ClarabelSolver {
    /// Creates a solver with the given settings.
    #[must_use]
    pub fn new(settings: SolverSettings) -> Self {
        Self { settings }
    }

    /// Returns the solver settings.
    #[must_use]
    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }
}

impl ConicSolver for ClarabelSolver {
    fn solve(&self, problem: &ConicProblem) -> MathResult<ConicSolution> {
        use ::clarabel::solver::*;

        problem.validate()?;
        let n = problem.num_variables();

        let p = match problem.quadratic() {
            Some(p) => dense_to_csc(p, true),
            None => CscMatrix::new(n, n, vec![0; n + 1], Vec::new(), Vec::new()),
        };
        let q: Vec<f64> = problem.linear().iter().copied().collect();

        let (a_dense, b_dense) = problem.stacked_constraints();
        let a = dense_to_csc(&a_dense, false);
        let b: Vec<f64> = b_dense.iter().copied().collect();

        let cones: Vec<SupportedConeT<f64>> = problem
            .cones()
            .map(|cone| match cone {
                ConeBlock::Zero(rows) => SupportedConeT::ZeroConeT(rows),
                ConeBlock::Nonnegative(rows) => SupportedConeT::NonnegativeConeT(rows),
                ConeBlock::SecondOrder(rows) => SupportedConeT::SecondOrderConeT(rows),
            })
            .collect();

        let time_limit = self
            .settings
            .time_limit
            .map_or(f64::INFINITY, |limit| limit.as_secs_f64());

        let settings = DefaultSettingsBuilder::default()
            .max_iter(self.settings.max_iterations)
            .time_limit(time_limit)
            .tol_gap_abs(self.settings.tolerance)
            .tol_gap_rel(self.settings.tolerance)
            .tol_feas(self.settings.tolerance)
            .verbose(self.settings.verbose)
            .build()
            .map_err(|e| MathError::solver_setup(format!("invalid settings: {e}")))?;

        debug!(
            variables = n,
            constraints = problem.num_constraints(),
            solver = self.name(),
            "solving conic problem"
        );

        let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings)
            .map_err(|e| MathError::solver_setup(format!("{e:?}")))?;
        solver.solve();

        let status = map_status(&solver.solution.status);
        let x = DVector::from_column_slice(&solver.solution.x);
        let objective = problem.objective(&x);

        debug!(
            %status,
            iterations = solver.solution.iterations,
            objective,
            "conic solve finished"
        );

        Ok(ConicSolution {
            x,
            status,
            objective,
            iterations: solver.solution.iterations,
            solve_time: Duration::from_secs_f64(solver.solution.solve_time.max(0.0)),
        })
    }

    fn name(&self) -> &'static str {
        "clarabel"
    }
}

fn map_status(status: &::clarabel::solver::SolverStatus) -> SolveStatus {
    use ::clarabel::solver::SolverStatus as Raw;

    match status {
        Raw::Solved => SolveStatus::Solved,
        Raw::AlmostSolved => SolveStatus::AlmostSolved,
        Raw::PrimalInfeasible => SolveStatus::PrimalInfeasible,
        Raw::DualInfeasible => SolveStatus::DualInfeasible,
        Raw::AlmostPrimalInfeasible => SolveStatus::AlmostPrimalInfeasible,
        Raw::AlmostDualInfeasible => SolveStatus::AlmostDualInfeasible,
        Raw::MaxIterations => SolveStatus::MaxIterations,
        Raw::MaxTime => SolveStatus::TimeLimit,
        Raw::NumericalError => SolveStatus::NumericalError,
        Raw::InsufficientProgress => SolveStatus::InsufficientProgress,
        Raw::Unsolved => SolveStatus::Unsolved,
        #[allow(unreachable_patterns)]
        other => SolveStatus::Other(format!("{other:?}")),
    }
}

/// Converts a dense matrix to compressed sparse column form.
///
/// With `upper_only` only entries on or above the diagonal are kept, which
/// is the layout Clarabel expects for the quadratic cost.
fn dense_to_csc(matrix: &DMatrix<f64>, upper_only: bool) -> CscMatrix<f64> {
    let (m, n) = matrix.shape();
    let mut colptr = Vec::with_capacity(n + 1);
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();

    colptr.push(0);
    for j in 0..n {
        let last_row = if upper_only { (j + 1).min(m) } else { m };
        for i in 0..last_row {
            let value = matrix[(i, j)];
            if value.abs() > SPARSITY_THRESHOLD {
                rowval.push(i);
                nzval.push(value);
            }
        }
        colptr.push(nzval.len());
    }

    CscMatrix::new(m, n, colptr, rowval, nzval)
}
