//! Convex optimization.
//!
//! This module provides a small modelling layer for quadratic and
//! second-order-cone programs and a solver abstraction over it:
//!
//! - [`ConicProblem`]: `minimize ½xᵀPx + qᵀx` subject to blocks of
//!   equality, inequality and second-order-cone constraints
//! - [`ConicSolver`]: trait implemented by solver back-ends
//! - [`ClarabelSolver`]: interior point back-end built on `clarabel`
//!
//! # Example
//!
//! ```rust
//! use meridian_math::optimization::{ClarabelSolver, ConicProblem, ConicSolver, SolverSettings};
//! use nalgebra::{DMatrix, DVector};
//!
//! // minimize x² + y² subject to x + y = 1
//! let problem = ConicProblem::new(2)
//!     .with_quadratic(DMatrix::identity(2, 2) * 2.0)
//!     .with_equalities(DMatrix::from_row_slice(1, 2, &[1.0, 1.0]), DVector::from_vec(vec![1.0]));
//!
//! let solution = ClarabelSolver::new(SolverSettings::default()).solve(&problem).unwrap();
//! assert!(solution.status.is_acceptable());
//! assert!((solution.x[0] - 0.5).abs() < 1e-6);
//! ```

mod interior_point;
mod problem;

pub use interior_point::ClarabelSolver;
pub use problem::{ConeBlock, ConicProblem};

use std::fmt;
use std::time::Duration;

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::error::MathResult;

/// Default iteration cap for the interior point solver.
pub const DEFAULT_MAX_ITERATIONS: u32 = 200;

/// Default feasibility and duality-gap tolerance.
pub const DEFAULT_TOLERANCE: f64 = 1e-8;

/// Default wall-clock limit per solve.
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(30);

/// Configuration for conic solvers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Maximum number of interior point iterations.
    pub max_iterations: u32,
    /// Wall-clock limit per solve. `None` disables the limit.
    pub time_limit: Option<Duration>,
    /// Feasibility and duality-gap tolerance.
    pub tolerance: f64,
    /// Print solver progress to stdout.
    pub verbose: bool,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            time_limit: Some(DEFAULT_TIME_LIMIT),
            tolerance: DEFAULT_TOLERANCE,
            verbose: false,
        }
    }
}

impl SolverSettings {
    /// Sets the iteration cap.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the wall-clock limit.
    #[must_use]
    pub fn with_time_limit(mut self, time_limit: Option<Duration>) -> Self {
        self.time_limit = time_limit;
        self
    }

    /// Sets the tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Enables or disables solver output.
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Termination status reported by a conic solver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// Optimal to the requested tolerance.
    Solved,
    /// Optimal to a reduced tolerance.
    AlmostSolved,
    /// The constraints admit no solution.
    PrimalInfeasible,
    /// The objective is unbounded.
    DualInfeasible,
    /// Infeasible to a reduced tolerance.
    AlmostPrimalInfeasible,
    /// Unbounded to a reduced tolerance.
    AlmostDualInfeasible,
    /// Iteration cap reached.
    MaxIterations,
    /// Wall-clock limit reached.
    TimeLimit,
    /// Numerical breakdown inside the solver.
    NumericalError,
    /// The solver stopped making progress.
    InsufficientProgress,
    /// The solver never ran.
    Unsolved,
    /// Any other status, kept verbatim.
    Other(String),
}

impl SolveStatus {
    /// Returns true for statuses whose primal solution can be used.
    ///
    /// `AlmostSolved` is accepted, mirroring the usual "optimal inaccurate"
    /// convention of modelling front-ends.
    #[must_use]
    pub fn is_acceptable(&self) -> bool {
        matches!(self, Self::Solved | Self::AlmostSolved)
    }

    /// Returns true when the solver stopped on its wall-clock limit.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimeLimit)
    }

    /// Returns a stable snake_case label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Solved => "solved",
            Self::AlmostSolved => "almost_solved",
            Self::PrimalInfeasible => "primal_infeasible",
            Self::DualInfeasible => "dual_infeasible",
            Self::AlmostPrimalInfeasible => "almost_primal_infeasible",
            Self::AlmostDualInfeasible => "almost_dual_infeasible",
            Self::MaxIterations => "max_iterations",
            Self::TimeLimit => "time_limit",
            Self::NumericalError => "numerical_error",
            Self::InsufficientProgress => "insufficient_progress",
            Self::Unsolved => "unsolved",
            Self::Other(label) => label,
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a conic solve.
#[derive(Debug, Clone)]
pub struct ConicSolution {
    /// Primal solution.
    pub x: DVector<f64>,
    /// Termination status.
    pub status: SolveStatus,
    /// Objective value at `x`.
    pub objective: f64,
    /// Iterations used.
    pub iterations: u32,
    /// Wall-clock solve time.
    pub solve_time: Duration,
}

/// Trait for conic optimization back-ends.
///
/// Implementations report every termination status through
/// [`ConicSolution::status`]; an `Err` is reserved for problems the
/// back-end cannot even set up.
pub trait ConicSolver: Send + Sync {
    /// Solves the given problem.
    fn solve(&self, problem: &ConicProblem) -> MathResult<ConicSolution>;

    /// Returns the name of the solver.
    fn name(&self) -> &'static str;
}
