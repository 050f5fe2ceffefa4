//! # Meridian Math
//!
//! Mathematical utilities for the Meridian allocation library.
//!
//! This crate provides:
//!
//! - **Linear Algebra**: Exact dense inversion, symmetry checks and
//!   square-root factorizations of covariance matrices
//! - **Covariance Utilities**: Nearest-PSD repair, correlation, volatilities
//!   and conditioning diagnostics
//! - **Optimization**: A conic (QP / SOCP) problem description and a
//!   solver abstraction with an interior point back-end
//!
//! ## Design Philosophy
//!
//! - **Explicit failure**: Singular or indefinite inputs are reported, never
//!   silently regularized
//! - **Solver agnostic**: Problems are described once and handed to any
//!   [`optimization::ConicSolver`]
//! - **Dense first**: Asset universes are small; `nalgebra` dense types are
//!   used throughout

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::float_cmp)]

pub mod error;
pub mod linear_algebra;
pub mod optimization;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{MathError, MathResult};
    pub use crate::linear_algebra::{
        check_symmetric, covariance_diagnostics, invert, nearest_psd, psd_factor, quad_form,
        symmetrize, CovarianceDiagnostics,
    };
    pub use crate::optimization::{
        ClarabelSolver, ConeBlock, ConicProblem, ConicSolution, ConicSolver, SolveStatus,
        SolverSettings,
    };
}

pub use error::{MathError, MathResult};
