//! # Meridian Portfolio
//!
//! Black-Litterman posterior synthesis and constrained portfolio allocation.
//!
//! The crate covers the two numerical stages of an allocation pipeline:
//! blending a market-equilibrium prior with investor views into a posterior
//! return distribution, and turning expected returns plus a covariance into
//! constrained weights.
//!
//! ## Design Philosophy
//!
//! - **Pure functions**: Every stage takes explicit inputs and returns fresh outputs
//! - **Universe-aware data**: Vectors and matrices carry their asset labels and are aligned by name
//! - **Typed constraints**: One [`ConstraintConfig`] record shared by all optimizers
//! - **Config-driven parallelism**: Optional rayon support with threshold-based switching
//!
//! ## Features
//!
//! - **Views**: Absolute and relative views with confidence-scaled uncertainty
//! - **Posterior**: Closed-form Black-Litterman update of mean and covariance
//! - **Implied Returns**: Reverse optimization from market weights
//! - **Optimizers**: Mean-variance, minimum-variance, max-Sharpe, efficient frontier
//! - **Risk Parity**: Fixed-point iteration towards target risk budgets
//! - **Analytics**: Portfolio statistics, risk contributions, strategy comparison
//!
//! ## Quick Start
//!
//! ```rust
//! use meridian_portfolio::prelude::*;
//!
//! # fn main() -> PortfolioResult<()> {
//! let covariance = CovarianceMatrix::from_rows(
//!     ["A", "B", "C"],
//!     &[
//!         vec![0.04, 0.01, 0.02],
//!         vec![0.01, 0.09, 0.03],
//!         vec![0.02, 0.03, 0.16],
//!     ],
//! )?;
//! let prior = ReturnVector::from_pairs([("A", 0.08), ("B", 0.10), ("C", 0.12)])?;
//!
//! let views = ViewSetBuilder::new(&covariance, DEFAULT_TAU)
//!     .view(View::absolute("A", 0.15).with_confidence(0.5))
//!     .build()?;
//! let posterior = synthesize(&prior, &covariance, DEFAULT_TAU, Some(&views))?;
//!
//! let allocation = mean_variance(
//!     &posterior.mean,
//!     &posterior.covariance,
//!     DEFAULT_RISK_AVERSION,
//!     &ConstraintConfig::default(),
//!     &ComputeConfig::default(),
//! )?;
//! assert!((allocation.weights.sum() - 1.0).abs() < 1e-6);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`types`] - Asset universe, labelled vectors and matrices, configuration
//! - [`views`] - View encoding into pick matrix, targets and uncertainty
//! - [`black_litterman`] - Posterior synthesis, implied returns, deviations
//! - [`allocation`] - Conic optimizers and the efficient frontier
//! - [`risk_parity`] - Risk budgeting by fixed-point iteration
//! - [`analytics`] - Statistics, risk contributions, parallel helpers
//! - [`comparison`] - Multi-strategy comparison on one snapshot
//!
//! ## Feature Flags
//!
//! - `parallel`: Enable rayon-based parallel frontier sweeps and comparisons

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![allow(clippy::module_name_repetitions)]

// Module declarations
pub mod allocation;
pub mod analytics;
pub mod black_litterman;
pub mod comparison;
pub mod error;
pub mod risk_parity;
pub mod types;
pub mod views;

// Re-export error types at crate root
pub use error::{PortfolioError, PortfolioResult};

// Re-export main types
pub use types::{
    align_all, align_returns, align_weights, AssetUniverse, ComputeConfig, ConstraintConfig,
    CovarianceMatrix, ReturnVector, RiskParityConfig, Weights, POSITION_THRESHOLD,
};

// Re-export view encoding
pub use views::{
    build_absolute_views, build_relative_views, View, ViewSet, ViewSetBuilder, DEFAULT_CONFIDENCE,
};

// Re-export posterior synthesis
pub use black_litterman::{
    implied_returns, synthesize, view_deviations, PosteriorDistribution, ViewDeviation,
    DEFAULT_RISK_AVERSION, DEFAULT_TAU,
};

// Re-export optimizers
pub use allocation::{
    efficient_frontier, max_sharpe, mean_variance, minimum_variance, Allocation,
    EfficientFrontier, FrontierPoint, FrontierSolution,
};

// Re-export risk parity
pub use risk_parity::{risk_parity, RiskParityOutcome};

// Re-export analytics types and functions
pub use analytics::{
    maybe_parallel_map, portfolio_statistics, risk_contributions, AssetContribution,
    PortfolioStatistics, RiskContributions,
};

// Re-export comparison
pub use comparison::{compare_strategies, Strategy, StrategyReport, StrategyResult};

/// Prelude module for convenient imports.
///
/// ```rust
/// use meridian_portfolio::prelude::*;
/// ```
pub mod prelude {
    // Error types
    pub use crate::error::{PortfolioError, PortfolioResult};

    // Data types
    pub use crate::types::{AssetUniverse, CovarianceMatrix, ReturnVector, Weights};

    // Config types
    pub use crate::types::{ComputeConfig, ConstraintConfig, RiskParityConfig};

    // Views and posterior
    pub use crate::black_litterman::{
        implied_returns, synthesize, view_deviations, PosteriorDistribution,
        DEFAULT_RISK_AVERSION, DEFAULT_TAU,
    };
    pub use crate::views::{View, ViewSet, ViewSetBuilder};

    // Optimizers
    pub use crate::allocation::{
        efficient_frontier, max_sharpe, mean_variance, minimum_variance, Allocation,
        EfficientFrontier,
    };
    pub use crate::risk_parity::{risk_parity, RiskParityOutcome};

    // Analytics
    pub use crate::analytics::{
        portfolio_statistics, risk_contributions, PortfolioStatistics, RiskContributions,
    };
    pub use crate::comparison::{compare_strategies, Strategy};

    // Re-export commonly used types from dependencies
    pub use meridian_math::optimization::{SolveStatus, SolverSettings};
}
