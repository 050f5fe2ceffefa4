//! Configuration for allocation and computation.

use std::collections::BTreeMap;

use meridian_math::optimization::SolverSettings;
use serde::{Deserialize, Serialize};

use crate::error::{PortfolioError, PortfolioResult};

/// Portfolio constraints shared by every optimizer entry point.
///
/// Box bounds are only enforced when they bind: `max_weight` below 1.0 and
/// `min_weight` above 0.0. Short positions are therefore allowed exactly
/// when `long_only` is false and `min_weight` is not positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintConfig {
    /// Forbid negative weights.
    pub long_only: bool,

    /// Upper bound for every weight.
    pub max_weight: f64,

    /// Lower bound for every weight.
    pub min_weight: f64,

    /// Required sum of weights.
    pub leverage: f64,

    /// Assets pinned to an exact weight.
    pub target_weights: BTreeMap<String, f64>,
}

impl Default for ConstraintConfig {
    fn default() -> Self {
        Self {
            long_only: true,
            max_weight: 1.0,
            min_weight: 0.0,
            leverage: 1.0,
            target_weights: BTreeMap::new(),
        }
    }
}

impl ConstraintConfig {
    /// Creates a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a config that allows short positions.
    #[must_use]
    pub fn long_short() -> Self {
        Self {
            long_only: false,
            ..Self::default()
        }
    }

    /// Sets whether negative weights are forbidden.
    #[must_use]
    pub fn with_long_only(mut self, long_only: bool) -> Self {
        self.long_only = long_only;
        self
    }

    /// Sets the per-asset upper bound.
    #[must_use]
    pub fn with_max_weight(mut self, max_weight: f64) -> Self {
        self.max_weight = max_weight;
        self
    }

    /// Sets the per-asset lower bound.
    #[must_use]
    pub fn with_min_weight(mut self, min_weight: f64) -> Self {
        self.min_weight = min_weight;
        self
    }

    /// Sets the required weight sum.
    #[must_use]
    pub fn with_leverage(mut self, leverage: f64) -> Self {
        self.leverage = leverage;
        self
    }

    /// Pins an asset to an exact weight.
    #[must_use]
    pub fn with_target_weight(mut self, asset: impl Into<String>, weight: f64) -> Self {
        self.target_weights.insert(asset.into(), weight);
        self
    }

    /// True when the upper bound binds.
    #[must_use]
    pub fn has_max_weight(&self) -> bool {
        self.max_weight < 1.0
    }

    /// True when the lower bound binds.
    #[must_use]
    pub fn has_min_weight(&self) -> bool {
        self.min_weight > 0.0
    }

    /// Checks that every numeric field is finite and the bounds are ordered.
    pub fn validate(&self) -> PortfolioResult<()> {
        let fields = [
            ("max_weight", self.max_weight),
            ("min_weight", self.min_weight),
            ("leverage", self.leverage),
        ];
        if let Some((name, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(PortfolioError::invalid_input(format!(
                "{name} must be finite, got {value}"
            )));
        }
        if self.min_weight > self.max_weight {
            return Err(PortfolioError::invalid_input(format!(
                "min_weight {} exceeds max_weight {}",
                self.min_weight, self.max_weight
            )));
        }
        if let Some((asset, value)) = self.target_weights.iter().find(|(_, v)| !v.is_finite()) {
            return Err(PortfolioError::invalid_input(format!(
                "target weight for '{asset}' must be finite, got {value}"
            )));
        }
        Ok(())
    }
}

/// Configuration for the risk parity fixed-point iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskParityConfig {
    /// Stop when the largest weight change falls below this.
    pub tolerance: f64,

    /// Iteration budget.
    pub max_iterations: usize,

    /// Floor added to risk contributions before dividing.
    pub epsilon: f64,
}

impl Default for RiskParityConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: 100,
            epsilon: 1e-10,
        }
    }
}

impl RiskParityConfig {
    /// Sets the convergence tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the iteration budget.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// Configuration for computation: parallelism and solver limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputeConfig {
    /// Enable parallel processing (requires 'parallel' feature).
    pub parallel: bool,

    /// Minimum item count (frontier points, strategies) to trigger parallel
    /// processing.
    pub parallel_threshold: usize,

    /// Settings handed to every conic solve.
    pub solver: SolverSettings,

    /// Settings for risk parity runs made on the caller's behalf.
    pub risk_parity: RiskParityConfig,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            parallel_threshold: 4,
            solver: SolverSettings::default(),
            risk_parity: RiskParityConfig::default(),
        }
    }
}

impl ComputeConfig {
    /// Creates a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a config that always uses sequential processing.
    #[must_use]
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    /// Sets whether to use parallel processing.
    #[must_use]
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Sets the threshold for parallel processing.
    #[must_use]
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Sets the solver settings.
    #[must_use]
    pub fn with_solver(mut self, solver: SolverSettings) -> Self {
        self.solver = solver;
        self
    }

    /// Sets the risk parity settings.
    #[must_use]
    pub fn with_risk_parity(mut self, risk_parity: RiskParityConfig) -> Self {
        self.risk_parity = risk_parity;
        self
    }

    /// Returns true if parallel processing should be used for the given count.
    #[must_use]
    pub fn should_parallelize(&self, count: usize) -> bool {
        cfg!(feature = "parallel") && self.parallel && count >= self.parallel_threshold
    }
}
