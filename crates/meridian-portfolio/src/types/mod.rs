//! Domain types for allocation.
//!
//! This module provides type-safe representations of the pipeline inputs:
//!
//! - [`AssetUniverse`]: Ordered, de-duplicated asset identifiers
//! - [`ReturnVector`], [`Weights`]: Vectors labelled by a universe
//! - [`CovarianceMatrix`]: Symmetric matrix labelled on both axes
//! - [`ConstraintConfig`]: Budget, box, long-only and pinning constraints
//! - [`ComputeConfig`], [`RiskParityConfig`]: Computation settings

mod config;
mod universe;

// Re-export all types
pub use config::{ComputeConfig, ConstraintConfig, RiskParityConfig};
pub use universe::{
    align_all, align_returns, align_weights, AssetUniverse, CovarianceMatrix, ReturnVector,
    Weights, POSITION_THRESHOLD,
};
