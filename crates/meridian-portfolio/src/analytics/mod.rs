//! Portfolio analytics.
//!
//! This module provides read-only projections of a weight vector:
//! - Return, volatility and Sharpe statistics (per period and annualized)
//! - Absolute and fractional risk contributions
//! - Config-driven parallel helpers shared by the sweeps
//!
//! All functions are pure - they take weights, returns and covariance as
//! input and return computed results. No caching, no I/O, no side effects.

mod contributions;
mod parallel;
mod statistics;

pub use contributions::*;
pub use parallel::*;
pub use statistics::*;
