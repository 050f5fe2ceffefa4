//! CLI command implementations.

pub mod compare;
pub mod diagnostics;
pub mod frontier;
pub mod implied;
pub mod optimize;
pub mod posterior;
pub mod risk_parity;

// Re-export submodules for convenience
pub use compare::CompareArgs;
pub use diagnostics::DiagnosticsArgs;
pub use frontier::FrontierArgs;
pub use implied::ImpliedArgs;
pub use optimize::OptimizeArgs;
pub use posterior::PosteriorArgs;
pub use risk_parity::RiskParityArgs;

use std::path::PathBuf;

use clap::Args;

use crate::error::{CliError, CliResult};
use crate::problem::Problem;

/// Problem file shared by every command.
#[derive(Args, Debug)]
pub struct ProblemArgs {
    /// Problem file (.toml or .json)
    pub problem: PathBuf,

    /// Override the problem's risk-free rate
    #[arg(long)]
    pub risk_free_rate: Option<f64>,
}

impl ProblemArgs {
    /// Loads the problem and applies command-line overrides.
    pub fn load(&self) -> CliResult<Problem> {
        let mut problem = Problem::load(&self.problem)?;
        if let Some(rate) = self.risk_free_rate {
            problem.risk_free_rate = validate_rate(rate)?;
        }
        Ok(problem)
    }
}

/// Validates a per-period rate.
pub fn validate_rate(rate: f64) -> CliResult<f64> {
    if !(-1.0..=1.0).contains(&rate) {
        return Err(CliError::InvalidArgument(format!(
            "rate {rate} must be a per-period fraction between -1 and 1"
        )));
    }
    Ok(rate)
}

/// Validates a positive count.
pub fn validate_count(name: &str, count: usize) -> CliResult<usize> {
    if count == 0 {
        return Err(CliError::InvalidArgument(format!("{name} must be at least 1")));
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rate() {
        assert!(validate_rate(0.02).is_ok());
        assert!(validate_rate(2.0).is_err());
    }

    #[test]
    fn test_validate_count() {
        assert_eq!(validate_count("points", 3).unwrap(), 3);
        assert!(validate_count("points", 0).is_err());
    }
}
