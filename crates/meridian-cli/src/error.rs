//! CLI error types.

use std::path::PathBuf;

use meridian_portfolio::PortfolioError;
use thiserror::Error;

/// CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// The problem file could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// File that was requested.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The problem file extension is not `.toml` or `.json`.
    #[error("Unsupported problem file '{0}'. Use a .toml or .json file.")]
    UnsupportedFormat(PathBuf),

    /// The problem file is not valid TOML or JSON for a problem.
    #[error("Failed to parse {path}: {reason}")]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// A field the command needs is absent.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// The problem is well-formed but inconsistent.
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    /// Invalid command-line argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Calculation error.
    #[error("Calculation error: {0}")]
    Calculation(#[from] PortfolioError),
}

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;
