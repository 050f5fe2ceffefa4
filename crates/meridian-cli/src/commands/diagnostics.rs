//! Diagnostics command implementation.
//!
//! Reports conditioning of the covariance matrix and per-asset risk, with
//! optional nearest-PSD repair.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use meridian_math::linear_algebra::{
    annualize_covariance, volatilities, CovarianceDiagnostics, PERIODS_PER_YEAR,
};
use meridian_portfolio::CovarianceMatrix;

use crate::cli::OutputFormat;
use crate::commands::ProblemArgs;
use crate::error::CliError;
use crate::output::{display_rate, print_header, print_output, print_single, KeyValue};

/// Arguments for the diagnostics command.
#[derive(Args, Debug)]
pub struct DiagnosticsArgs {
    #[command(flatten)]
    pub input: ProblemArgs,

    /// Floor eigenvalues at EPSILON before reporting
    #[arg(long, value_name = "EPSILON", num_args = 0..=1, default_missing_value = "1e-8")]
    pub repair: Option<f64>,
}

/// One asset's variance and volatility.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct AssetRiskRow {
    #[tabled(rename = "Asset")]
    pub asset: String,
    #[tabled(rename = "Variance", display_with = "display_variance")]
    pub variance: f64,
    #[tabled(rename = "Volatility", display_with = "display_rate")]
    pub volatility: f64,
    #[tabled(rename = "Annual Variance", display_with = "display_variance")]
    pub annual_variance: f64,
    #[tabled(rename = "Annual Volatility", display_with = "display_rate")]
    pub annual_volatility: f64,
}

fn display_variance(value: &f64) -> String {
    format!("{value:.6}")
}

#[derive(Serialize)]
struct DiagnosticsReport<'a> {
    repaired: bool,
    diagnostics: &'a CovarianceDiagnostics,
    assets: &'a [AssetRiskRow],
}

/// Execute the diagnostics command.
pub fn execute(args: DiagnosticsArgs, format: OutputFormat) -> Result<()> {
    let problem = args.input.load()?;
    let covariance = match args.repair {
        Some(epsilon) if !(epsilon.is_finite() && epsilon >= 0.0) => {
            return Err(CliError::InvalidArgument(format!(
                "repair epsilon must be non-negative, got {epsilon}"
            ))
            .into());
        }
        Some(epsilon) => problem.covariance.nearest_psd(epsilon)?,
        None => problem.covariance,
    };

    let diagnostics = covariance.diagnostics()?;
    let rows = asset_rows(&covariance);

    match format {
        OutputFormat::Table => {
            print_header(if args.repair.is_some() {
                "Covariance Diagnostics (repaired)"
            } else {
                "Covariance Diagnostics"
            });
            print_output(&diagnostic_rows(&diagnostics), format)?;
            print_header("Asset Risk");
            print_output(&rows, format)?;
        }
        OutputFormat::Json => print_single(&DiagnosticsReport {
            repaired: args.repair.is_some(),
            diagnostics: &diagnostics,
            assets: &rows,
        })?,
        OutputFormat::Csv => print_output(&rows, format)?,
        OutputFormat::Minimal => println!("{:.6e}", diagnostics.condition_number),
    }

    Ok(())
}

fn diagnostic_rows(d: &CovarianceDiagnostics) -> Vec<KeyValue> {
    vec![
        KeyValue::new("Positive Definite", d.is_positive_definite.to_string()),
        KeyValue::from_f64("Min Eigenvalue", d.min_eigenvalue, 8),
        KeyValue::from_f64("Max Eigenvalue", d.max_eigenvalue, 8),
        KeyValue::new("Condition Number", format!("{:.4e}", d.condition_number)),
        KeyValue::from_f64("Trace", d.trace, 6),
        KeyValue::new("Determinant", format!("{:.4e}", d.determinant)),
        KeyValue::from_percent("Avg Annual Volatility", d.avg_volatility),
        KeyValue::from_f64("Avg Correlation", d.avg_correlation, 4),
    ]
}

fn asset_rows(covariance: &CovarianceMatrix) -> Vec<AssetRiskRow> {
    let matrix = covariance.matrix();
    let annual = annualize_covariance(matrix, PERIODS_PER_YEAR as u32);
    let vols = volatilities(matrix, false);
    let annual_vols = volatilities(matrix, true);

    covariance
        .universe()
        .iter()
        .enumerate()
        .map(|(i, asset)| AssetRiskRow {
            asset: asset.to_string(),
            variance: matrix[(i, i)],
            volatility: vols[i],
            annual_variance: annual[(i, i)],
            annual_volatility: annual_vols[i],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_rows_annualize() {
        let cov = CovarianceMatrix::from_rows(["A", "B"], &[vec![0.04, 0.0], vec![0.0, 0.01]])
            .unwrap();
        let rows = asset_rows(&cov);

        assert_eq!(rows[0].asset, "A");
        assert!((rows[0].volatility - 0.2).abs() < 1e-12);
        assert!((rows[1].annual_variance - 0.12).abs() < 1e-12);
        assert!((rows[1].annual_volatility - 0.1 * 12f64.sqrt()).abs() < 1e-12);
    }
}
