//! Prior versus posterior comparison.

use serde::{Deserialize, Serialize};

use crate::error::PortfolioResult;
use crate::types::ReturnVector;

/// How far the posterior moved one asset's expected return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewDeviation {
    /// Asset identifier.
    pub asset: String,
    /// Prior expected return.
    pub prior: f64,
    /// Posterior expected return.
    pub posterior: f64,
    /// `posterior - prior`.
    pub deviation: f64,
    /// `deviation / |prior|`; `None` when the prior is zero.
    pub pct_change: Option<f64>,
}

/// Compares two return vectors asset by asset, in the order of `prior`.
///
/// Assets missing from `posterior` fail with
/// [`PortfolioError::UnknownAsset`](crate::PortfolioError::UnknownAsset).
pub fn view_deviations(
    prior: &ReturnVector,
    posterior: &ReturnVector,
) -> PortfolioResult<Vec<ViewDeviation>> {
    let posterior = posterior.restrict(prior.universe())?;

    Ok(prior
        .iter()
        .zip(posterior.values().iter())
        .map(|((asset, p), &q)| {
            let deviation = q - p;
            ViewDeviation {
                asset: asset.to_string(),
                prior: p,
                posterior: q,
                deviation,
                pct_change: (p != 0.0).then(|| deviation / p.abs()),
            }
        })
        .collect())
}
