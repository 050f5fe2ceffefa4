//! Problem file loading.
//!
//! A problem file describes one allocation snapshot in TOML or JSON,
//! selected by extension:
//!
//! ```toml
//! assets = ["A", "B", "C"]
//! covariance = [
//!     [0.04, 0.01, 0.02],
//!     [0.01, 0.09, 0.03],
//!     [0.02, 0.03, 0.16],
//! ]
//! tau = 0.025
//!
//! [prior]
//! A = 0.08
//! B = 0.10
//! C = 0.12
//!
//! [[views]]
//! kind = "absolute"
//! asset = "A"
//! target = 0.15
//! confidence = 0.5
//!
//! [constraints]
//! max_weight = 0.6
//! ```
//!
//! Either `prior` (alias `expected_returns`) or `market_weights` must be
//! present; without a prior, expected returns are implied from the market
//! weights at `risk_aversion`.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use meridian_math::optimization::SolverSettings;
use meridian_portfolio::{
    implied_returns, synthesize, AssetUniverse, ComputeConfig, ConstraintConfig,
    CovarianceMatrix, PosteriorDistribution, ReturnVector, View, ViewSet, ViewSetBuilder,
    Weights, DEFAULT_RISK_AVERSION, DEFAULT_TAU,
};
use serde::Deserialize;
use tracing::debug;

use crate::error::{CliError, CliResult};

/// Raw problem file contents.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProblemFile {
    /// Asset order for the covariance rows.
    pub assets: Vec<String>,
    /// Covariance rows, ordered like `assets`.
    pub covariance: Vec<Vec<f64>>,
    /// Prior expected returns per asset.
    #[serde(default, alias = "expected_returns")]
    pub prior: Option<BTreeMap<String, f64>>,
    /// Market capitalisation weights per asset.
    #[serde(default)]
    pub market_weights: Option<BTreeMap<String, f64>>,
    /// Investor views.
    #[serde(default)]
    pub views: Vec<View>,
    /// Prior uncertainty scale.
    #[serde(default = "default_tau")]
    pub tau: f64,
    /// Risk aversion for implied returns and mean-variance.
    #[serde(default = "default_risk_aversion")]
    pub risk_aversion: f64,
    /// Per-period risk-free rate.
    #[serde(default)]
    pub risk_free_rate: f64,
    /// Weight constraints.
    #[serde(default)]
    pub constraints: ConstraintConfig,
    /// Risk parity budgets per asset.
    #[serde(default)]
    pub risk_budgets: Option<BTreeMap<String, f64>>,
    /// Solver and parallelism settings.
    #[serde(default)]
    pub solver: SolverSection,
}

fn default_tau() -> f64 {
    DEFAULT_TAU
}

fn default_risk_aversion() -> f64 {
    DEFAULT_RISK_AVERSION
}

/// `[solver]` table. Unset fields keep the library defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SolverSection {
    /// Interior point iteration cap.
    pub max_iterations: Option<u32>,
    /// Wall-clock limit per solve in seconds; 0 disables it.
    pub time_limit_secs: Option<f64>,
    /// Solver tolerance.
    pub tolerance: Option<f64>,
    /// Print solver progress.
    pub verbose: Option<bool>,
    /// Solve frontier points and strategies in parallel.
    pub parallel: Option<bool>,
}

impl SolverSection {
    fn compute_config(&self) -> CliResult<ComputeConfig> {
        let mut solver = SolverSettings::default();
        if let Some(max_iterations) = self.max_iterations {
            solver = solver.with_max_iterations(max_iterations);
        }
        if let Some(secs) = self.time_limit_secs {
            if !secs.is_finite() || secs < 0.0 {
                return Err(CliError::InvalidProblem(format!(
                    "solver.time_limit_secs must be non-negative, got {secs}"
                )));
            }
            let limit = (secs > 0.0).then(|| Duration::from_secs_f64(secs));
            solver = solver.with_time_limit(limit);
        }
        if let Some(tolerance) = self.tolerance {
            solver = solver.with_tolerance(tolerance);
        }
        if let Some(verbose) = self.verbose {
            solver = solver.with_verbose(verbose);
        }

        Ok(ComputeConfig::default()
            .with_solver(solver)
            .with_parallel(self.parallel.unwrap_or(true)))
    }
}

/// A validated problem.
#[derive(Debug, Clone)]
pub struct Problem {
    /// Covariance over the declared assets.
    pub covariance: CovarianceMatrix,
    /// Prior returns, if given.
    pub prior: Option<ReturnVector>,
    /// Market weights, if given.
    pub market_weights: Option<Weights>,
    /// Investor views.
    pub views: Vec<View>,
    /// Prior uncertainty scale.
    pub tau: f64,
    /// Risk aversion.
    pub risk_aversion: f64,
    /// Risk-free rate.
    pub risk_free_rate: f64,
    /// Weight constraints.
    pub constraints: ConstraintConfig,
    /// Risk parity budgets.
    pub risk_budgets: Option<Weights>,
    /// Solver and parallelism settings.
    pub compute: ComputeConfig,
}

impl Problem {
    /// Reads and validates a problem file.
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let parse_error = |reason: String| CliError::Parse {
            path: path.to_path_buf(),
            reason,
        };
        let file: ProblemFile = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&text).map_err(|e| parse_error(e.to_string()))?,
            Some("json") => serde_json::from_str(&text).map_err(|e| parse_error(e.to_string()))?,
            _ => return Err(CliError::UnsupportedFormat(path.to_path_buf())),
        };

        debug!(path = %path.display(), assets = file.assets.len(), views = file.views.len(), "loaded problem");
        Self::from_file(file)
    }

    /// Validates raw file contents.
    pub fn from_file(file: ProblemFile) -> CliResult<Self> {
        let universe = AssetUniverse::new(file.assets.iter().cloned())?;
        if file.covariance.len() != universe.len() {
            return Err(CliError::InvalidProblem(format!(
                "covariance has {} rows for {} assets",
                file.covariance.len(),
                universe.len()
            )));
        }
        let covariance = CovarianceMatrix::from_rows(file.assets.iter().cloned(), &file.covariance)?;

        let prior = match &file.prior {
            Some(map) => Some(ReturnVector::from_pairs(labelled(map, &universe, "prior")?)?),
            None => None,
        };
        let market_weights = match &file.market_weights {
            Some(map) => Some(Weights::from_pairs(labelled(map, &universe, "market_weights")?)?),
            None => None,
        };
        let risk_budgets = match &file.risk_budgets {
            Some(map) => Some(Weights::from_pairs(labelled(map, &universe, "risk_budgets")?)?),
            None => None,
        };

        Ok(Self {
            covariance,
            prior,
            market_weights,
            views: file.views,
            tau: file.tau,
            risk_aversion: file.risk_aversion,
            risk_free_rate: file.risk_free_rate,
            constraints: file.constraints,
            risk_budgets,
            compute: file.solver.compute_config()?,
        })
    }

    /// Market weights, or an error naming the missing field.
    pub fn market_weights(&self) -> CliResult<&Weights> {
        self.market_weights
            .as_ref()
            .ok_or(CliError::MissingField("market_weights"))
    }

    /// The stated prior, or returns implied by the market weights.
    pub fn prior(&self) -> CliResult<ReturnVector> {
        match (&self.prior, &self.market_weights) {
            (Some(prior), _) => Ok(prior.clone()),
            (None, Some(weights)) => {
                Ok(implied_returns(weights, &self.covariance, self.risk_aversion)?)
            }
            (None, None) => Err(CliError::MissingField("prior or market_weights")),
        }
    }

    /// The encoded views, or `None` when the file has none.
    pub fn view_set(&self) -> CliResult<Option<ViewSet>> {
        if self.views.is_empty() {
            return Ok(None);
        }
        let views = ViewSetBuilder::new(&self.covariance, self.tau)
            .views(self.views.iter().cloned())
            .build()?;
        Ok(Some(views))
    }

    /// Posterior of the prior under the file's views.
    pub fn posterior(&self) -> CliResult<PosteriorDistribution> {
        let prior = self.prior()?;
        let views = self.view_set()?;
        Ok(synthesize(&prior, &self.covariance, self.tau, views.as_ref())?)
    }

    /// Expected returns and covariance to optimize against.
    pub fn inputs(&self, use_posterior: bool) -> CliResult<(ReturnVector, CovarianceMatrix)> {
        if use_posterior {
            let posterior = self.posterior()?;
            Ok((posterior.mean, posterior.covariance))
        } else {
            Ok((self.prior()?, self.covariance.clone()))
        }
    }
}

/// Orders a per-asset map like `universe`, requiring every asset.
fn labelled<'a>(
    map: &BTreeMap<String, f64>,
    universe: &'a AssetUniverse,
    field: &str,
) -> CliResult<Vec<(&'a str, f64)>> {
    if let Some(unknown) = map.keys().find(|k| !universe.contains(k)) {
        return Err(CliError::InvalidProblem(format!(
            "{field} names unknown asset '{unknown}'"
        )));
    }
    let values = universe
        .iter()
        .map(|asset| {
            map.get(asset).map(|&value| (asset, value)).ok_or_else(|| {
                CliError::InvalidProblem(format!("{field} has no value for '{asset}'"))
            })
        })
        .collect::<CliResult<Vec<_>>>()?;
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
assets = ["A", "B", "C"]
covariance = [
    [0.04, 0.01, 0.02],
    [0.01, 0.09, 0.03],
    [0.02, 0.03, 0.16],
]

[prior]
C = 0.12
A = 0.08
B = 0.10

[[views]]
kind = "absolute"
asset = "A"
target = 0.15

[[views]]
kind = "relative"
outperformer = "C"
underperformer = "B"
spread = 0.01
confidence = 0.8

[solver]
time_limit_secs = 5
parallel = false
"#;

    fn fixture() -> Problem {
        Problem::from_file(toml::from_str(FIXTURE).unwrap()).unwrap()
    }

    #[test]
    fn test_parse_toml_fixture() {
        let problem = fixture();
        let prior = problem.prior().unwrap();

        assert_eq!(prior.universe().assets(), ["A", "B", "C"]);
        assert_eq!(prior.get("C"), Some(0.12));
        assert_eq!(problem.views.len(), 2);
        assert!((problem.tau - DEFAULT_TAU).abs() < 1e-15);
        assert!(problem.constraints.long_only);
        assert!(!problem.compute.parallel);
        assert_eq!(problem.compute.solver.time_limit, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_expected_returns_alias_in_json() {
        let json = r#"{
            "assets": ["A", "B"],
            "covariance": [[0.04, 0.0], [0.0, 0.09]],
            "expected_returns": {"A": 0.05, "B": 0.07},
            "solver": {"time_limit_secs": 0}
        }"#;
        let problem = Problem::from_file(serde_json::from_str(json).unwrap()).unwrap();
        assert_eq!(problem.prior().unwrap().get("B"), Some(0.07));
        assert_eq!(problem.compute.solver.time_limit, None);
    }

    #[test]
    fn test_implied_prior_from_market_weights() {
        let json = r#"{
            "assets": ["A", "B"],
            "covariance": [[0.04, 0.0], [0.0, 0.09]],
            "market_weights": {"A": 0.6, "B": 0.4},
            "risk_aversion": 2.0
        }"#;
        let problem = Problem::from_file(serde_json::from_str(json).unwrap()).unwrap();
        let prior = problem.prior().unwrap();
        assert!((prior.get("A").unwrap() - 2.0 * 0.04 * 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_missing_prior() {
        let json = r#"{"assets": ["A"], "covariance": [[0.04]]}"#;
        let problem = Problem::from_file(serde_json::from_str(json).unwrap()).unwrap();
        assert!(matches!(problem.prior(), Err(CliError::MissingField(_))));
    }

    #[test]
    fn test_unknown_asset_in_prior() {
        let json = r#"{
            "assets": ["A"],
            "covariance": [[0.04]],
            "prior": {"A": 0.1, "Z": 0.2}
        }"#;
        let result = Problem::from_file(serde_json::from_str(json).unwrap());
        assert!(matches!(result, Err(CliError::InvalidProblem(_))));
    }

    #[test]
    fn test_posterior_uses_views() {
        let problem = fixture();
        let posterior = problem.posterior().unwrap();
        let a = posterior.mean.get("A").unwrap();
        assert!(a > 0.08 && a < 0.15);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<ProblemFile, _> =
            serde_json::from_str(r#"{"assets": [], "covariance": [], "lambda": 1}"#);
        assert!(result.is_err());
    }
}
