//! End-to-end tests for the `meridian` binary.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

const PROBLEM: &str = r#"
assets = ["A", "B", "C"]
covariance = [
    [0.04, 0.01, 0.02],
    [0.01, 0.09, 0.03],
    [0.02, 0.03, 0.16],
]
risk_free_rate = 0.02

[prior]
A = 0.08
B = 0.10
C = 0.12

[market_weights]
A = 0.5
B = 0.3
C = 0.2

[[views]]
kind = "absolute"
asset = "A"
target = 0.15
confidence = 0.5

[risk_budgets]
A = 0.5
B = 0.3
C = 0.2

[solver]
parallel = false
"#;

fn problem_file(contents: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn meridian() -> Command {
    Command::cargo_bin("meridian").unwrap()
}

fn json_output(args: &[&str]) -> serde_json::Value {
    let output = meridian().args(args).output().unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_help_lists_commands() {
    meridian()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("posterior"))
        .stdout(predicate::str::contains("risk-parity"))
        .stdout(predicate::str::contains("diagnostics"));
}

#[test]
fn test_posterior_json_moves_viewed_asset() {
    let file = problem_file(PROBLEM, ".toml");
    let path = file.path().to_str().unwrap();
    let report = json_output(&["--format", "json", "posterior", path]);

    assert_eq!(report["views"].as_array().unwrap().len(), 1);
    let a = &report["assets"][0];
    assert_eq!(a["asset"], "A");
    let posterior = a["posterior"].as_f64().unwrap();
    assert!(posterior > 0.08 && posterior < 0.15);
}

#[test]
fn test_posterior_without_views_is_prior() {
    let file = problem_file(PROBLEM, ".toml");
    let path = file.path().to_str().unwrap();
    let report = json_output(&["-f", "json", "posterior", path, "--no-views"]);

    for row in report["assets"].as_array().unwrap() {
        let diff = row["posterior"].as_f64().unwrap() - row["prior"].as_f64().unwrap();
        assert!(diff.abs() < 1e-12);
    }
}

#[test]
fn test_implied_table() {
    let file = problem_file(PROBLEM, ".toml");
    meridian()
        .args(["implied", file.path().to_str().unwrap(), "-d", "2.5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Implied Returns"))
        .stdout(predicate::str::contains("Market Weight"));
}

#[test]
fn test_optimize_min_variance_csv() {
    let file = problem_file(PROBLEM, ".toml");
    meridian()
        .args([
            "--format",
            "csv",
            "optimize",
            file.path().to_str().unwrap(),
            "--method",
            "min-variance",
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("asset,weight"))
        .stdout(predicate::str::contains("C,"));
}

#[test]
fn test_optimize_json_weights_sum_to_one() {
    let file = problem_file(PROBLEM, ".toml");
    let path = file.path().to_str().unwrap();
    let report = json_output(&["-f", "json", "optimize", path, "--posterior"]);

    assert_eq!(report["method"], "mean_variance");
    let total: f64 = report["weights"]
        .as_object()
        .unwrap()
        .values()
        .map(|w| w.as_f64().unwrap())
        .sum();
    assert!((total - 1.0).abs() < 1e-6);
}

#[test]
fn test_frontier_json_points() {
    let file = problem_file(PROBLEM, ".toml");
    let path = file.path().to_str().unwrap();
    let rows = json_output(&["-f", "json", "frontier", path, "--points", "5"]);

    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 5);
    let first = rows[0]["target_return"].as_f64().unwrap();
    let last = rows[4]["target_return"].as_f64().unwrap();
    assert!(first < last);
}

#[test]
fn test_frontier_rejects_zero_points() {
    let file = problem_file(PROBLEM, ".toml");
    meridian()
        .args(["frontier", file.path().to_str().unwrap(), "--points", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("points must be at least 1"));
}

#[test]
fn test_risk_parity_with_budgets() {
    let file = problem_file(PROBLEM, ".toml");
    let path = file.path().to_str().unwrap();
    let report = json_output(&["-f", "json", "risk-parity", path, "--budgets"]);

    assert_eq!(report["converged"], true);
    let assets = report["assets"].as_array().unwrap();
    let fraction = assets[0]["fraction"].as_f64().unwrap();
    assert!((fraction - 0.5).abs() < 1e-3);
}

#[test]
fn test_risk_parity_strict_fails_without_convergence() {
    let file = problem_file(PROBLEM, ".toml");
    meridian()
        .args([
            "risk-parity",
            file.path().to_str().unwrap(),
            "--max-iterations",
            "1",
            "--strict",
        ])
        .assert()
        .failure();
}

#[test]
fn test_compare_lists_strategies() {
    let file = problem_file(PROBLEM, ".toml");
    meridian()
        .args(["compare", file.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("minimum_variance"))
        .stdout(predicate::str::contains("equal_weight"));
}

#[test]
fn test_compare_selected_strategies_json() {
    let file = problem_file(PROBLEM, ".toml");
    let path = file.path().to_str().unwrap();
    let rows = json_output(&["-f", "json", "compare", path, "-s", "risk-parity,equal-weight"]);

    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["strategy"], "risk_parity");
    assert_eq!(rows[1]["n_positions"], 3);
}

#[test]
fn test_diagnostics_json() {
    let file = problem_file(PROBLEM, ".toml");
    let path = file.path().to_str().unwrap();
    let report = json_output(&["-f", "json", "diagnostics", path, "--repair"]);

    assert_eq!(report["repaired"], true);
    assert_eq!(report["diagnostics"]["is_positive_definite"], true);
    assert_eq!(report["assets"].as_array().unwrap().len(), 3);
}

#[test]
fn test_json_problem_file() {
    let json = r#"{
        "assets": ["A", "B"],
        "covariance": [[0.04, 0.0], [0.0, 0.09]],
        "expected_returns": {"A": 0.05, "B": 0.07}
    }"#;
    let file = problem_file(json, ".json");
    meridian()
        .args(["-f", "minimal", "optimize", file.path().to_str().unwrap(), "-m", "min-variance"])
        .assert()
        .success();
}

#[test]
fn test_missing_file() {
    meridian()
        .args(["posterior", "/nonexistent/problem.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_unsupported_extension() {
    let file = problem_file(PROBLEM, ".yaml");
    meridian()
        .args(["posterior", file.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported problem file"));
}
