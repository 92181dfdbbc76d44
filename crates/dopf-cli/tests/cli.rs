//! Integration tests for the `dopf` binary

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

const CHAIN_CASE: &str = r#"{
  "nodes": [1, 2, 3, 4],
  "lines": [{"from": 1, "to": 2}, {"from": 2, "to": 3}, {"from": 3, "to": 4}],
  "horizon": 2,
  "load": {"4": [10.0, 12.0]},
  "price": [0.1, 0.3]
}"#;

const TWO_AREAS: &str = r#"
[[areas]]
name = "area1"
up_local_node = 1
up_global_node = 1

[[areas.down]]
area = "area2"
local_node = "D2"
global_node = 2

[[areas]]
name = "area2"
up_area = "area1"
up_local_node = "U3"
up_global_node = 3
"#;

fn write_inputs(dir: &Path) -> (PathBuf, PathBuf) {
    let case = dir.join("chain.json");
    let areas = dir.join("areas.toml");
    fs::write(&case, CHAIN_CASE).unwrap();
    fs::write(&areas, TWO_AREAS).unwrap();
    (case, areas)
}

#[test]
fn test_help_lists_subcommands() {
    cargo_bin_cmd!("dopf")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("solve"))
        .stdout(predicate::str::contains("partition"))
        .stdout(predicate::str::contains("inspect"));
}

#[test]
fn test_inspect_reports_case_shape() {
    let dir = TempDir::new().unwrap();
    let (case, _) = write_inputs(dir.path());
    cargo_bin_cmd!("dopf")
        .args(["--log-level", "warn", "inspect", "--case"])
        .arg(&case)
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"Nodes\s+4").unwrap())
        .stdout(predicate::str::contains("Sources").and(predicate::str::contains("[1]")));
}

#[test]
fn test_partition_prints_areas_and_tie_lines() {
    let dir = TempDir::new().unwrap();
    let (case, areas) = write_inputs(dir.path());
    cargo_bin_cmd!("dopf")
        .args(["--log-level", "warn", "partition", "--case"])
        .arg(&case)
        .arg("--areas")
        .arg(&areas)
        .assert()
        .success()
        .stdout(predicate::str::contains("area1"))
        .stdout(predicate::str::contains("sources=[U3]"))
        .stdout(predicate::str::contains("tie-line 2->3"));
}

#[test]
fn test_partition_json() {
    let dir = TempDir::new().unwrap();
    let (case, areas) = write_inputs(dir.path());
    let output = cargo_bin_cmd!("dopf")
        .args(["--log-level", "warn", "partition", "--json", "--case"])
        .arg(&case)
        .arg("--areas")
        .arg(&areas)
        .output()
        .unwrap();
    assert!(output.status.success());
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["areas"].as_array().unwrap().len(), 2);
    assert_eq!(summary["areas"][1]["upstream"], "area1");
}

#[test]
fn test_solve_all_methods_writes_exports() {
    let dir = TempDir::new().unwrap();
    let (case, areas) = write_inputs(dir.path());
    let out = dir.path().join("out");
    cargo_bin_cmd!("dopf")
        .args(["--log-level", "warn", "solve", "--case"])
        .arg(&case)
        .arg("--areas")
        .arg(&areas)
        .args(["--method", "all", "--rho", "1.0", "--out"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("centralized"))
        .stdout(predicate::str::contains("admm"))
        .stdout(predicate::str::contains("enapp"));

    for name in [
        "centralized_dispatch.json",
        "centralized_dispatch.csv",
        "admm_outcome.json",
        "admm_trace.csv",
        "enapp_dispatch.csv",
        "enapp_trace.csv",
    ] {
        assert!(out.join(name).exists(), "missing {name}");
    }
    let trace = fs::read_to_string(out.join("enapp_trace.csv")).unwrap();
    assert!(trace.starts_with("iteration,tolerance,objective,augmented_objective"));
}

#[test]
fn test_solve_reads_coordinator_config() {
    let dir = TempDir::new().unwrap();
    let (case, areas) = write_inputs(dir.path());
    let config = dir.path().join("run.toml");
    fs::write(&config, "[admm]\nrho = 1.0\nmax_iter = 2\n").unwrap();
    cargo_bin_cmd!("dopf")
        .args(["--log-level", "warn", "solve", "--method", "admm", "--case"])
        .arg(&case)
        .arg("--areas")
        .arg(&areas)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("max_iter_reached"));
}

#[test]
fn test_missing_case_fails() {
    cargo_bin_cmd!("dopf")
        .args(["solve", "--case", "does/not/exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("exist.json"));
}

#[test]
fn test_builtin_areas_do_not_fit_chain_case() {
    let dir = TempDir::new().unwrap();
    let (case, _) = write_inputs(dir.path());
    cargo_bin_cmd!("dopf")
        .args(["solve", "--method", "enapp", "--case"])
        .arg(&case)
        .assert()
        .failure()
        .stderr(predicate::str::contains("partitioning"));
}
