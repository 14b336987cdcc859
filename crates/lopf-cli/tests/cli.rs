//! Integration tests for the `lopf` binary

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_help_lists_commands() {
    let mut cmd = cargo_bin_cmd!("lopf");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_config_prints_defaults() {
    let mut cmd = cargo_bin_cmd!("lopf");
    cmd.arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("horizon_hours = 10"))
        .stdout(predicate::str::contains("block_size = 3"))
        .stdout(predicate::str::contains("link_dispatch = \"optimised\""));
}

#[test]
fn test_run_with_checks() {
    let mut cmd = cargo_bin_cmd!("lopf");
    cmd.args(["run", "--check", "--log-level", "warn"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Network: 6 buses"))
        .stdout(predicate::str::contains("SubNetwork 1"))
        .stdout(predicate::str::contains("Status: optimal"))
        .stdout(predicate::str::contains("Generator and storage capacities:"))
        .stdout(predicate::str::contains("Bus injections:"))
        .stdout(predicate::str::contains("Comparing bus injection to branch outgoing"))
        .stdout(predicate::str::contains("Consistency checks passed"));
}

#[test]
fn test_invalid_block_size_exits_with_2() {
    let mut cmd = cargo_bin_cmd!("lopf");
    cmd.args(["run", "--block-size", "1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("block_size must be at least 2"));
}

#[test]
fn test_report_snapshot_out_of_range() {
    let mut cmd = cargo_bin_cmd!("lopf");
    cmd.args(["run", "--solve-snapshots", "2", "--report-snapshot", "5"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--report-snapshot 5"));
}

#[test]
fn test_config_file_and_json_report() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("demo.toml");
    fs::write(
        &config_path,
        "horizon_hours = 6\nsolve_snapshot_count = 2\nrandom_seed = 3\nlink_dispatch = \"scheduled\"\n",
    )
    .unwrap();
    let json_path = dir.path().join("run.json");

    let mut cmd = cargo_bin_cmd!("lopf");
    cmd.args(["run", "--check", "--config"])
        .arg(&config_path)
        .arg("--json")
        .arg(&json_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("6 snapshots"));

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(report["config"]["horizon_hours"], 6);
    assert_eq!(report["snapshots"].as_array().unwrap().len(), 2);
    assert_eq!(report["summary"]["status"], "Optimal");
    assert!(report["consistency"]["max_imbalance"].as_f64().unwrap() < 1e-3);
    assert_eq!(report["capacities"].as_array().unwrap().len(), 12 + 6 + 6 + 2);
}

#[test]
fn test_unknown_config_field_rejected() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("bad.toml");
    fs::write(&config_path, "horizon = 6\n").unwrap();

    let mut cmd = cargo_bin_cmd!("lopf");
    cmd.args(["config", "--config"])
        .arg(&config_path)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("loading configuration"));
}

#[test]
fn test_oversized_network_exits_with_2() {
    let mut cmd = cargo_bin_cmd!("lopf");
    cmd.args(["run", "--block-size", &usize::MAX.to_string(), "--replicas", "2"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("too large"));
}
