//! End-to-end tests for the `claw-ruletest` binary.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

// ==================== Helper Functions ====================

fn testdata(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../claw-ruletest/testdata")
        .join(name)
}

fn bin() -> Command {
    let mut cmd = Command::cargo_bin("claw-ruletest").expect("binary built");
    cmd.env_remove("CLAW_RULETEST_FORMAT")
        .env_remove("CLAW_RULETEST_LOOKBACK")
        .env_remove("CLAW_RULETEST_INTERVAL")
        .env_remove("CLAW_RULETEST_START");
    cmd
}

const FAILING: &str = r#"{
    "name": "instance down",
    "rules": { "groups": [ { "name": "availability", "rules": [
        { "alert": "InstanceDown", "expr": { "metric": "up", "op": "==", "threshold": 0 } }
    ] } ] },
    "fixtures": [ { "metrics": [ { "name": "up", "values": "0" } ] } ],
    "assertions": [ { "at": "0s" } ]
}"#;

// ==================== Tests ====================

#[test]
fn test_passing_file_exits_zero() {
    bin()
        .arg(testdata("test.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "PASS   Test_HTTP_Requests_too_low_alert_at_14m",
        ))
        .stdout(predicate::str::contains("3 passed, 0 failed, 0 errored, 0 skipped"));
}

#[test]
fn test_failing_file_exits_nonzero() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("failing.json");
    fs::write(&path, FAILING).expect("write");

    bin()
        .arg(&path)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("FAIL   instance_down_at_0s"))
        .stdout(predicate::str::contains("unexpected:"));
}

#[test]
fn test_missing_file_exits_nonzero() {
    bin()
        .arg(testdata("test.json"))
        .arg("/nonexistent/test.json")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("/nonexistent/test.json: LOAD ERROR"))
        .stdout(predicate::str::contains("1 file(s) failed to load"));
}

#[test]
fn test_json_format() {
    let output = bin()
        .args(["--format", "json"])
        .arg(testdata("test.json"))
        .output()
        .expect("run binary");
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(value["passed"], 3);
    assert_eq!(
        value["files"][0]["report"]["name"],
        "Test HTTP Requests too low alert"
    );
}

#[test]
fn test_format_from_env() {
    bin()
        .env("CLAW_RULETEST_FORMAT", "json")
        .arg(testdata("test.json"))
        .assert()
        .success()
        .stdout(predicate::str::starts_with("{"));
}

#[test]
fn test_bad_lookback_is_usage_error() {
    bin()
        .args(["--lookback", "whenever"])
        .arg(testdata("test.json"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid argument: --lookback"));
}

#[test]
fn test_no_files_is_rejected() {
    bin().assert().failure();
}
