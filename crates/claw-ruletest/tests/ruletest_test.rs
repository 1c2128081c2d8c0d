//! Integration tests for loading and running rule test files.

use std::fs;
use std::path::{Path, PathBuf};

use claw_ruletest::{
    LabelSet, Outcome, RuleSource, RuleTestError, RunnerConfig, TestCase, TestRunner,
    FILENAME_INLINE,
};

// ==================== Helper Functions ====================

fn testdata(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata").join(name)
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("failed to write test file");
    path
}

const RULES: &str = r#"{
    "groups": [
        { "name": "availability", "rules": [
            { "alert": "InstanceDown", "expr": { "metric": "up", "op": "==", "threshold": 0 } }
        ] }
    ]
}"#;

fn case_json(rules: &str, expected_state: &str) -> String {
    format!(
        r#"{{
            "name": "instance down",
            "rules": {rules},
            "fixtures": [ {{ "metrics": [
                {{ "name": "up", "labels": {{ "instance": "0" }}, "values": "1 0" }}
            ] }} ],
            "assertions": [
                {{ "at": "0s" }},
                {{ "at": "1m", "expected": [
                    {{ "alertname": "InstanceDown", "alertstate": "{expected_state}", "instance": "0" }}
                ] }}
            ]
        }}"#
    )
}

// ==================== Loading Tests ====================

#[test]
fn test_load_file_defaults_missing_expected() {
    let case = TestCase::from_file(testdata("test.json")).expect("load test.json");

    assert_eq!(case.name(), "Test HTTP Requests too low alert");
    assert!(case.filename().ends_with("test.json"));
    assert_eq!(case.assertions().len(), 3);
    assert_eq!(case.assertions()[0].expected.len(), 1);
    assert_eq!(case.assertions()[2].expected, Vec::<LabelSet>::new());
    assert_eq!(
        case.rules(),
        &RuleSource::FromFile(PathBuf::from("rules.json"))
    );
    assert_eq!(
        case.case_name(1).as_deref(),
        Some("Test_HTTP_Requests_too_low_alert_at_14m")
    );
}

#[test]
fn test_load_inline_records_inline_filename() {
    let case = TestCase::from_json(&case_json(r#"{ "groups": [] }"#, "firing"))
        .expect("parse inline case");
    assert_eq!(case.filename(), FILENAME_INLINE);
}

#[test]
fn test_load_malformed_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write(dir.path(), "broken.json", "{ \"name\": ");
    assert!(matches!(
        TestCase::from_file(path),
        Err(RuleTestError::Definition(_))
    ));
}

// ==================== Runner Tests ====================

#[test]
fn test_run_testdata_passes() {
    let case = TestCase::from_file(testdata("test.json")).expect("load test.json");
    let report = TestRunner::default().run(&case).expect("run test.json");

    assert!(report.passed(), "{report:#?}");
    assert_eq!(report.passed_count(), 3);
    assert_eq!(report.results[0].name, "Test_HTTP_Requests_too_low_alert_at_12m");
}

#[test]
fn test_rules_file_resolved_next_to_test_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "rules.json", RULES);
    let path = write(
        dir.path(),
        "test.json",
        &case_json(r#"{ "from_file": "rules.json" }"#, "firing"),
    );

    let case = TestCase::from_file(&path).expect("load case");
    let report = TestRunner::default().run(&case).expect("run case");
    assert!(report.passed(), "{report:#?}");
}

#[test]
fn test_failed_assertion_reports_mismatch() {
    let rules = format!(r#"{{ "groups": {} }}"#, extract_groups());
    let case = TestCase::from_json(&case_json(&rules, "pending")).expect("parse case");
    let report = TestRunner::default().run(&case).expect("run case");

    assert!(!report.passed());
    assert_eq!(report.failed_count(), 1);
    let Outcome::Failed(mismatch) = &report.results[1].outcome else {
        panic!("expected a failure, got {:?}", report.results[1].outcome);
    };
    assert_eq!(mismatch.missing[0].get("alertstate"), Some("pending"));
    assert_eq!(mismatch.unexpected[0].get("alertstate"), Some("firing"));
    assert!(mismatch.to_string().contains("unexpected:"));
}

#[test]
fn test_mismatch_does_not_stop_later_assertions() {
    let case = TestCase::from_json(&format!(
        r#"{{
            "name": "early miss",
            "rules": {{ "groups": {} }},
            "fixtures": [ {{ "metrics": [
                {{ "name": "up", "labels": {{ "instance": "0" }}, "values": "1 0 0" }}
            ] }} ],
            "assertions": [
                {{ "at": "0s", "expected": [
                    {{ "alertname": "InstanceDown", "alertstate": "firing", "instance": "0" }}
                ] }},
                {{ "at": "1m", "expected": [
                    {{ "alertname": "InstanceDown", "alertstate": "firing", "instance": "0" }}
                ] }},
                {{ "at": "2m", "expected": [
                    {{ "alertname": "InstanceDown", "alertstate": "firing", "instance": "0" }}
                ] }}
            ]
        }}"#,
        extract_groups()
    ))
    .expect("parse case");
    let report = TestRunner::default().run(&case).expect("run case");

    assert_eq!(report.results.len(), report.total());
    assert_eq!(report.skipped, 0);
    assert_eq!(report.failed_count(), 1);
    assert_eq!(report.passed_count(), 2);
    assert!(matches!(report.results[0].outcome, Outcome::Failed(_)));
    assert!(report.results[1].outcome.is_passed());
    assert!(report.results[2].outcome.is_passed());
}

#[test]
fn test_custom_lookback_hides_stale_samples() {
    let case = TestCase::from_json(&format!(
        r#"{{
            "name": "stale",
            "rules": {{ "groups": {} }},
            "fixtures": [ {{ "metrics": [ {{ "name": "up", "values": "0" }} ] }} ],
            "assertions": [ {{ "at": "2m" }} ]
        }}"#,
        extract_groups()
    ))
    .expect("parse case");

    let mut config = RunnerConfig::default();
    config.evaluation.lookback = std::time::Duration::from_secs(60);
    let report = TestRunner::new(config).run(&case).expect("run case");
    assert!(report.passed(), "{report:#?}");

    // default lookback of 5m still sees the sample
    let report = TestRunner::default().run(&case).expect("run case");
    assert!(!report.passed());
}

#[test]
fn test_missing_rules_file_is_load_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write(
        dir.path(),
        "test.json",
        &case_json(r#"{ "from_file": "missing.json" }"#, "firing"),
    );
    let case = TestCase::from_file(&path).expect("load case");
    assert!(matches!(
        TestRunner::default().run(&case),
        Err(RuleTestError::Rules(_))
    ));
}

fn extract_groups() -> String {
    let value: serde_json::Value = serde_json::from_str(RULES).expect("rules json");
    value["groups"].to_string()
}
