//! Declarative unit tests for alerting rules.
//!
//! A test case names a set of rule groups, synthetic series data, and a list
//! of assertions of the form "at offset T exactly these alerts are active".
//! `claw-ruletest` loads the data into a [`claw_metrics::MetricStore`],
//! evaluates the groups at each asserted instant and compares the active
//! alerts with the expected ones.
//!
//! # Features
//!
//! - **Label Sets**: Expected and actual alerts share one [`LabelSet`] type;
//!   expected alerts may leave out `__name__`
//! - **Order-Free Comparison**: Alerts are compared as multisets using a
//!   deterministic total order
//! - **Pluggable Engine**: Anything implementing [`EvaluableGroup`] can be
//!   tested; [`claw_alerts::RuleGroup`] is supported out of the box
//! - **Readable Failures**: Mismatches list missing and unexpected alerts
//!
//! # Example
//!
//! ```rust
//! use claw_ruletest::{TestCase, TestRunner};
//!
//! let case = TestCase::from_json(r#"{
//!     "name": "instance down",
//!     "rules": { "groups": [ { "name": "availability", "rules": [
//!         { "alert": "InstanceDown", "expr": { "metric": "up", "op": "==", "threshold": 0 } }
//!     ] } ] },
//!     "fixtures": [ { "metrics": [
//!         { "name": "up", "labels": { "instance": "0" }, "values": "1 0" }
//!     ] } ],
//!     "assertions": [
//!         { "at": "0m" },
//!         { "at": "1m", "expected": [
//!             { "alertname": "InstanceDown", "alertstate": "firing", "instance": "0" }
//!         ] }
//!     ]
//! }"#).unwrap();
//!
//! let report = TestRunner::default().run(&case).unwrap();
//! assert!(report.passed());
//! assert_eq!(report.results[1].name, "instance_down_at_1m");
//! ```

#![forbid(unsafe_code)]
#![doc(html_root_url = "https://docs.rs/claw-ruletest/0.1.0")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod case;
pub mod compare;
pub mod error;
pub mod evaluator;
pub mod fixture;
pub mod labels;
pub mod ordering;
pub mod runner;

// Re-export main types at crate root
pub use case::{test_case_name, Assertion, RuleSource, TestCase, FILENAME_INLINE};
pub use compare::{alerts_equal, assert_alerts_equal, AlertMismatch};
pub use error::{Result, RuleTestError};
pub use evaluator::{evaluate_at_instant, EvaluableGroup};
pub use fixture::{expand_values, Fixture, MetricFixture};
pub use labels::LabelSet;
pub use ordering::{alert_less_than, compare_alerts, sort_alerts, SortKey, SORT_KEY_DELIMITER};
pub use runner::{AssertionResult, Outcome, RunnerConfig, TestReport, TestRunner};
