//! Running test cases.

use chrono::{DateTime, Utc};
use claw_alerts::EvaluationConfig;
use claw_metrics::{MetricStore, Queryable};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::case::{test_case_name, Assertion, TestCase};
use crate::compare::{assert_alerts_equal, AlertMismatch};
use crate::error::{Result, RuleTestError};
use crate::evaluator::{evaluate_at_instant, EvaluableGroup};

/// Runner settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Instant of the first fixture sample; assertion offsets count from here.
    pub start: DateTime<Utc>,
    /// Group interval default and lookback delta.
    pub evaluation: EvaluationConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            start: DateTime::<Utc>::UNIX_EPOCH,
            evaluation: EvaluationConfig::default(),
        }
    }
}

/// Verdict of one assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    /// The active alerts matched.
    Passed,
    /// The active alerts differed from the expected ones.
    Failed(AlertMismatch),
    /// The rules could not be evaluated.
    Errored(String),
}

impl Outcome {
    /// Returns true for [`Outcome::Passed`].
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// Result of one assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionResult {
    /// Report name, see [`test_case_name`].
    pub name: String,
    /// Offset as written.
    pub at: String,
    /// The verdict.
    pub outcome: Outcome,
}

/// Results of one test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestReport {
    /// Test name.
    pub name: String,
    /// File the case came from.
    pub filename: String,
    /// One entry per assertion that ran, in order.
    pub results: Vec<AssertionResult>,
    /// Assertions not run after an evaluation error.
    pub skipped: usize,
}

impl TestReport {
    /// Returns true if every assertion ran and passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.skipped == 0 && self.results.iter().all(|r| r.outcome.is_passed())
    }

    /// Number of passed assertions.
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Passed))
    }

    /// Number of failed assertions.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    /// Number of errored assertions.
    #[must_use]
    pub fn errored_count(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Errored(_)))
    }

    /// Number of assertions in the test case.
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len() + self.skipped
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Runs test cases against a fresh in-memory store each.
#[derive(Debug, Clone, Default)]
pub struct TestRunner {
    config: RunnerConfig,
}

impl TestRunner {
    /// Creates a runner.
    #[must_use]
    pub const fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Returns the runner settings.
    #[must_use]
    pub const fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Loads the case's rules and fixtures, then checks every assertion.
    ///
    /// # Errors
    ///
    /// Returns an error if the rules or fixtures can't be loaded. Failing
    /// assertions and evaluation errors are recorded in the report.
    pub fn run(&self, case: &TestCase) -> Result<TestReport> {
        let groups = case.load_rule_groups(&self.config.evaluation)?;

        let store = MetricStore::new();
        let start = self.config.start.timestamp_millis();
        for fixture in case.fixtures() {
            fixture.load_into(&store, start)?;
        }

        Ok(self.run_assertions(case, &groups, Some(&store)))
    }

    /// Checks every assertion of `case` against already loaded groups and
    /// data.
    ///
    /// Assertions run in order. The first evaluation error is recorded as
    /// [`Outcome::Errored`] and the remaining assertions are skipped.
    pub fn run_assertions<G: EvaluableGroup>(
        &self,
        case: &TestCase,
        groups: &[G],
        queryable: Option<&dyn Queryable>,
    ) -> TestReport {
        let assertions = case.assertions();
        let mut results = Vec::with_capacity(assertions.len());
        let mut skipped = 0;

        for (index, assertion) in assertions.iter().enumerate() {
            let name = test_case_name(case.name(), &assertion.at);

            let evaluated = self
                .instant(index, assertion)
                .and_then(|at| evaluate_at_instant(queryable, groups, at));

            let outcome = match evaluated {
                Ok(actual) => match assert_alerts_equal(&assertion.expected, &actual) {
                    Ok(()) => Outcome::Passed,
                    Err(mismatch) => Outcome::Failed(mismatch),
                },
                Err(e) => Outcome::Errored(e.to_string()),
            };
            debug!(case = %name, outcome = outcome_label(&outcome), "checked assertion");

            let errored = matches!(outcome, Outcome::Errored(_));
            results.push(AssertionResult {
                name,
                at: assertion.at.clone(),
                outcome,
            });

            if errored {
                skipped = assertions.len() - index - 1;
                warn!(test = %case.name(), skipped, "evaluation failed, skipping remaining assertions");
                break;
            }
        }

        let report = TestReport {
            name: case.name().to_string(),
            filename: case.filename().to_string(),
            results,
            skipped,
        };
        info!(
            test = %report.name,
            passed = report.passed_count(),
            failed = report.failed_count(),
            errored = report.errored_count(),
            skipped = report.skipped,
            "test case finished"
        );
        report
    }

    fn instant(&self, index: usize, assertion: &Assertion) -> Result<DateTime<Utc>> {
        let invalid = |reason: String| RuleTestError::InvalidAssertion { index, reason };

        let offset = assertion.offset()?;
        let offset = chrono::Duration::from_std(offset)
            .map_err(|_| invalid(format!("offset '{}' is too large", assertion.at)))?;
        self.config
            .start
            .checked_add_signed(offset)
            .ok_or_else(|| invalid(format!("offset '{}' is out of range", assertion.at)))
    }
}

const fn outcome_label(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::Passed => "passed",
        Outcome::Failed(_) => "failed",
        Outcome::Errored(_) => "errored",
    }
}
