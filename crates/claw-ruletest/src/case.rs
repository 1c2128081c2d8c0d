//! Test definitions.
//!
//! A test file is a JSON document:
//!
//! ```json
//! {
//!   "name": "Test HTTP Requests too low alert",
//!   "rules": { "from_file": "rules.json" },
//!   "fixtures": [
//!     {
//!       "interval": "1m",
//!       "metrics": [
//!         { "name": "http_requests_total", "labels": { "job": "api" }, "values": "0+60x10" }
//!       ]
//!     }
//!   ],
//!   "assertions": [
//!     { "at": "5m" },
//!     { "at": "10m", "expected": [ { "alertname": "HttpRequestsTooLow", "alertstate": "firing", "job": "api" } ] }
//!   ]
//! }
//! ```
//!
//! `rules` is either `{ "from_file": path }`, resolved against the test
//! file's directory, or `{ "groups": [...] }` in the rule file format.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use claw_alerts::{EvaluationConfig, RuleGroup, RuleGroupConfig, RuleGroupsConfig};
use claw_metrics::parse_duration;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, RuleTestError};
use crate::fixture::Fixture;
use crate::labels::LabelSet;

/// Filename recorded for test cases parsed from a string.
pub const FILENAME_INLINE: &str = "<inline>";

/// Where a test case's rule groups come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSource {
    /// A rule file, relative to the test file's directory.
    FromFile(PathBuf),
    /// Groups written inline.
    Groups(Vec<RuleGroupConfig>),
}

impl RuleSource {
    /// Reads and builds the rule groups.
    ///
    /// # Errors
    ///
    /// Returns `RuleTestError::Rules` if the rule file can't be read or the
    /// groups are invalid.
    pub fn load(&self, base_dir: &Path, config: &EvaluationConfig) -> Result<Vec<RuleGroup>> {
        let groups = match self {
            Self::FromFile(path) => RuleGroupsConfig::from_file(base_dir.join(path))?.build(config)?,
            Self::Groups(groups) => RuleGroupsConfig {
                groups: groups.clone(),
            }
            .build(config)?,
        };
        Ok(groups)
    }
}

/// One expectation: the alerts active at an offset from the fixture start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Assertion {
    /// Offset from the start, as written.
    pub at: String,
    /// Alerts expected to be active; empty means none.
    #[serde(default)]
    pub expected: Vec<LabelSet>,
}

impl Assertion {
    /// Parses the offset.
    ///
    /// # Errors
    ///
    /// Returns `RuleTestError::Metrics` if the offset is not a duration.
    pub fn offset(&self) -> Result<Duration> {
        Ok(parse_duration(&self.at)?)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TestCaseDef {
    name: String,
    rules: RuleSource,
    #[serde(default)]
    fixtures: Vec<Fixture>,
    #[serde(default)]
    assertions: Vec<Assertion>,
}

/// A loaded test case.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestCase {
    name: String,
    filename: String,
    #[serde(skip)]
    base_dir: PathBuf,
    rules: RuleSource,
    fixtures: Vec<Fixture>,
    assertions: Vec<Assertion>,
}

impl TestCase {
    /// Reads and validates a test file.
    ///
    /// # Errors
    ///
    /// Returns `RuleTestError::Io` if the file can't be read, and the errors
    /// of [`TestCase::from_json`] otherwise.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| RuleTestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let case = Self::parse(&text, path.display().to_string(), base_dir)?;
        info!(
            path = %path.display(),
            name = %case.name,
            assertions = case.assertions.len(),
            "loaded test case"
        );
        Ok(case)
    }

    /// Parses and validates a test definition held in memory.
    ///
    /// The filename is recorded as [`FILENAME_INLINE`] and a `from_file`
    /// rule source is resolved against the working directory.
    ///
    /// # Errors
    ///
    /// Returns `RuleTestError::Definition` for malformed JSON and
    /// `RuleTestError::InvalidAssertion` for an unparseable offset.
    pub fn from_json(text: &str) -> Result<Self> {
        Self::parse(text, FILENAME_INLINE.to_string(), PathBuf::new())
    }

    fn parse(text: &str, filename: String, base_dir: PathBuf) -> Result<Self> {
        let def: TestCaseDef = serde_json::from_str(text)?;

        for (index, assertion) in def.assertions.iter().enumerate() {
            assertion
                .offset()
                .map_err(|e| RuleTestError::InvalidAssertion {
                    index,
                    reason: e.to_string(),
                })?;
        }

        Ok(Self {
            name: def.name,
            filename,
            base_dir,
            rules: def.rules,
            fixtures: def.fixtures,
            assertions: def.assertions,
        })
    }

    /// Returns the test name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the file the case was loaded from, or [`FILENAME_INLINE`].
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Returns the rule source.
    #[must_use]
    pub const fn rules(&self) -> &RuleSource {
        &self.rules
    }

    /// Returns the fixtures.
    #[must_use]
    pub fn fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }

    /// Returns the assertions in order.
    #[must_use]
    pub fn assertions(&self) -> &[Assertion] {
        &self.assertions
    }

    /// Builds the rule groups, resolving rule files against the test file's
    /// directory.
    ///
    /// # Errors
    ///
    /// See [`RuleSource::load`].
    pub fn load_rule_groups(&self, config: &EvaluationConfig) -> Result<Vec<RuleGroup>> {
        self.rules.load(&self.base_dir, config)
    }

    /// Returns the report name of the assertion at `index`.
    #[must_use]
    pub fn case_name(&self, index: usize) -> Option<String> {
        self.assertions
            .get(index)
            .map(|assertion| test_case_name(&self.name, &assertion.at))
    }
}

impl FromStr for TestCase {
    type Err = RuleTestError;

    fn from_str(text: &str) -> Result<Self> {
        Self::from_json(text)
    }
}

/// Builds a report-safe name for an assertion: spaces in `name` become
/// underscores and `_at_<at>` is appended.
#[must_use]
pub fn test_case_name(name: &str, at: &str) -> String {
    format!("{}_at_{at}", name.replace(' ', "_"))
}
