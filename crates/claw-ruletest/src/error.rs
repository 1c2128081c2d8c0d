//! Error types for the claw-ruletest crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or running rule tests.
///
/// An assertion whose alerts don't match is not an error; it is reported as
/// a failed [`crate::runner::Outcome`].
#[derive(Debug, Error)]
pub enum RuleTestError {
    /// A test or rule file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The file that failed to read.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// The test definition is malformed.
    #[error("invalid test definition: {0}")]
    Definition(String),

    /// An assertion is malformed.
    #[error("invalid assertion {index}: {reason}")]
    InvalidAssertion {
        /// Position of the assertion in the test case.
        index: usize,
        /// The reason the assertion is invalid.
        reason: String,
    },

    /// A fixture is malformed.
    #[error("invalid fixture: {reason}")]
    InvalidFixture {
        /// The reason the fixture is invalid.
        reason: String,
    },

    /// Loading or building rule groups failed.
    #[error("rules error: {0}")]
    Rules(#[from] claw_alerts::AlertError),

    /// Metric storage or validation failed.
    #[error("metrics error: {0}")]
    Metrics(#[from] claw_metrics::MetricsError),

    /// A rule group failed to evaluate.
    #[error("evaluating rule group '{group}': {source}")]
    Evaluation {
        /// The group that failed.
        group: String,
        /// The engine's error, unchanged.
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl From<serde_json::Error> for RuleTestError {
    fn from(err: serde_json::Error) -> Self {
        Self::Definition(err.to_string())
    }
}

/// Result type for rule test operations.
pub type Result<T> = std::result::Result<T, RuleTestError>;
