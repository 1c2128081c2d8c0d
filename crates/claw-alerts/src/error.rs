//! Error types for the claw-alerts crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in the rule engine.
#[derive(Debug, Error)]
pub enum AlertError {
    /// Invalid alert rule configuration.
    #[error("invalid alert rule: {reason}")]
    InvalidRule {
        /// The reason the rule is invalid.
        reason: String,
    },

    /// Invalid rule group configuration.
    #[error("invalid rule group '{group}': {reason}")]
    InvalidGroup {
        /// The group name.
        group: String,
        /// The reason the group is invalid.
        reason: String,
    },

    /// Failed to evaluate a rule at an instant.
    #[error("rule '{rule}' evaluation failed: {reason}")]
    EvaluationError {
        /// The rule being evaluated.
        rule: String,
        /// The reason the evaluation failed.
        reason: String,
    },

    /// Metrics backend or metric validation error.
    #[error("metrics error: {0}")]
    MetricsError(#[from] claw_metrics::MetricsError),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// A rule file could not be read.
    #[error("failed to read rule file {}: {source}", path.display())]
    Io {
        /// The file that failed to read.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },
}

impl From<serde_json::Error> for AlertError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// Result type for rule engine operations.
pub type Result<T> = std::result::Result<T, AlertError>;
