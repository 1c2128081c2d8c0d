//! Error types for the claw-metrics crate.

use thiserror::Error;

/// Errors that can occur in the metrics system.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// The metric name is invalid (empty or contains invalid characters).
    #[error("invalid metric name: {reason}")]
    InvalidMetricName {
        /// The reason the name is invalid.
        reason: String,
    },

    /// The time range is invalid (start > end).
    #[error("invalid time range: start={start}, end={end}")]
    InvalidTimeRange {
        /// Start timestamp.
        start: i64,
        /// End timestamp.
        end: i64,
    },

    /// A duration string could not be parsed.
    #[error("invalid duration '{input}': {reason}")]
    InvalidDuration {
        /// The text that failed to parse.
        input: String,
        /// The reason parsing failed.
        reason: String,
    },

    /// A label name is invalid.
    #[error("invalid label name: {name}")]
    InvalidLabelName {
        /// The offending label name.
        name: String,
    },

    /// Storage operation failed.
    #[error("storage error: {reason}")]
    StorageError {
        /// The reason the storage operation failed.
        reason: String,
    },
}

/// Result type for metrics operations.
pub type Result<T> = std::result::Result<T, MetricsError>;
