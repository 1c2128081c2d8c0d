//! Command-line argument parsing with clap.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use claw_alerts::EvaluationConfig;
use claw_metrics::parse_duration;
use claw_ruletest::RunnerConfig;

use crate::error::CliError;

/// Run declarative unit tests for Clawbernetes alerting rules.
#[derive(Parser, Debug, Clone)]
#[command(name = "claw-ruletest")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Test files to run.
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, env = "CLAW_RULETEST_FORMAT", default_value_t = Format::Table)]
    pub format: Format,

    /// How far back a plain selector looks for the latest sample.
    #[arg(long, env = "CLAW_RULETEST_LOOKBACK", default_value = "5m")]
    pub lookback: String,

    /// Evaluation interval for rule groups that don't set one.
    #[arg(short, long, env = "CLAW_RULETEST_INTERVAL", default_value = "1m")]
    pub interval: String,

    /// Instant of the first fixture sample (RFC 3339). Defaults to the Unix epoch.
    #[arg(long, env = "CLAW_RULETEST_START")]
    pub start: Option<String>,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[derive(Default)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

impl Cli {
    /// Builds the runner settings from the flags.
    ///
    /// # Errors
    ///
    /// Returns `CliError::InvalidArgument` for unparseable durations, a zero
    /// interval, or a bad start instant.
    pub fn runner_config(&self) -> Result<RunnerConfig, CliError> {
        let lookback = parse_duration(&self.lookback)
            .map_err(|e| CliError::InvalidArgument(format!("--lookback: {e}")))?;
        let interval = parse_duration(&self.interval)
            .map_err(|e| CliError::InvalidArgument(format!("--interval: {e}")))?;
        if interval.is_zero() {
            return Err(CliError::InvalidArgument(
                "--interval: must be positive".to_string(),
            ));
        }

        let start = match &self.start {
            Some(text) => DateTime::parse_from_rfc3339(text)
                .map_err(|e| CliError::InvalidArgument(format!("--start: {e}")))?
                .with_timezone(&Utc),
            None => DateTime::<Utc>::UNIX_EPOCH,
        };

        Ok(RunnerConfig {
            start,
            evaluation: EvaluationConfig {
                default_interval: interval,
                lookback,
            },
        })
    }
}
