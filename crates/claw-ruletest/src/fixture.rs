//! Synthetic time-series fixtures.
//!
//! A fixture lists metrics with one value token per interval step:
//!
//! | Token | Expands to |
//! |---|---|
//! | `1.5` | one sample |
//! | `_` | one step with no sample |
//! | `3x2` | `3 3 3` |
//! | `1+2x3` | `1 3 5 7` |
//! | `10-1x2` | `10 9 8` |
//! | `_x3` | three steps with no sample |

use std::time::Duration;

use claw_metrics::{parse_duration, Labels, MetricName, MetricStore, Sample};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, RuleTestError};

fn default_interval() -> String {
    "1m".to_string()
}

/// A block of series sharing one sampling interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Fixture {
    /// Step between consecutive values.
    #[serde(default = "default_interval")]
    pub interval: String,
    /// The series.
    #[serde(default)]
    pub metrics: Vec<MetricFixture>,
}

/// One series in a fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricFixture {
    /// Metric name.
    pub name: String,
    /// Series labels.
    #[serde(default, skip_serializing_if = "Labels::is_empty")]
    pub labels: Labels,
    /// Value tokens, whitespace separated.
    pub values: String,
}

impl Fixture {
    /// Parses the sampling interval.
    ///
    /// # Errors
    ///
    /// Returns `RuleTestError::Metrics` for unparseable text and
    /// `RuleTestError::InvalidFixture` for a zero interval.
    pub fn interval(&self) -> Result<Duration> {
        let interval = parse_duration(&self.interval)?;
        if interval.is_zero() {
            return Err(RuleTestError::InvalidFixture {
                reason: "interval must be positive".to_string(),
            });
        }
        Ok(interval)
    }

    /// Writes every series into `store`, the first value at `start_millis`.
    ///
    /// Returns the number of samples written.
    ///
    /// # Errors
    ///
    /// Returns an error for a bad interval, metric name, label name or value
    /// token.
    pub fn load_into(&self, store: &MetricStore, start_millis: i64) -> Result<usize> {
        let step = i64::try_from(self.interval()?.as_millis()).map_err(|_| {
            RuleTestError::InvalidFixture {
                reason: format!("interval '{}' is too large", self.interval),
            }
        })?;

        let mut written = 0;
        for metric in &self.metrics {
            let name = MetricName::new(&metric.name)?;
            let values = expand_values(&metric.values).map_err(|e| match e {
                RuleTestError::InvalidFixture { reason } => RuleTestError::InvalidFixture {
                    reason: format!("metric '{}': {reason}", metric.name),
                },
                other => other,
            })?;

            let mut samples = Vec::with_capacity(values.len());
            let mut timestamp = start_millis;
            for value in values {
                if let Some(value) = value {
                    samples.push(Sample::new(timestamp, value));
                }
                timestamp = timestamp.saturating_add(step);
            }

            written += samples.len();
            store.push_batch(&name, &metric.labels, samples)?;
        }

        debug!(
            interval = %self.interval,
            series = self.metrics.len(),
            samples = written,
            "loaded fixture"
        );
        Ok(written)
    }
}

/// Expands value notation into one entry per step; `None` marks a step
/// without a sample.
///
/// # Errors
///
/// Returns `RuleTestError::InvalidFixture` for a token that is not a
/// number, `_`, or one of the expanding forms.
pub fn expand_values(text: &str) -> Result<Vec<Option<f64>>> {
    let mut values = Vec::new();
    for token in text.split_whitespace() {
        expand_token(token, &mut values)?;
    }
    Ok(values)
}

fn expand_token(token: &str, out: &mut Vec<Option<f64>>) -> Result<()> {
    if token == "_" {
        out.push(None);
        return Ok(());
    }

    let Some((series, count)) = token.rsplit_once('x') else {
        out.push(Some(parse_value(token)?));
        return Ok(());
    };
    let count: usize = count.parse().map_err(|_| invalid_token(token))?;

    if series == "_" {
        out.extend(std::iter::repeat_n(None, count));
        return Ok(());
    }

    let (start, delta) = match split_delta(series) {
        Some((start, sign, delta)) => (
            parse_value(start)?,
            sign * parse_value(delta).map_err(|_| invalid_token(token))?,
        ),
        None => (parse_value(series).map_err(|_| invalid_token(token))?, 0.0),
    };

    let mut value = start;
    out.reserve(count + 1);
    for _ in 0..=count {
        out.push(Some(value));
        value += delta;
    }
    Ok(())
}

/// Splits `a+b` or `a-b` at the operator, skipping a leading sign and
/// exponent signs such as `1e-3`.
fn split_delta(series: &str) -> Option<(&str, f64, &str)> {
    let bytes = series.as_bytes();
    let pos = (1..bytes.len())
        .rev()
        .find(|&i| matches!(bytes[i], b'+' | b'-') && !matches!(bytes[i - 1], b'e' | b'E'))?;
    let sign = if bytes[pos] == b'+' { 1.0 } else { -1.0 };
    Some((&series[..pos], sign, &series[pos + 1..]))
}

fn parse_value(text: &str) -> Result<f64> {
    text.parse().map_err(|_| invalid_token(text))
}

fn invalid_token(token: &str) -> RuleTestError {
    RuleTestError::InvalidFixture {
        reason: format!("invalid value token '{token}'"),
    }
}
