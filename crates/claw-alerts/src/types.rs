//! Core types for the rule engine.
//!
//! This module provides the fundamental types used throughout the claw-alerts crate:
//! - [`AlertState`]: Whether an active alert is pending or firing
//! - [`ComparisonOperator`]: Operators for comparing series values to a threshold
//! - [`RangeFunction`]: Functions reducing a range of samples to one value
//! - [`AlertCondition`]: The expression an alerting rule evaluates
//! - [`AlertRule`]: A named condition with a hold duration and labels
//! - [`AlertSeries`]: One active alert produced by an evaluation

use std::collections::BTreeMap;
use std::time::Duration;

use claw_metrics::{
    format_duration, rate, Aggregation, Labels, MetricName, Queryable, Sample, TimeRange,
    METRIC_NAME_LABEL,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AlertError, Result};

/// Metric name of every alert series.
pub const ALERTS_METRIC: &str = "ALERTS";

/// Label carrying the alerting rule's name.
pub const ALERT_NAME_LABEL: &str = "alertname";

/// Label carrying the alert's state.
pub const ALERT_STATE_LABEL: &str = "alertstate";

/// Converts a Duration to milliseconds as i64.
/// Durations exceeding ~292 million years will be truncated.
#[allow(clippy::cast_possible_truncation)]
pub(crate) const fn duration_to_millis(duration: Duration) -> i64 {
    duration.as_millis() as i64
}

/// The state of an active alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertState {
    /// The condition holds but hasn't held for the rule's hold duration yet.
    Pending,
    /// The condition has held for at least the hold duration.
    Firing,
}

impl AlertState {
    /// Returns the state as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Firing => "firing",
        }
    }
}

impl std::fmt::Display for AlertState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Comparison operators for alert conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOperator {
    /// Greater than (>).
    #[serde(rename = ">")]
    GreaterThan,
    /// Greater than or equal (>=).
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
    /// Less than (<).
    #[serde(rename = "<")]
    LessThan,
    /// Less than or equal (<=).
    #[serde(rename = "<=")]
    LessThanOrEqual,
    /// Equal (==).
    #[serde(rename = "==")]
    Equal,
    /// Not equal (!=).
    #[serde(rename = "!=")]
    NotEqual,
}

impl ComparisonOperator {
    /// Evaluates the comparison between two values.
    ///
    /// Equality is exact.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn evaluate(&self, left: f64, right: f64) -> bool {
        match self {
            Self::GreaterThan => left > right,
            Self::GreaterThanOrEqual => left >= right,
            Self::LessThan => left < right,
            Self::LessThanOrEqual => left <= right,
            Self::Equal => left == right,
            Self::NotEqual => left != right,
        }
    }

    /// Returns the operator as a string symbol.
    #[must_use]
    pub const fn as_symbol(&self) -> &'static str {
        match self {
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
        }
    }
}

impl std::fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_symbol())
    }
}

/// Functions reducing the samples of a range selection to one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeFunction {
    /// Per-second counter increase.
    Rate,
    /// Mean of the samples.
    AvgOverTime,
    /// Smallest sample.
    MinOverTime,
    /// Largest sample.
    MaxOverTime,
    /// Sum of the samples.
    SumOverTime,
    /// Number of samples.
    CountOverTime,
    /// Most recent sample.
    LastOverTime,
}

impl RangeFunction {
    /// Applies the function to samples in timestamp order.
    ///
    /// Returns `None` when the function has no result for these samples.
    #[must_use]
    pub fn apply(&self, samples: &[Sample]) -> Option<f64> {
        let aggregation = match self {
            Self::Rate => return rate(samples),
            Self::AvgOverTime => Aggregation::Avg,
            Self::MinOverTime => Aggregation::Min,
            Self::MaxOverTime => Aggregation::Max,
            Self::SumOverTime => Aggregation::Sum,
            Self::CountOverTime => Aggregation::Count,
            Self::LastOverTime => Aggregation::Last,
        };
        let values: Vec<f64> = samples.iter().map(|s| s.value).collect();
        aggregation.apply(&values)
    }

    /// Returns the function name as written in rule files.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Rate => "rate",
            Self::AvgOverTime => "avg_over_time",
            Self::MinOverTime => "min_over_time",
            Self::MaxOverTime => "max_over_time",
            Self::SumOverTime => "sum_over_time",
            Self::CountOverTime => "count_over_time",
            Self::LastOverTime => "last_over_time",
        }
    }
}

impl std::fmt::Display for RangeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A range function applied over a trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSelector {
    /// The reducing function.
    pub function: RangeFunction,
    /// Window width, ending at the evaluation instant.
    pub range: Duration,
}

/// A condition over the series of one metric.
///
/// Evaluated at an instant, it behaves like an instant vector filtered by a
/// threshold: each matching series yields one value (its latest sample within
/// the lookback window, or the range function over the window), and the
/// series whose value satisfies the comparison are kept.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertCondition {
    /// The metric to select.
    pub metric_name: MetricName,
    /// Equality matchers the series labels must satisfy.
    pub label_filters: Labels,
    /// Optional range function; without one the latest sample is used.
    pub range: Option<RangeSelector>,
    /// The comparison operator.
    pub operator: ComparisonOperator,
    /// The threshold value to compare against.
    pub threshold: f64,
}

impl AlertCondition {
    /// Creates a new alert condition.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::MetricsError` if the metric name is invalid.
    pub fn new(
        metric_name: impl Into<String>,
        operator: ComparisonOperator,
        threshold: f64,
    ) -> Result<Self> {
        Ok(Self {
            metric_name: MetricName::new(metric_name)?,
            label_filters: Labels::new(),
            range: None,
            operator,
            threshold,
        })
    }

    /// Adds a label filter to this condition.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.label_filters.insert(key.into(), value.into());
        self
    }

    /// Applies `function` over a trailing window of `range`.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::InvalidRule` if `range` is zero.
    pub fn over(mut self, function: RangeFunction, range: Duration) -> Result<Self> {
        if range.is_zero() {
            return Err(AlertError::InvalidRule {
                reason: format!("{function} range must be positive"),
            });
        }
        self.range = Some(RangeSelector { function, range });
        Ok(self)
    }

    /// Evaluates the comparison against a value.
    #[must_use]
    pub fn evaluate(&self, value: f64) -> bool {
        self.operator.evaluate(value, self.threshold)
    }

    /// Returns the labels and value of every series satisfying the condition
    /// at `at_millis`.
    ///
    /// `lookback` bounds how old the latest sample of a plain selector may be.
    /// A missing `queryable` has no data and yields nothing.
    ///
    /// # Errors
    ///
    /// Propagates any error from the backend.
    pub fn matching_series(
        &self,
        queryable: Option<&dyn Queryable>,
        at_millis: i64,
        lookback: Duration,
    ) -> Result<Vec<(Labels, f64)>> {
        let Some(queryable) = queryable else {
            return Ok(Vec::new());
        };

        let width = self.range.map_or(lookback, |r| r.range);
        let window = TimeRange::ending_at(at_millis, duration_to_millis(width));
        let series = queryable.select(&self.metric_name, &self.label_filters, window)?;

        let matched: Vec<(Labels, f64)> = series
            .into_iter()
            .filter_map(|s| {
                let value = match self.range {
                    Some(selector) => selector.function.apply(&s.samples)?,
                    None => s.last()?.value,
                };
                self.evaluate(value).then_some((s.labels, value))
            })
            .collect();

        debug!(
            condition = %self,
            at = at_millis,
            matched = matched.len(),
            "evaluated condition"
        );

        Ok(matched)
    }
}

impl std::fmt::Display for AlertCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut selector = self.metric_name.to_string();
        if !self.label_filters.is_empty() {
            let matchers: Vec<String> = self
                .label_filters
                .iter()
                .map(|(k, v)| format!("{k}={v:?}"))
                .collect();
            selector = format!("{selector}{{{}}}", matchers.join(","));
        }
        match self.range {
            Some(r) => write!(
                f,
                "{}({selector}[{}]) {} {}",
                r.function,
                format_duration(r.range),
                self.operator,
                self.threshold
            ),
            None => write!(f, "{selector} {} {}", self.operator, self.threshold),
        }
    }
}

/// An alerting rule: a condition, how long it must hold, and extra labels.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertRule {
    /// The alert name, used as the `alertname` label.
    pub name: String,
    /// The condition that triggers this alert.
    pub condition: AlertCondition,
    /// How long the condition must hold before the alert fires.
    pub for_duration: Duration,
    /// Labels attached to every alert of this rule.
    pub labels: Labels,
}

impl AlertRule {
    /// Maximum allowed length for rule names.
    pub const MAX_NAME_LENGTH: usize = 256;

    /// Creates a new alert rule builder.
    pub fn builder(name: impl Into<String>, condition: AlertCondition) -> AlertRuleBuilder {
        AlertRuleBuilder::new(name, condition)
    }

    /// Builds the label set of the alert for one matching series, without
    /// `alertstate` and `__name__`.
    ///
    /// Series labels come first, rule labels override them, and `alertname`
    /// is always the rule name.
    #[must_use]
    pub fn alert_labels(&self, series_labels: &Labels) -> Labels {
        let mut labels: Labels = series_labels
            .iter()
            .filter(|(k, _)| k.as_str() != METRIC_NAME_LABEL)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        labels.extend(self.labels.iter().map(|(k, v)| (k.clone(), v.clone())));
        labels.insert(ALERT_NAME_LABEL.to_string(), self.name.clone());
        labels
    }

    /// Returns the alert label sets active at `at_millis` with their values.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::EvaluationError` if two series collapse onto the
    /// same alert label set, and propagates backend errors.
    pub fn active_at(
        &self,
        queryable: Option<&dyn Queryable>,
        at_millis: i64,
        lookback: Duration,
    ) -> Result<BTreeMap<Labels, f64>> {
        let mut active = BTreeMap::new();
        for (series_labels, value) in self.condition.matching_series(queryable, at_millis, lookback)? {
            let labels = self.alert_labels(&series_labels);
            if active.insert(labels, value).is_some() {
                return Err(AlertError::EvaluationError {
                    rule: self.name.clone(),
                    reason: "vector contains metrics with the same labelset after applying alert labels"
                        .to_string(),
                });
            }
        }
        Ok(active)
    }
}

/// Builder for creating [`AlertRule`] instances.
#[derive(Debug)]
pub struct AlertRuleBuilder {
    name: String,
    condition: AlertCondition,
    for_duration: Duration,
    labels: Labels,
}

impl AlertRuleBuilder {
    /// Creates a new builder with required fields.
    fn new(name: impl Into<String>, condition: AlertCondition) -> Self {
        Self {
            name: name.into(),
            condition,
            for_duration: Duration::ZERO,
            labels: Labels::new(),
        }
    }

    /// Sets the duration the condition must hold before firing.
    #[must_use]
    pub const fn for_duration(mut self, duration: Duration) -> Self {
        self.for_duration = duration;
        self
    }

    /// Adds a label to the rule.
    #[must_use]
    pub fn label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Adds multiple labels to the rule.
    #[must_use]
    pub fn labels(mut self, labels: Labels) -> Self {
        self.labels.extend(labels);
        self
    }

    /// Builds the [`AlertRule`].
    ///
    /// # Errors
    ///
    /// Returns `AlertError::InvalidRule` if:
    /// - The name is empty
    /// - The name exceeds the maximum length
    /// - A rule label name is invalid or reserved (`__name__`, `alertstate`)
    pub fn build(self) -> Result<AlertRule> {
        if self.name.is_empty() {
            return Err(AlertError::InvalidRule {
                reason: "rule name cannot be empty".to_string(),
            });
        }

        if self.name.len() > AlertRule::MAX_NAME_LENGTH {
            return Err(AlertError::InvalidRule {
                reason: format!(
                    "rule name exceeds maximum length of {} characters",
                    AlertRule::MAX_NAME_LENGTH
                ),
            });
        }

        for key in self.labels.keys() {
            if key == METRIC_NAME_LABEL || key == ALERT_STATE_LABEL {
                return Err(AlertError::InvalidRule {
                    reason: format!("rule '{}' cannot set reserved label '{key}'", self.name),
                });
            }
            claw_metrics::types::validate_label_name(key).map_err(|e| AlertError::InvalidRule {
                reason: format!("rule '{}': {e}", self.name),
            })?;
        }

        Ok(AlertRule {
            name: self.name,
            condition: self.condition,
            for_duration: self.for_duration,
            labels: self.labels,
        })
    }
}

/// One active alert as produced by a group evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertSeries {
    /// Full label set: `__name__="ALERTS"`, `alertname`, `alertstate`, and
    /// the series and rule labels.
    pub labels: Labels,
    /// Pending or firing.
    pub state: AlertState,
    /// The condition value at the evaluation instant.
    pub value: f64,
    /// First instant (Unix millis) of the unbroken run of evaluations the
    /// condition held for, as far back as the hold duration required.
    pub active_at: i64,
}

impl AlertSeries {
    /// Builds the alert series for an alert label set.
    #[must_use]
    pub fn new(mut labels: Labels, state: AlertState, value: f64, active_at: i64) -> Self {
        labels.insert(METRIC_NAME_LABEL.to_string(), ALERTS_METRIC.to_string());
        labels.insert(ALERT_STATE_LABEL.to_string(), state.as_str().to_string());
        Self {
            labels,
            state,
            value,
            active_at,
        }
    }

    /// Returns the alert name.
    #[must_use]
    pub fn alertname(&self) -> Option<&str> {
        self.labels.get(ALERT_NAME_LABEL).map(String::as_str)
    }
}
