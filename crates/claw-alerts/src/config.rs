//! Rule file format.
//!
//! Rule files are JSON documents holding a list of groups:
//!
//! ```json
//! {
//!   "groups": [
//!     {
//!       "name": "api",
//!       "interval": "1m",
//!       "rules": [
//!         {
//!           "alert": "HttpRequestsTooLow",
//!           "expr": {
//!             "metric": "http_requests_total",
//!             "matchers": { "job": "api" },
//!             "function": "rate",
//!             "range": "5m",
//!             "op": "<",
//!             "threshold": 0.5
//!           },
//!           "for": "5m",
//!           "labels": { "severity": "page" }
//!         }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use claw_metrics::{parse_duration, Labels};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AlertError, Result};
use crate::group::{EvaluationConfig, RuleGroup};
use crate::types::{AlertCondition, AlertRule, ComparisonOperator, RangeFunction};

/// Top level of a rule file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleGroupsConfig {
    /// The groups, in evaluation order.
    pub groups: Vec<RuleGroupConfig>,
}

/// One group as written in a rule file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleGroupConfig {
    /// Group name, unique within the file.
    pub name: String,
    /// Evaluation interval; the evaluation default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    /// The group's alerting rules.
    #[serde(default)]
    pub rules: Vec<AlertRuleConfig>,
}

/// One alerting rule as written in a rule file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlertRuleConfig {
    /// Alert name.
    pub alert: String,
    /// The condition.
    pub expr: ExprConfig,
    /// Hold duration.
    #[serde(rename = "for", default, skip_serializing_if = "Option::is_none")]
    pub for_duration: Option<String>,
    /// Extra alert labels.
    #[serde(default, skip_serializing_if = "Labels::is_empty")]
    pub labels: Labels,
}

/// A condition as written in a rule file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExprConfig {
    /// Metric to select.
    pub metric: String,
    /// Equality label matchers.
    #[serde(default, skip_serializing_if = "Labels::is_empty")]
    pub matchers: Labels,
    /// Range function; requires `range`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<RangeFunction>,
    /// Range window; requires `function`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    /// Comparison operator.
    pub op: ComparisonOperator,
    /// Threshold compared against.
    pub threshold: f64,
}

impl RuleGroupsConfig {
    /// Parses a rule file's contents.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::SerializationError` on malformed JSON.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads and parses a rule file.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::Io` if the file can't be read and
    /// `AlertError::SerializationError` on malformed JSON.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| AlertError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text)?;
        info!(path = %path.display(), groups = config.groups.len(), "loaded rule file");
        Ok(config)
    }

    /// Validates the configuration and builds the groups.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::InvalidGroup` for duplicate group names or bad
    /// intervals, `AlertError::InvalidRule` for bad rules, and
    /// `AlertError::MetricsError` for invalid durations or metric names.
    pub fn build(&self, config: &EvaluationConfig) -> Result<Vec<RuleGroup>> {
        let mut seen = HashSet::new();
        let mut groups = Vec::with_capacity(self.groups.len());

        for group in &self.groups {
            if !seen.insert(group.name.as_str()) {
                return Err(AlertError::InvalidGroup {
                    group: group.name.clone(),
                    reason: "duplicate group name".to_string(),
                });
            }
            groups.push(group.build(config)?);
        }

        Ok(groups)
    }
}

impl RuleGroupConfig {
    /// Builds one group.
    ///
    /// # Errors
    ///
    /// See [`RuleGroupsConfig::build`].
    pub fn build(&self, config: &EvaluationConfig) -> Result<RuleGroup> {
        let interval = match &self.interval {
            Some(text) => parse_duration(text)?,
            None => config.default_interval,
        };

        let mut group = RuleGroup::new(&self.name, interval, config.lookback)?;
        for rule in &self.rules {
            group = group.rule(rule.build()?);
        }
        Ok(group)
    }
}

impl AlertRuleConfig {
    /// Builds one rule.
    ///
    /// # Errors
    ///
    /// See [`RuleGroupsConfig::build`].
    pub fn build(&self) -> Result<AlertRule> {
        let condition = self.expr.build().map_err(|e| match e {
            AlertError::InvalidRule { reason } => AlertError::InvalidRule {
                reason: format!("rule '{}': {reason}", self.alert),
            },
            other => other,
        })?;

        let mut builder = AlertRule::builder(&self.alert, condition).labels(self.labels.clone());
        if let Some(text) = &self.for_duration {
            builder = builder.for_duration(parse_duration(text)?);
        }
        builder.build()
    }
}

impl ExprConfig {
    /// Builds the condition.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::InvalidRule` when only one of `function` and
    /// `range` is set, or the range is zero.
    pub fn build(&self) -> Result<AlertCondition> {
        let mut condition = AlertCondition::new(&self.metric, self.op, self.threshold)?;
        for (key, value) in &self.matchers {
            condition = condition.with_label(key, value);
        }

        match (&self.function, &self.range) {
            (Some(function), Some(range)) => condition.over(*function, parse_duration(range)?),
            (None, None) => Ok(condition),
            (Some(function), None) => Err(AlertError::InvalidRule {
                reason: format!("{function} requires a range"),
            }),
            (None, Some(_)) => Err(AlertError::InvalidRule {
                reason: "range requires a function".to_string(),
            }),
        }
    }
}
