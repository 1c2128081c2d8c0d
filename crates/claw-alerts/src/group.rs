//! Rule groups and instant evaluation.
//!
//! A [`RuleGroup`] is evaluated at one instant at a time. Nothing is carried
//! between evaluations: how long an alert has been active is reconstructed by
//! re-evaluating the rule on the group's interval grid behind the instant,
//! so the same instant against the same data always gives the same alerts.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use claw_metrics::{format_duration, Labels, Queryable};
use tracing::{debug, warn};

use crate::error::{AlertError, Result};
use crate::types::{duration_to_millis, AlertRule, AlertSeries, AlertState};

/// Evaluation settings shared by rule groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationConfig {
    /// Interval for groups that don't set their own.
    pub default_interval: Duration,
    /// How far back a plain selector looks for the latest sample.
    pub lookback: Duration,
}

impl EvaluationConfig {
    /// Default group evaluation interval.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);
    /// Default lookback delta.
    pub const DEFAULT_LOOKBACK: Duration = Duration::from_secs(5 * 60);
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            default_interval: Self::DEFAULT_INTERVAL,
            lookback: Self::DEFAULT_LOOKBACK,
        }
    }
}

/// A named set of alerting rules evaluated together.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleGroup {
    name: String,
    interval: Duration,
    lookback: Duration,
    rules: Vec<AlertRule>,
}

impl RuleGroup {
    /// Creates an empty group with the given settings.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::InvalidGroup` if the name is empty or the
    /// interval is zero.
    pub fn new(name: impl Into<String>, interval: Duration, lookback: Duration) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(AlertError::InvalidGroup {
                group: name,
                reason: "group name cannot be empty".to_string(),
            });
        }
        if interval.is_zero() {
            return Err(AlertError::InvalidGroup {
                group: name,
                reason: "interval must be positive".to_string(),
            });
        }

        Ok(Self {
            name,
            interval,
            lookback,
            rules: Vec::new(),
        })
    }

    /// Creates an empty group using `config`'s default interval and lookback.
    ///
    /// # Errors
    ///
    /// Same as [`RuleGroup::new`].
    pub fn with_config(name: impl Into<String>, config: &EvaluationConfig) -> Result<Self> {
        Self::new(name, config.default_interval, config.lookback)
    }

    /// Appends a rule to the group.
    #[must_use]
    pub fn rule(mut self, rule: AlertRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Returns the group name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the evaluation interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the lookback delta.
    #[must_use]
    pub const fn lookback(&self) -> Duration {
        self.lookback
    }

    /// Returns the rules in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[AlertRule] {
        &self.rules
    }

    /// Evaluates every rule at `at` and returns all active alerts, pending
    /// and firing, in rule order.
    ///
    /// A missing `queryable` is treated as an empty backend.
    ///
    /// # Errors
    ///
    /// Returns the first rule evaluation error.
    pub fn eval_at(
        &self,
        queryable: Option<&dyn Queryable>,
        at: DateTime<Utc>,
    ) -> Result<Vec<AlertSeries>> {
        let at_millis = at.timestamp_millis();
        let mut alerts = Vec::new();

        for rule in &self.rules {
            match self.eval_rule(rule, queryable, at_millis) {
                Ok(rule_alerts) => alerts.extend(rule_alerts),
                Err(e) => {
                    warn!(
                        group = %self.name,
                        rule = %rule.name,
                        error = %e,
                        "rule evaluation failed"
                    );
                    return Err(e);
                }
            }
        }

        debug!(
            group = %self.name,
            at = %at,
            interval = %format_duration(self.interval),
            alerts = alerts.len(),
            "evaluated rule group"
        );

        Ok(alerts)
    }

    /// Evaluates one rule, deciding pending vs firing per alert.
    #[allow(clippy::cast_possible_wrap)]
    fn eval_rule(
        &self,
        rule: &AlertRule,
        queryable: Option<&dyn Queryable>,
        at_millis: i64,
    ) -> Result<Vec<AlertSeries>> {
        let current = rule.active_at(queryable, at_millis, self.lookback)?;
        if current.is_empty() {
            return Ok(Vec::new());
        }

        let hold = duration_to_millis(rule.for_duration);
        let step = duration_to_millis(self.interval);

        // history[k - 1] holds the alerts active k steps before `at_millis`
        let mut history: Vec<BTreeMap<Labels, f64>> = Vec::new();
        let mut alerts = Vec::with_capacity(current.len());

        for (labels, value) in current {
            let mut active_at = at_millis;
            let mut steps = 0usize;

            while at_millis - active_at < hold {
                steps += 1;
                let earlier = at_millis - steps as i64 * step;
                if history.len() < steps {
                    history.push(rule.active_at(queryable, earlier, self.lookback)?);
                }
                if !history[steps - 1].contains_key(&labels) {
                    break;
                }
                active_at = earlier;
            }

            let state = if at_millis - active_at >= hold {
                AlertState::Firing
            } else {
                AlertState::Pending
            };
            alerts.push(AlertSeries::new(labels, state, value, active_at));
        }

        Ok(alerts)
    }
}
