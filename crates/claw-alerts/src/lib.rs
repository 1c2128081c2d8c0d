//! Alerting rule engine for Clawbernetes rule tests.
//!
//! `claw-alerts` evaluates groups of alerting rules at a single instant
//! against any [`claw_metrics::Queryable`] backend and reports the active
//! alerts as `ALERTS` series, the same shape Prometheus-style alerting uses.
//!
//! # Features
//!
//! - **Alert Rules**: Threshold conditions over a metric's series, optionally
//!   through a range function such as `rate` or `avg_over_time`
//! - **For Duration**: Alerts stay `pending` until the condition has held for
//!   the rule's hold duration, then turn `firing`
//! - **Stateless Evaluation**: Pending time is reconstructed from the group's
//!   interval grid, so evaluation never mutates anything
//! - **Rule Files**: JSON rule groups with Prometheus-style durations
//!
//! # Example
//!
//! ```rust
//! use claw_alerts::{AlertCondition, AlertRule, AlertState, ComparisonOperator, RuleGroup};
//! use claw_metrics::{Labels, MetricName, MetricStore, Sample};
//! use chrono::{TimeZone, Utc};
//! use std::time::Duration;
//!
//! let store = MetricStore::new();
//! let up = MetricName::new("up").unwrap();
//! store.push(&up, &Labels::new(), Sample::new(0, 0.0)).unwrap();
//!
//! let condition = AlertCondition::new("up", ComparisonOperator::Equal, 0.0).unwrap();
//! let rule = AlertRule::builder("InstanceDown", condition)
//!     .label("severity", "page")
//!     .build()
//!     .unwrap();
//!
//! let group = RuleGroup::new("availability", Duration::from_secs(60), Duration::from_secs(300))
//!     .unwrap()
//!     .rule(rule);
//!
//! let at = Utc.timestamp_millis_opt(0).unwrap();
//! let alerts = group.eval_at(Some(&store), at).unwrap();
//! assert_eq!(alerts.len(), 1);
//! assert_eq!(alerts[0].state, AlertState::Firing);
//! ```

#![forbid(unsafe_code)]
#![doc(html_root_url = "https://docs.rs/claw-alerts/0.1.0")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod group;
pub mod types;

// Re-export main types at crate root
pub use config::{AlertRuleConfig, ExprConfig, RuleGroupConfig, RuleGroupsConfig};
pub use error::{AlertError, Result};
pub use group::{EvaluationConfig, RuleGroup};
pub use types::{
    AlertCondition, AlertRule, AlertRuleBuilder, AlertSeries, AlertState, ComparisonOperator,
    RangeFunction, RangeSelector, ALERTS_METRIC, ALERT_NAME_LABEL, ALERT_STATE_LABEL,
};
