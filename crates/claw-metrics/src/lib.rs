//! In-memory labelled time-series store for rule evaluation.
//!
//! `claw-metrics` holds the sample data that alerting rules are evaluated
//! against. Rule tests materialize their fixtures into a [`MetricStore`] and
//! the rule engine reads it back through the [`Queryable`] trait, so any
//! other backend can be dropped in without touching the engine.
//!
//! # Features
//!
//! - **Labelled series**: every series is identified by a metric name plus an
//!   ordered label map
//! - **Range selection**: select all series of a metric whose labels match a
//!   set of equality matchers, restricted to a time range
//! - **Durations**: Prometheus-style duration text (`5m`, `1h30m`)
//!
//! # Example
//!
//! ```rust
//! use claw_metrics::{Labels, MetricName, MetricStore, Queryable, Sample, TimeRange};
//!
//! let store = MetricStore::new();
//! let name = MetricName::new("http_requests_total").unwrap();
//!
//! let mut labels = Labels::new();
//! labels.insert("job".to_string(), "api".to_string());
//!
//! store.push(&name, &labels, Sample::new(0, 1.0)).unwrap();
//! store.push(&name, &labels, Sample::new(60_000, 7.0)).unwrap();
//!
//! let range = TimeRange::new(0, 60_000).unwrap();
//! let series = store.select(&name, &Labels::new(), range).unwrap();
//! assert_eq!(series.len(), 1);
//! assert_eq!(series[0].samples.len(), 2);
//! ```

#![forbid(unsafe_code)]
#![doc(html_root_url = "https://docs.rs/claw-metrics/0.1.0")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod duration;
pub mod error;
pub mod query;
pub mod storage;
pub mod types;

// Re-export main types at crate root
pub use duration::{format_duration, parse_duration};
pub use error::{MetricsError, Result};
pub use query::{rate, Queryable};
pub use storage::MetricStore;
pub use types::{Aggregation, Labels, MetricName, Sample, Series, TimeRange, METRIC_NAME_LABEL};
