//! Canonical alert label sets.
//!
//! Expected alerts written by a test author and actual alerts produced by the
//! rule engine are both reduced to a [`LabelSet`] before they are compared.

use std::fmt;

use claw_alerts::{AlertSeries, ALERTS_METRIC};
use claw_metrics::{Labels, METRIC_NAME_LABEL};
use serde::{Deserialize, Serialize};

/// An immutable mapping from label name to label value identifying one alert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSet(Labels);

impl LabelSet {
    /// Creates an empty label set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with `name` set to `value`.
    #[must_use]
    pub fn with_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Fills in `__name__="ALERTS"` unless the set already names itself.
    ///
    /// Expected alerts may leave `__name__` out since every alert series
    /// carries it; an explicit value is kept as written.
    #[must_use]
    pub fn with_default_name(mut self) -> Self {
        self.0
            .entry(METRIC_NAME_LABEL.to_string())
            .or_insert_with(|| ALERTS_METRIC.to_string());
        self
    }

    /// Returns the value of a label.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Returns true if the label is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no labels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(name, value)` pairs in ascending name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl From<Labels> for LabelSet {
    fn from(labels: Labels) -> Self {
        Self(labels)
    }
}

impl From<AlertSeries> for LabelSet {
    fn from(series: AlertSeries) -> Self {
        Self(series.labels)
    }
}

impl<K, V> FromIterator<(K, V)> for LabelSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value:?}")?;
        }
        write!(f, "}}")
    }
}
