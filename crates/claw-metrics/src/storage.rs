//! In-memory labelled series storage.
//!
//! This module provides the [`MetricStore`] which keeps every series of every
//! metric in memory, samples sorted by timestamp. Rule-test fixtures are
//! historical data, so the store never expires anything on its own.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::Result;
use crate::query::Queryable;
use crate::types::{validate_label_name, Labels, MetricName, Sample, Series, TimeRange, METRIC_NAME_LABEL};

type SeriesMap = BTreeMap<Labels, Vec<Sample>>;

/// Thread-safe in-memory storage for labelled series.
///
/// Clones share the same underlying data, so a store can be filled on one
/// handle and read through another from several threads.
#[derive(Debug, Default)]
pub struct MetricStore {
    /// Series keyed by metric name, then by identifying labels.
    data: Arc<RwLock<HashMap<MetricName, SeriesMap>>>,
}

/// Inserts keeping timestamp order; a sample at an existing timestamp replaces it.
fn insert_sample(samples: &mut Vec<Sample>, sample: Sample) {
    match samples.binary_search_by_key(&sample.timestamp, |s| s.timestamp) {
        Ok(pos) => samples[pos] = sample,
        Err(pos) => samples.insert(pos, sample),
    }
}

/// Validates label names and drops a stray `__name__`; the name lives in the key.
fn identity_labels(labels: &Labels) -> Result<Labels> {
    let mut identity = Labels::new();
    for (name, value) in labels {
        if name == METRIC_NAME_LABEL {
            continue;
        }
        validate_label_name(name)?;
        identity.insert(name.clone(), value.clone());
    }
    Ok(identity)
}

impl MetricStore {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a sample onto the series identified by `name` and `labels`.
    ///
    /// # Errors
    ///
    /// Returns `MetricsError::InvalidLabelName` if any label name is invalid.
    pub fn push(&self, name: &MetricName, labels: &Labels, sample: Sample) -> Result<()> {
        let identity = identity_labels(labels)?;

        let mut data = self.data.write();
        let samples = data
            .entry(name.clone())
            .or_default()
            .entry(identity)
            .or_default();
        insert_sample(samples, sample);

        debug!(
            metric = %name,
            samples = samples.len(),
            "pushed sample"
        );

        Ok(())
    }

    /// Pushes many samples of one series under a single lock.
    ///
    /// # Errors
    ///
    /// Returns `MetricsError::InvalidLabelName` if any label name is invalid.
    /// Nothing is written in that case.
    #[allow(clippy::significant_drop_tightening)] // Lock needed for batch atomic operation
    pub fn push_batch(
        &self,
        name: &MetricName,
        labels: &Labels,
        samples: impl IntoIterator<Item = Sample>,
    ) -> Result<()> {
        let identity = identity_labels(labels)?;

        let mut data = self.data.write();
        let stored = data
            .entry(name.clone())
            .or_default()
            .entry(identity)
            .or_default();
        for sample in samples {
            insert_sample(stored, sample);
        }

        Ok(())
    }

    /// Returns all metric names in the store, sorted.
    #[must_use]
    pub fn metric_names(&self) -> Vec<MetricName> {
        let data = self.data.read();
        let mut names: Vec<MetricName> = data.keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the number of series across all metrics.
    #[must_use]
    pub fn series_count(&self) -> usize {
        let data = self.data.read();
        data.values().map(BTreeMap::len).sum()
    }

    /// Returns the number of samples stored for a metric.
    ///
    /// Returns 0 if the metric doesn't exist.
    #[must_use]
    pub fn sample_count(&self, name: &MetricName) -> usize {
        let data = self.data.read();
        data.get(name)
            .map_or(0, |series| series.values().map(Vec::len).sum())
    }

    /// Clears all series from the store.
    pub fn clear(&self) {
        let mut data = self.data.write();
        data.clear();
    }
}

impl Queryable for MetricStore {
    #[allow(clippy::significant_drop_tightening)] // Lock scope is intentional for consistency
    fn select(&self, name: &MetricName, matchers: &Labels, range: TimeRange) -> Result<Vec<Series>> {
        let data = self.data.read();

        let Some(series_map) = data.get(name) else {
            return Ok(Vec::new());
        };

        let selected = series_map
            .iter()
            .filter(|(labels, _)| {
                matchers
                    .iter()
                    .all(|(k, v)| labels.get(k).is_some_and(|actual| actual == v))
            })
            .filter_map(|(labels, samples)| {
                let in_range: Vec<Sample> = samples
                    .iter()
                    .filter(|s| range.contains(s.timestamp))
                    .copied()
                    .collect();
                (!in_range.is_empty()).then(|| Series {
                    name: name.clone(),
                    labels: labels.clone(),
                    samples: in_range,
                })
            })
            .collect();

        Ok(selected)
    }
}

impl Clone for MetricStore {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}
