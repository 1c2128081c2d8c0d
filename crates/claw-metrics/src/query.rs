//! Read interface over stored series, plus range helpers.
//!
//! The rule engine only ever talks to storage through [`Queryable`]; the
//! helpers here turn the samples of one selected series into a single value.

use std::sync::Arc;

use crate::error::Result;
use crate::types::{Labels, MetricName, Sample, Series, TimeRange};

/// Read-only access to labelled time series.
///
/// Implementations must be side-effect free: the same call against the same
/// data returns the same series.
pub trait Queryable: Send + Sync {
    /// Selects every series of `name` whose labels contain all `matchers`
    /// pairs, with samples restricted to `range`.
    ///
    /// Series with no samples inside `range` are omitted.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot serve the read.
    fn select(&self, name: &MetricName, matchers: &Labels, range: TimeRange) -> Result<Vec<Series>>;
}

impl<Q: Queryable + ?Sized> Queryable for &Q {
    fn select(&self, name: &MetricName, matchers: &Labels, range: TimeRange) -> Result<Vec<Series>> {
        (**self).select(name, matchers, range)
    }
}

impl<Q: Queryable + ?Sized> Queryable for Arc<Q> {
    fn select(&self, name: &MetricName, matchers: &Labels, range: TimeRange) -> Result<Vec<Series>> {
        (**self).select(name, matchers, range)
    }
}

/// Per-second increase of a counter across `samples`.
///
/// A drop in value is treated as a counter reset: the value after the reset
/// counts as increase from zero. Returns `None` with fewer than two samples
/// or when the samples don't span any time.
#[must_use]
#[allow(clippy::cast_precision_loss)] // Timestamp diff precision loss acceptable for rate calculation
pub fn rate(samples: &[Sample]) -> Option<f64> {
    if samples.len() < 2 {
        return None;
    }

    let first = samples.first()?;
    let last = samples.last()?;

    let time_diff_seconds = (last.timestamp - first.timestamp) as f64 / 1000.0;
    if time_diff_seconds <= 0.0 {
        return None;
    }

    let increase: f64 = samples
        .windows(2)
        .map(|pair| {
            let (prev, next) = (pair[0].value, pair[1].value);
            if next < prev { next } else { next - prev }
        })
        .sum();

    Some(increase / time_diff_seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MetricStore;

    fn samples(points: &[(i64, f64)]) -> Vec<Sample> {
        points.iter().map(|&(t, v)| Sample::new(t, v)).collect()
    }

    #[test]
    fn rate_of_steady_counter() {
        let s = samples(&[(0, 0.0), (60_000, 60.0), (120_000, 120.0)]);
        let r = rate(&s).unwrap();
        assert!((r - 1.0).abs() < 1e-9);
    }

    #[test]
    fn rate_handles_counter_reset() {
        // 0 -> 30 (+30), reset to 10 (+10), 10 -> 20 (+10): 50 over 150s
        let s = samples(&[(0, 0.0), (50_000, 30.0), (100_000, 10.0), (150_000, 20.0)]);
        let r = rate(&s).unwrap();
        assert!((r - 50.0 / 150.0).abs() < 1e-9);
    }

    #[test]
    fn rate_needs_two_samples() {
        assert_eq!(rate(&[]), None);
        assert_eq!(rate(&samples(&[(0, 1.0)])), None);
    }

    #[test]
    fn rate_needs_time_span() {
        assert_eq!(rate(&samples(&[(10, 1.0), (10, 2.0)])), None);
    }

    #[test]
    fn queryable_through_shared_handles() {
        let store = Arc::new(MetricStore::new());
        let name = MetricName::new("up").unwrap();
        store.push(&name, &Labels::new(), Sample::new(0, 1.0)).unwrap();

        let range = TimeRange::new(0, 0).unwrap();
        let via_arc = store.select(&name, &Labels::new(), range).unwrap();
        let as_dyn: &dyn Queryable = &store;
        let via_dyn = as_dyn.select(&name, &Labels::new(), range).unwrap();

        assert_eq!(via_arc, via_dyn);
        assert_eq!(via_arc.len(), 1);
    }
}
