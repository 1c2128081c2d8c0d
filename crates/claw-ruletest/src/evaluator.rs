//! Evaluating rule groups at a single instant.

use chrono::{DateTime, Utc};
use claw_alerts::{AlertError, AlertSeries, RuleGroup};
use claw_metrics::Queryable;
use tracing::{debug, warn};

use crate::error::{Result, RuleTestError};
use crate::labels::LabelSet;

/// A group of rules that can be evaluated at an instant.
///
/// The harness only needs each group's alert series at one instant, so any
/// rule engine can be plugged in by implementing this trait.
pub trait EvaluableGroup {
    /// The alert series the engine produces.
    type Series: Into<LabelSet>;
    /// The engine's evaluation error.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the group name, used in diagnostics.
    fn name(&self) -> &str;

    /// Evaluates every rule in the group at `at`.
    ///
    /// # Errors
    ///
    /// Returns the engine's error if any rule fails to evaluate.
    fn eval_at(
        &self,
        queryable: Option<&dyn Queryable>,
        at: DateTime<Utc>,
    ) -> std::result::Result<Vec<Self::Series>, Self::Error>;
}

impl EvaluableGroup for RuleGroup {
    type Series = AlertSeries;
    type Error = AlertError;

    fn name(&self) -> &str {
        Self::name(self)
    }

    fn eval_at(
        &self,
        queryable: Option<&dyn Queryable>,
        at: DateTime<Utc>,
    ) -> std::result::Result<Vec<AlertSeries>, AlertError> {
        Self::eval_at(self, queryable, at)
    }
}

/// Evaluates `groups` at `at` and returns every active alert, pending and
/// firing, as label sets.
///
/// A `None` queryable means there is no data; rules see no samples. The
/// result is empty when there are no groups or nothing is active.
///
/// # Errors
///
/// Returns `RuleTestError::Evaluation` with the engine's error for the first
/// group that fails. Later groups are not evaluated.
pub fn evaluate_at_instant<G: EvaluableGroup>(
    queryable: Option<&dyn Queryable>,
    groups: &[G],
    at: DateTime<Utc>,
) -> Result<Vec<LabelSet>> {
    let mut alerts = Vec::new();

    for group in groups {
        let series = group.eval_at(queryable, at).map_err(|e| {
            warn!(group = %group.name(), at = %at, error = %e, "rule group evaluation failed");
            RuleTestError::Evaluation {
                group: group.name().to_string(),
                source: Box::new(e),
            }
        })?;

        debug!(group = %group.name(), at = %at, alerts = series.len(), "evaluated group");
        alerts.extend(series.into_iter().map(Into::into));
    }

    Ok(alerts)
}
