//! Matching actual alerts against expected alerts.
//!
//! Expected alerts are canonicalized with [`LabelSet::with_default_name`]
//! and then both sides are compared as multisets: same length, and equal
//! label sets at every position once both are sorted. Collection order never
//! matters.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::labels::LabelSet;
use crate::ordering::{compare_alerts, sort_alerts};

/// Details of a failed alert comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertMismatch {
    /// Canonicalized expected alerts, sorted.
    pub expected: Vec<LabelSet>,
    /// Actual alerts, sorted.
    pub actual: Vec<LabelSet>,
    /// Expected alerts that were not active.
    pub missing: Vec<LabelSet>,
    /// Active alerts that were not expected.
    pub unexpected: Vec<LabelSet>,
}

impl AlertMismatch {
    fn new(expected: Vec<LabelSet>, actual: Vec<LabelSet>) -> Self {
        let mut missing = Vec::new();
        let mut unexpected = Vec::new();

        // both sides sorted; walk them together to get multiset differences
        let (mut i, mut j) = (0, 0);
        while i < expected.len() && j < actual.len() {
            match compare_alerts(&expected[i], &actual[j]) {
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
                Ordering::Less => {
                    missing.push(expected[i].clone());
                    i += 1;
                }
                Ordering::Greater => {
                    unexpected.push(actual[j].clone());
                    j += 1;
                }
            }
        }
        missing.extend_from_slice(&expected[i..]);
        unexpected.extend_from_slice(&actual[j..]);

        Self {
            expected,
            actual,
            missing,
            unexpected,
        }
    }
}

impl fmt::Display for AlertMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "alerts mismatch: expected {}, got {}",
            self.expected.len(),
            self.actual.len()
        )?;
        write_section(f, "expected", &self.expected)?;
        write_section(f, "actual", &self.actual)?;
        write_section(f, "missing", &self.missing)?;
        write_section(f, "unexpected", &self.unexpected)
    }
}

fn write_section(f: &mut fmt::Formatter<'_>, title: &str, alerts: &[LabelSet]) -> fmt::Result {
    if alerts.is_empty() {
        return writeln!(f, "  {title}: none");
    }
    writeln!(f, "  {title}:")?;
    for alert in alerts {
        writeln!(f, "    {alert}")?;
    }
    Ok(())
}

impl std::error::Error for AlertMismatch {}

/// Checks that `actual` holds exactly the `expected` alerts.
///
/// Expected alerts without a `__name__` label get `__name__="ALERTS"`;
/// nothing else is filled in, so an expected alert must list every label
/// the actual alert carries.
///
/// # Errors
///
/// Returns an [`AlertMismatch`] describing the difference when the
/// collections are not equal as multisets.
pub fn assert_alerts_equal(
    expected: &[LabelSet],
    actual: &[LabelSet],
) -> Result<(), AlertMismatch> {
    let mut expected: Vec<LabelSet> = expected
        .iter()
        .cloned()
        .map(LabelSet::with_default_name)
        .collect();
    let mut actual = actual.to_vec();

    sort_alerts(&mut expected);
    sort_alerts(&mut actual);

    if expected.len() == actual.len() && expected == actual {
        return Ok(());
    }
    Err(AlertMismatch::new(expected, actual))
}

/// Returns true if `actual` holds exactly the `expected` alerts.
#[must_use]
pub fn alerts_equal(expected: &[LabelSet], actual: &[LabelSet]) -> bool {
    if expected.len() != actual.len() {
        return false;
    }
    assert_alerts_equal(expected, actual).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(pairs: &[(&str, &str)]) -> LabelSet {
        pairs.iter().copied().collect()
    }

    fn foo_pending(instance: &str) -> LabelSet {
        set(&[
            ("alertname", "FOO"),
            ("alertstate", "pending"),
            ("instance", instance),
        ])
    }

    fn alerts_series(instance: &str) -> LabelSet {
        foo_pending(instance).with_label("__name__", "ALERTS")
    }

    mod scenario_tests {
        use super::*;

        #[test]
        fn order_does_not_matter() {
            let expected = vec![foo_pending("0"), foo_pending("1")];
            let actual = vec![alerts_series("1"), alerts_series("0")];
            assert!(alerts_equal(&expected, &actual));
        }

        #[test]
        fn extra_actual_label_fails() {
            let expected = vec![set(&[("alertname", "FOO"), ("alertstate", "pending")])];
            let actual = vec![alerts_series("0")];
            assert!(!alerts_equal(&expected, &actual));
        }

        #[test]
        fn user_name_not_overwritten() {
            let expected = vec![set(&[("foo", "bar"), ("__name__", "superalert")])];
            let actual = vec![set(&[("foo", "bar"), ("__name__", "superalert")])];
            assert!(alerts_equal(&expected, &actual));

            let as_alerts = vec![set(&[("foo", "bar"), ("__name__", "ALERTS")])];
            assert!(!alerts_equal(&expected, &as_alerts));
        }

        #[test]
        fn both_empty_match() {
            assert!(alerts_equal(&[], &[]));
        }

        #[test]
        fn length_mismatch_fails() {
            assert!(!alerts_equal(&[], &[alerts_series("0")]));
            assert!(!alerts_equal(&[foo_pending("0")], &[]));
        }

        #[test]
        fn duplicates_count() {
            let expected = vec![foo_pending("0"), foo_pending("0")];
            let actual = vec![alerts_series("0"), alerts_series("1")];
            assert!(!alerts_equal(&expected, &actual));

            let actual = vec![alerts_series("0"), alerts_series("0")];
            assert!(alerts_equal(&expected, &actual));
        }

        #[test]
        fn empty_label_set_does_not_panic() {
            let expected = vec![LabelSet::new()];
            let actual = vec![alerts_series("0")];
            assert!(!alerts_equal(&expected, &actual));
        }
    }

    mod mismatch_tests {
        use super::*;

        #[test]
        fn reports_missing_and_unexpected() {
            let expected = vec![foo_pending("0"), foo_pending("2")];
            let actual = vec![alerts_series("1"), alerts_series("0")];

            let mismatch = assert_alerts_equal(&expected, &actual).unwrap_err();
            assert_eq!(mismatch.missing, vec![alerts_series("2")]);
            assert_eq!(mismatch.unexpected, vec![alerts_series("1")]);
            assert_eq!(mismatch.expected, vec![alerts_series("0"), alerts_series("2")]);
            assert_eq!(mismatch.actual, vec![alerts_series("0"), alerts_series("1")]);
        }

        #[test]
        fn reports_length_difference() {
            let mismatch = assert_alerts_equal(&[], &[alerts_series("0")]).unwrap_err();
            assert!(mismatch.missing.is_empty());
            assert_eq!(mismatch.unexpected.len(), 1);
        }

        #[test]
        fn delimiter_in_value_still_reported() {
            let expected = vec![set(&[("a", "x\0b\0y"), ("__name__", "ALERTS")])];
            let actual = vec![set(&[("a", "x"), ("b", "y"), ("__name__", "ALERTS")])];

            let mismatch = assert_alerts_equal(&expected, &actual).unwrap_err();
            assert_eq!(mismatch.missing, expected);
            assert_eq!(mismatch.unexpected, actual);
        }

        #[test]
        fn display_lists_sections() {
            let mismatch = assert_alerts_equal(&[foo_pending("0")], &[]).unwrap_err();
            let text = mismatch.to_string();
            assert!(text.starts_with("alerts mismatch: expected 1, got 0\n"));
            assert!(text.contains("  missing:\n    {__name__=\"ALERTS\", alertname=\"FOO\""));
            assert!(text.contains("  unexpected: none"));
            assert!(text.contains("  actual: none"));
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn alert() -> impl Strategy<Value = LabelSet> {
            proptest::collection::btree_map("[a-c]", "[0-1]", 0..3).prop_map(|labels| {
                LabelSet::from(labels).with_label("__name__", "ALERTS")
            })
        }

        proptest! {
            #[test]
            fn prop_permutation_matches(
                alerts in proptest::collection::vec(alert(), 0..6),
                seed in any::<u64>(),
            ) {
                let mut shuffled = alerts.clone();
                let len = shuffled.len();
                if len > 1 {
                    shuffled.rotate_left(usize::try_from(seed % len as u64).unwrap());
                }
                prop_assert!(alerts_equal(&alerts, &shuffled));
            }

            #[test]
            fn prop_equal_iff_same_multiset(
                a in proptest::collection::vec(alert(), 0..5),
                b in proptest::collection::vec(alert(), 0..5),
            ) {
                let mut sorted_a = a.clone();
                let mut sorted_b = b.clone();
                sort_alerts(&mut sorted_a);
                sort_alerts(&mut sorted_b);
                prop_assert_eq!(alerts_equal(&a, &b), sorted_a == sorted_b);
            }

            #[test]
            fn prop_mismatch_differences_balance(
                a in proptest::collection::vec(alert(), 0..5),
                b in proptest::collection::vec(alert(), 0..5),
            ) {
                if let Err(mismatch) = assert_alerts_equal(&a, &b) {
                    prop_assert!(!mismatch.missing.is_empty() || !mismatch.unexpected.is_empty());
                    prop_assert_eq!(
                        mismatch.expected.len() - mismatch.missing.len(),
                        mismatch.actual.len() - mismatch.unexpected.len()
                    );
                }
            }
        }
    }
}
