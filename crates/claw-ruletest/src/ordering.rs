//! Deterministic ordering of alert label sets.
//!
//! Two alerts are ordered by a pair of composite keys built over the sorted
//! union of their label names: for each name, the label's value (empty when
//! the alert lacks it) followed by [`SORT_KEY_DELIMITER`]. The keys compare
//! lexicographically. The delimiter sorts below every other character and
//! must not occur in label values.
//!
//! The composite keys can't tell an absent label from one with an empty
//! value. When they are equal, the first label name present on only one side
//! decides, and the side without it sorts first. Equal ordering therefore
//! means identical label sets.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::labels::LabelSet;

/// Separator after each label value in a [`SortKey`].
pub const SORT_KEY_DELIMITER: char = '\0';

/// Composite sort key of one alert relative to another.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SortKey(String);

impl SortKey {
    /// Builds the keys of `a` and `b` over the union of their label names.
    #[must_use]
    pub fn pair(a: &LabelSet, b: &LabelSet) -> (Self, Self) {
        let names: BTreeSet<&str> = a.iter().chain(b.iter()).map(|(name, _)| name).collect();
        let key = |set: &LabelSet| {
            let mut key = String::new();
            for name in &names {
                key.push_str(set.get(name).unwrap_or_default());
                key.push(SORT_KEY_DELIMITER);
            }
            Self(key)
        };
        (key(a), key(b))
    }

    /// Returns the raw key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Compares two label sets.
///
/// Walks both sets in name order and stops at the first name whose values
/// differ, so no key is allocated. Agrees with [`SortKey::pair`] whenever the
/// keys differ.
#[must_use]
pub fn compare_alerts(a: &LabelSet, b: &LabelSet) -> Ordering {
    let mut left = a.iter().peekable();
    let mut right = b.iter().peekable();
    let mut presence = Ordering::Equal;

    loop {
        let (lv, rv, present) = match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return presence,
            (Some((_, lv)), None) => {
                left.next();
                (lv, "", Ordering::Greater)
            }
            (None, Some((_, rv))) => {
                right.next();
                ("", rv, Ordering::Less)
            }
            (Some((ln, lv)), Some((rn, rv))) => match ln.cmp(rn) {
                Ordering::Less => {
                    left.next();
                    (lv, "", Ordering::Greater)
                }
                Ordering::Greater => {
                    right.next();
                    ("", rv, Ordering::Less)
                }
                Ordering::Equal => {
                    left.next();
                    right.next();
                    (lv, rv, Ordering::Equal)
                }
            },
        };

        match lv.cmp(rv) {
            Ordering::Equal => presence = presence.then(present),
            unequal => return unequal,
        }
    }
}

/// Returns true if `a` sorts strictly before `b`.
#[must_use]
pub fn alert_less_than(a: &LabelSet, b: &LabelSet) -> bool {
    compare_alerts(a, b) == Ordering::Less
}

/// Sorts alerts in place.
pub fn sort_alerts(alerts: &mut [LabelSet]) {
    alerts.sort_by(compare_alerts);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(pairs: &[(&str, &str)]) -> LabelSet {
        pairs.iter().copied().collect()
    }

    mod key_tests {
        use super::*;

        #[test]
        fn key_layout_uses_name_union() {
            let a = set(&[("b", "2"), ("a", "1")]);
            let b = set(&[("a", "1"), ("c", "3")]);
            let (ka, kb) = SortKey::pair(&a, &b);
            assert_eq!(ka.as_str(), "1\u{0}2\u{0}\u{0}");
            assert_eq!(kb.as_str(), "1\u{0}\u{0}3\u{0}");
        }

        #[test]
        fn empty_sets_have_empty_keys() {
            let (ka, kb) = SortKey::pair(&LabelSet::new(), &LabelSet::new());
            assert_eq!(ka.as_str(), "");
            assert_eq!(kb.as_str(), "");
        }

        #[test]
        fn identical_sets_have_equal_keys() {
            let a = set(&[("alertname", "FOO"), ("instance", "0")]);
            let b = set(&[("instance", "0"), ("alertname", "FOO")]);
            let (ka, kb) = SortKey::pair(&a, &b);
            assert_eq!(ka, kb);
            assert!(!alert_less_than(&a, &b));
            assert!(!alert_less_than(&b, &a));
        }
    }

    mod order_tests {
        use super::*;

        #[test]
        fn differing_value_decides() {
            let a = set(&[("alertname", "FOO"), ("instance", "0")]);
            let b = set(&[("alertname", "FOO"), ("instance", "1")]);
            assert!(alert_less_than(&a, &b));
            assert!(!alert_less_than(&b, &a));
        }

        #[test]
        fn subset_sorts_first() {
            let a = set(&[("alertname", "FOO")]);
            let b = set(&[("alertname", "FOO"), ("instance", "0")]);
            assert!(alert_less_than(&a, &b));
        }

        #[test]
        fn missing_label_counts_as_empty() {
            let a = set(&[("alertname", "FOO"), ("zone", "a")]);
            let b = set(&[("alertname", "FOO"), ("instance", "0")]);
            // a has no "instance", which sorts below "0"
            assert!(alert_less_than(&a, &b));
            assert_eq!(compare_alerts(&b, &a), Ordering::Greater);
        }

        #[test]
        fn first_differing_name_decides() {
            let a = set(&[("job", "x")]);
            let b = set(&[("jobs", "x")]);
            // at "job", b has nothing
            assert!(alert_less_than(&b, &a));
        }

        #[test]
        fn absent_sorts_before_empty_value() {
            let a = set(&[("alertname", "FOO")]);
            let b = set(&[("alertname", "FOO"), ("instance", "")]);
            assert_eq!(SortKey::pair(&a, &b).0, SortKey::pair(&a, &b).1);
            assert!(alert_less_than(&a, &b));
            assert!(!alert_less_than(&b, &a));
        }

        #[test]
        fn sort_is_independent_of_input_order() {
            let x = set(&[("alertname", "A"), ("instance", "1")]);
            let y = set(&[("alertname", "A"), ("instance", "0")]);
            let z = set(&[("alertname", "B")]);

            let mut first = vec![x.clone(), y.clone(), z.clone()];
            let mut second = vec![z, x, y];
            sort_alerts(&mut first);
            sort_alerts(&mut second);
            assert_eq!(first, second);
            assert_eq!(first[0].get("instance"), Some("0"));
            assert_eq!(first[2].get("alertname"), Some("B"));
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn label_set() -> impl Strategy<Value = LabelSet> {
            proptest::collection::btree_map("[a-c]{1,2}", "[0-2]{0,2}", 0..4)
                .prop_map(LabelSet::from)
        }

        proptest! {
            #[test]
            fn prop_trichotomy(a in label_set(), b in label_set()) {
                let lt = alert_less_than(&a, &b);
                let gt = alert_less_than(&b, &a);
                let eq = a == b;
                prop_assert_eq!(u8::from(lt) + u8::from(gt) + u8::from(eq), 1);
            }

            #[test]
            fn prop_transitive(a in label_set(), b in label_set(), c in label_set()) {
                if alert_less_than(&a, &b) && alert_less_than(&b, &c) {
                    prop_assert!(alert_less_than(&a, &c));
                }
            }

            #[test]
            fn prop_agrees_with_composite_keys(a in label_set(), b in label_set()) {
                let (ka, kb) = SortKey::pair(&a, &b);
                if ka != kb {
                    prop_assert_eq!(compare_alerts(&a, &b), ka.cmp(&kb));
                }
            }

            #[test]
            fn prop_sorted_output_is_ordered(mut alerts in proptest::collection::vec(label_set(), 0..8)) {
                sort_alerts(&mut alerts);
                for pair in alerts.windows(2) {
                    prop_assert!(!alert_less_than(&pair[1], &pair[0]));
                }
            }
        }
    }
}
