//! Prometheus-style duration text.
//!
//! Durations are written as integer components in descending unit order,
//! e.g. `5m`, `1h30m`, `1d12h`, `250ms`. A bare `0` is also accepted.

use std::time::Duration;

use crate::error::{MetricsError, Result};

const MILLIS_PER_SECOND: u64 = 1_000;
const MILLIS_PER_MINUTE: u64 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: u64 = 60 * MILLIS_PER_MINUTE;
const MILLIS_PER_DAY: u64 = 24 * MILLIS_PER_HOUR;
const MILLIS_PER_WEEK: u64 = 7 * MILLIS_PER_DAY;
const MILLIS_PER_YEAR: u64 = 365 * MILLIS_PER_DAY;

/// Units from largest to smallest. The index is the unit's rank.
const UNITS: [(&str, u64); 7] = [
    ("y", MILLIS_PER_YEAR),
    ("w", MILLIS_PER_WEEK),
    ("d", MILLIS_PER_DAY),
    ("h", MILLIS_PER_HOUR),
    ("m", MILLIS_PER_MINUTE),
    ("s", MILLIS_PER_SECOND),
    ("ms", 1),
];

fn invalid(input: &str, reason: impl Into<String>) -> MetricsError {
    MetricsError::InvalidDuration {
        input: input.to_string(),
        reason: reason.into(),
    }
}

/// Parses a Prometheus-style duration.
///
/// # Errors
///
/// Returns `MetricsError::InvalidDuration` if the text is empty, a component
/// lacks a number or unit, a unit is unknown, units repeat or appear out of
/// order, or the total overflows.
pub fn parse_duration(input: &str) -> Result<Duration> {
    if input.is_empty() {
        return Err(invalid(input, "empty duration"));
    }
    if input == "0" {
        return Ok(Duration::ZERO);
    }

    let bytes = input.as_bytes();
    let mut pos = 0;
    let mut total: u64 = 0;
    let mut last_rank: Option<usize> = None;

    while pos < bytes.len() {
        let digits_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        if digits_start == pos {
            return Err(invalid(input, format!("expected a number at offset {pos}")));
        }
        let amount: u64 = input[digits_start..pos]
            .parse()
            .map_err(|_| invalid(input, "number out of range"))?;

        let unit_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
            pos += 1;
        }
        let unit = &input[unit_start..pos];
        if unit.is_empty() {
            return Err(invalid(input, "missing unit"));
        }

        let (rank, millis) = UNITS
            .iter()
            .enumerate()
            .find(|(_, (name, _))| *name == unit)
            .map(|(rank, (_, millis))| (rank, *millis))
            .ok_or_else(|| invalid(input, format!("unknown unit '{unit}'")))?;

        if last_rank.is_some_and(|last| rank <= last) {
            return Err(invalid(input, format!("unit '{unit}' out of order")));
        }
        last_rank = Some(rank);

        total = amount
            .checked_mul(millis)
            .and_then(|ms| total.checked_add(ms))
            .ok_or_else(|| invalid(input, "duration overflows"))?;
    }

    Ok(Duration::from_millis(total))
}

/// Renders a duration in the same notation [`parse_duration`] accepts.
///
/// Sub-millisecond precision is dropped. Zero renders as `0s`.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Durations beyond u64 millis are not representable in rule files
pub fn format_duration(duration: Duration) -> String {
    let mut remaining = duration.as_millis() as u64;
    if remaining == 0 {
        return "0s".to_string();
    }

    let mut out = String::new();
    for (name, millis) in UNITS {
        let amount = remaining / millis;
        if amount > 0 {
            out.push_str(&amount.to_string());
            out.push_str(name);
            remaining -= amount * millis;
        }
    }
    out
}
