//! Group-by helpers over any row type.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use hotel_core::stats::round_to;
use serde::Serialize;

// ── GroupStat ─────────────────────────────────────────────────────────────────

/// One group of a group-by result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStat {
    pub key: String,
    pub value: f64,
    /// Rows that contributed to `value`.
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    sum: f64,
    count: usize,
}

impl Accumulator {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }
}

// ── Aggregations ──────────────────────────────────────────────────────────────

/// Per-key mean of `value`, rounded to two decimals. Sorted by key.
pub fn mean_by<T>(
    rows: &[T],
    key: impl Fn(&T) -> String,
    value: impl Fn(&T) -> f64,
) -> Vec<GroupStat> {
    mean_by_optional(rows, key, |r| Some(value(r)))
}

/// Per-key mean over the `Some` values only.
///
/// Keys whose rows are all `None` do not appear in the result.
pub fn mean_by_optional<T>(
    rows: &[T],
    key: impl Fn(&T) -> String,
    value: impl Fn(&T) -> Option<f64>,
) -> Vec<GroupStat> {
    group(rows, key, value)
        .into_iter()
        .map(|(key, acc)| GroupStat {
            key,
            value: round_to(acc.sum / acc.count as f64, 2),
            count: acc.count,
        })
        .collect()
}

/// Per-key sum of `value`. Sorted by key.
pub fn sum_by<T>(
    rows: &[T],
    key: impl Fn(&T) -> String,
    value: impl Fn(&T) -> f64,
) -> Vec<GroupStat> {
    group(rows, key, |r| Some(value(r)))
        .into_iter()
        .map(|(key, acc)| GroupStat {
            key,
            value: acc.sum,
            count: acc.count,
        })
        .collect()
}

/// Row count per key, largest first; ties are ordered by key.
pub fn value_counts<T>(rows: &[T], key: impl Fn(&T) -> String) -> Vec<GroupStat> {
    let mut counts = sum_by(rows, key, |_| 1.0);
    sort_by_value_desc(&mut counts);
    counts
}

/// Distinct keys in first-seen order.
pub fn unique<T>(rows: &[T], key: impl Fn(&T) -> String) -> Vec<String> {
    let mut seen = HashSet::new();
    rows.iter()
        .map(key)
        .filter(|k| seen.insert(k.clone()))
        .collect()
}

// ── Ordering ──────────────────────────────────────────────────────────────────

/// Largest value first; equal values keep key order.
pub fn sort_by_value_desc(stats: &mut [GroupStat]) {
    stats.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.key.cmp(&b.key))
    });
}

/// Smallest value first; equal values keep key order.
pub fn sort_by_value_asc(stats: &mut [GroupStat]) {
    stats.sort_by(|a, b| {
        a.value
            .partial_cmp(&b.value)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.key.cmp(&b.key))
    });
}

fn group<T>(
    rows: &[T],
    key: impl Fn(&T) -> String,
    value: impl Fn(&T) -> Option<f64>,
) -> BTreeMap<String, Accumulator> {
    let mut groups: BTreeMap<String, Accumulator> = BTreeMap::new();
    for row in rows {
        if let Some(v) = value(row) {
            groups.entry(key(row)).or_default().add(v);
        }
    }
    groups
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        city: &'static str,
        amount: f64,
        rating: Option<f64>,
    }

    fn make_row(city: &'static str, amount: f64, rating: Option<f64>) -> Row {
        Row {
            city,
            amount,
            rating,
        }
    }

    fn sample() -> Vec<Row> {
        vec![
            make_row("Mumbai", 10.0, Some(4.0)),
            make_row("Delhi", 20.0, None),
            make_row("Mumbai", 15.0, Some(3.0)),
            make_row("Bangalore", 5.0, None),
            make_row("Delhi", 1.0, Some(5.0)),
        ]
    }

    fn keys(stats: &[GroupStat]) -> Vec<&str> {
        stats.iter().map(|s| s.key.as_str()).collect()
    }

    // ── mean_by ──────────────────────────────────────────────────────────────

    #[test]
    fn test_mean_by_sorted_by_key_and_rounded() {
        let rows = vec![
            make_row("B", 1.0, None),
            make_row("A", 1.0, None),
            make_row("A", 2.0, None),
            make_row("A", 2.0, None),
        ];
        let stats = mean_by(&rows, |r| r.city.to_string(), |r| r.amount);
        assert_eq!(keys(&stats), vec!["A", "B"]);
        assert_eq!(stats[0].value, 1.67);
        assert_eq!(stats[0].count, 3);
    }

    #[test]
    fn test_mean_by_optional_ignores_none() {
        let stats = mean_by_optional(&sample(), |r| r.city.to_string(), |r| r.rating);
        // Bangalore has no ratings at all.
        assert_eq!(keys(&stats), vec!["Delhi", "Mumbai"]);
        assert_eq!(stats[0].value, 5.0);
        assert_eq!(stats[0].count, 1);
        assert_eq!(stats[1].value, 3.5);
    }

    #[test]
    fn test_mean_by_empty_input() {
        let rows: Vec<Row> = Vec::new();
        assert!(mean_by(&rows, |r| r.city.to_string(), |r| r.amount).is_empty());
    }

    // ── sum_by / value_counts / unique ───────────────────────────────────────

    #[test]
    fn test_sum_by() {
        let stats = sum_by(&sample(), |r| r.city.to_string(), |r| r.amount);
        assert_eq!(keys(&stats), vec!["Bangalore", "Delhi", "Mumbai"]);
        assert_eq!(stats[1].value, 21.0);
        assert_eq!(stats[2].value, 25.0);
    }

    #[test]
    fn test_value_counts_desc_ties_by_key() {
        let stats = value_counts(&sample(), |r| r.city.to_string());
        assert_eq!(keys(&stats), vec!["Delhi", "Mumbai", "Bangalore"]);
        assert_eq!(stats[0].value, 2.0);
        assert_eq!(stats[0].count, 2);
    }

    #[test]
    fn test_unique_first_seen_order() {
        let cities = unique(&sample(), |r| r.city.to_string());
        assert_eq!(cities, vec!["Mumbai", "Delhi", "Bangalore"]);
    }

    // ── ordering ─────────────────────────────────────────────────────────────

    #[test]
    fn test_sort_by_value() {
        let mut stats = sum_by(&sample(), |r| r.city.to_string(), |r| r.amount);
        sort_by_value_asc(&mut stats);
        assert_eq!(keys(&stats), vec!["Bangalore", "Delhi", "Mumbai"]);
        sort_by_value_desc(&mut stats);
        assert_eq!(keys(&stats), vec!["Mumbai", "Delhi", "Bangalore"]);
    }
}
