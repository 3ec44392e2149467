//! Latency statistics shared by every aggregator.
//!
//! Percentiles use the nearest-rank method: the value returned is always an
//! element of the data set, never an interpolation between two elements.

use serde::{Deserialize, Serialize};

/// Nearest-rank percentile over values sorted ascending.
///
/// `percentile` is expressed on a 0-100 scale. The rank is
/// `ceil(percentile / 100 * n) - 1`, clamped to `[0, n - 1]`.
/// Returns `None` for an empty slice.
pub fn percentile(sorted: &[u64], percentile: f64) -> Option<u64> {
    if sorted.is_empty() {
        return None;
    }

    let n = sorted.len();
    // Multiply before dividing so exact ranks such as 95 * 10 / 100 stay exact
    let rank = (percentile * n as f64 / 100.0).ceil() as i64 - 1;
    let index = rank.clamp(0, n as i64 - 1) as usize;
    sorted.get(index).copied()
}

/// Arithmetic mean, 0.0 for an empty slice
pub fn mean(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<u64>() as f64 / values.len() as f64
}

/// `part / total`, 0.0 when `total` is zero
pub fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64
}

/// Summary of a set of latencies, all in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    pub count: usize,
    pub mean_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
}

impl LatencySummary {
    /// Summarize latencies in any order. Every field is 0.0 when empty.
    pub fn from_latencies(mut latencies: Vec<u64>) -> Self {
        if latencies.is_empty() {
            return Self::default();
        }
        latencies.sort_unstable();

        let at = |p: f64| percentile(&latencies, p).unwrap_or(0) as f64;

        Self {
            count: latencies.len(),
            mean_ms: mean(&latencies),
            min_ms: latencies[0] as f64,
            max_ms: latencies[latencies.len() - 1] as f64,
            p50_ms: at(50.0),
            p95_ms: at(95.0),
            p99_ms: at(99.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TEN: [u64; 10] = [10, 20, 30, 40, 50, 60, 70, 80, 90, 100];

    #[test]
    fn test_percentile_nearest_rank_ten_values() {
        // ceil(0.50 * 10) - 1 = 4
        assert_eq!(percentile(&TEN, 50.0), Some(50));
        // ceil(0.95 * 10) - 1 = ceil(9.5) - 1 = 9
        assert_eq!(percentile(&TEN, 95.0), Some(100));
        // ceil(0.99 * 10) - 1 = 9
        assert_eq!(percentile(&TEN, 99.0), Some(100));
        // ceil(0.90 * 10) - 1 = 8
        assert_eq!(percentile(&TEN, 90.0), Some(90));
    }

    #[test]
    fn test_percentile_twenty_values() {
        let values: Vec<u64> = (1..=20).map(|v| v * 10).collect();
        // ceil(0.95 * 20) - 1 = 18
        assert_eq!(percentile(&values, 95.0), Some(190));
        // ceil(0.99 * 20) - 1 = 19
        assert_eq!(percentile(&values, 99.0), Some(200));
        assert_eq!(percentile(&values, 50.0), Some(100));
    }

    #[test]
    fn test_percentile_clamps() {
        assert_eq!(percentile(&TEN, 0.0), Some(10));
        assert_eq!(percentile(&TEN, 150.0), Some(100));
        assert_eq!(percentile(&[42], 99.0), Some(42));
        assert_eq!(percentile(&[], 50.0), None);
    }

    #[test]
    fn test_percentile_is_not_interpolated() {
        // Linear interpolation would give 15 here
        assert_eq!(percentile(&[10, 20], 50.0), Some(10));
    }

    #[test]
    fn test_mean_and_ratio() {
        assert_eq!(mean(&TEN), 55.0);
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(ratio(3, 4), 0.75);
        assert_eq!(ratio(0, 0), 0.0);
    }

    #[test]
    fn test_summary_unsorted_input() {
        let summary = LatencySummary::from_latencies(vec![100, 10, 50, 90, 30, 70, 20, 60, 40, 80]);
        assert_eq!(summary.count, 10);
        assert_eq!(summary.mean_ms, 55.0);
        assert_eq!(summary.min_ms, 10.0);
        assert_eq!(summary.max_ms, 100.0);
        assert_eq!(summary.p50_ms, 50.0);
        assert_eq!(summary.p99_ms, 100.0);
    }

    #[test]
    fn test_summary_empty() {
        assert_eq!(LatencySummary::from_latencies(Vec::new()), LatencySummary::default());
    }

    proptest! {
        #[test]
        fn prop_p99_not_below_p95(mut values in prop::collection::vec(0u64..100_000, 1..500)) {
            values.sort_unstable();
            let p95 = percentile(&values, 95.0).unwrap();
            let p99 = percentile(&values, 99.0).unwrap();
            prop_assert!(p99 >= p95);
        }

        #[test]
        fn prop_percentile_is_a_member(
            mut values in prop::collection::vec(0u64..100_000, 1..200),
            p in 0.0f64..=100.0,
        ) {
            values.sort_unstable();
            let v = percentile(&values, p).unwrap();
            prop_assert!(values.contains(&v));
        }

        #[test]
        fn prop_summary_bounds(values in prop::collection::vec(0u64..10_000, 1..200)) {
            let s = LatencySummary::from_latencies(values);
            prop_assert!(s.min_ms <= s.p50_ms);
            prop_assert!(s.p50_ms <= s.p95_ms);
            prop_assert!(s.p95_ms <= s.p99_ms);
            prop_assert!(s.p99_ms <= s.max_ms);
            prop_assert!(s.mean_ms >= s.min_ms && s.mean_ms <= s.max_ms);
        }
    }
}
