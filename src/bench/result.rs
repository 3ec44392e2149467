//! Immutable summaries produced by the engine.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::probe::RequestMetric;
use super::stats::{ratio, LatencySummary};

/// Number of failure messages kept on a result
pub const MAX_SAMPLE_ERRORS: usize = 10;

fn successful_latencies(metrics: &[RequestMetric]) -> Vec<u64> {
    metrics
        .iter()
        .filter(|m| m.succeeded)
        .map(|m| m.response_time_ms)
        .collect()
}

fn sample_errors(metrics: &[RequestMetric]) -> Vec<String> {
    metrics
        .iter()
        .filter_map(|m| m.error_message.clone())
        .take(MAX_SAMPLE_ERRORS)
        .collect()
}

/// Per-client summary of a benchmark run.
///
/// Latency fields cover successful requests only and are 0.0 when nothing
/// succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub provider_name: String,
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    /// Fraction in `[0.0, 1.0]`
    pub success_rate: f64,
    pub average_response_time_ms: f64,
    pub min_response_time_ms: f64,
    pub max_response_time_ms: f64,
    pub p50_response_time_ms: f64,
    pub p95_response_time_ms: f64,
    pub p99_response_time_ms: f64,
    /// First few failure messages in submission order
    pub sample_errors: Vec<String>,
}

impl BenchmarkResult {
    pub fn from_metrics(provider_name: impl Into<String>, metrics: &[RequestMetric]) -> Self {
        let latencies = successful_latencies(metrics);
        let successful_requests = latencies.len();
        let total_requests = metrics.len();
        let summary = LatencySummary::from_latencies(latencies);

        Self {
            provider_name: provider_name.into(),
            total_requests,
            successful_requests,
            failed_requests: total_requests - successful_requests,
            success_rate: ratio(successful_requests, total_requests),
            average_response_time_ms: summary.mean_ms,
            min_response_time_ms: summary.min_ms,
            max_response_time_ms: summary.max_ms,
            p50_response_time_ms: summary.p50_ms,
            p95_response_time_ms: summary.p95_ms,
            p99_response_time_ms: summary.p99_ms,
            sample_errors: sample_errors(metrics),
        }
    }
}

/// Results of several clients benchmarked against the same workload.
///
/// Entries are kept sorted by client name, and that order is the tie-break:
/// when two clients are equal on the compared metric, the one whose name
/// sorts first wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    results: BTreeMap<String, BenchmarkResult>,
    best_performer: Option<String>,
    fastest_provider: Option<String>,
}

impl ComparisonResult {
    pub fn new(results: BTreeMap<String, BenchmarkResult>) -> Self {
        let best_performer = pick_best_performer(&results);
        let fastest_provider = pick_fastest_provider(&results);

        Self {
            results,
            best_performer,
            fastest_provider,
        }
    }

    /// Per-client results, sorted by name
    pub fn results(&self) -> &BTreeMap<String, BenchmarkResult> {
        &self.results
    }

    pub fn get(&self, name: &str) -> Option<&BenchmarkResult> {
        self.results.get(name)
    }

    /// Client with the highest success rate
    pub fn best_performer(&self) -> Option<&str> {
        self.best_performer.as_deref()
    }

    /// Client with the lowest average response time
    pub fn fastest_provider(&self) -> Option<&str> {
        self.fastest_provider.as_deref()
    }
}

impl From<&HashMap<String, BenchmarkResult>> for ComparisonResult {
    fn from(results: &HashMap<String, BenchmarkResult>) -> Self {
        Self::new(
            results
                .iter()
                .map(|(name, result)| (name.clone(), result.clone()))
                .collect(),
        )
    }
}

fn pick_best_performer(results: &BTreeMap<String, BenchmarkResult>) -> Option<String> {
    let mut best: Option<(&String, f64)> = None;
    for (name, result) in results {
        match best {
            Some((_, rate)) if result.success_rate <= rate => {}
            _ => best = Some((name, result.success_rate)),
        }
    }
    best.map(|(name, _)| name.clone())
}

/// Lowest average latency, deliberately narrower than a plain minimum:
/// clients without a single success report an average of 0.0, so they only
/// compete when no client succeeded at all.
fn pick_fastest_provider(results: &BTreeMap<String, BenchmarkResult>) -> Option<String> {
    let any_success = results.values().any(|r| r.successful_requests > 0);

    let mut fastest: Option<(&String, f64)> = None;
    for (name, result) in results {
        if any_success && result.successful_requests == 0 {
            continue;
        }
        match fastest {
            Some((_, avg)) if result.average_response_time_ms >= avg => {}
            _ => fastest = Some((name, result.average_response_time_ms)),
        }
    }
    fastest.map(|(name, _)| name.clone())
}

/// Summary of a burst of concurrent requests against one client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadTestResult {
    pub provider_name: String,
    pub concurrent_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    /// Wall-clock span from first dispatch to last completion
    pub total_time_ms: u64,
    /// Fraction in `[0.0, 1.0]`
    pub success_rate: f64,
    /// Successful requests per second, 0.0 when `total_time_ms` is zero
    pub throughput: f64,
    pub average_response_time_ms: f64,
    pub p95_response_time_ms: f64,
}

impl LoadTestResult {
    pub fn from_metrics(
        provider_name: impl Into<String>,
        concurrent_requests: usize,
        metrics: &[RequestMetric],
        total_time_ms: u64,
    ) -> Self {
        let latencies = successful_latencies(metrics);
        let successful_requests = latencies.len();
        let summary = LatencySummary::from_latencies(latencies);

        Self {
            provider_name: provider_name.into(),
            concurrent_requests,
            successful_requests,
            failed_requests: metrics.len() - successful_requests,
            total_time_ms,
            success_rate: ratio(successful_requests, concurrent_requests),
            throughput: throughput(successful_requests, total_time_ms),
            average_response_time_ms: summary.mean_ms,
            p95_response_time_ms: summary.p95_ms,
        }
    }
}

/// Requests per second over a wall-clock span in milliseconds
pub fn throughput(successful_requests: usize, total_time_ms: u64) -> f64 {
    if total_time_ms == 0 {
        return 0.0;
    }
    successful_requests as f64 / total_time_ms as f64 * 1000.0
}
