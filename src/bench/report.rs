//! Report generation for benchmark results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

use super::result::{BenchmarkResult, ComparisonResult, LoadTestResult};

/// Outcome carried by a report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportBody {
    Benchmark(BenchmarkResult),
    Comparison(ComparisonResult),
    LoadTest(LoadTestResult),
}

/// Timestamped envelope around a single engine result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub generated_at: DateTime<Utc>,
    pub max_concurrency: usize,
    pub body: ReportBody,
}

impl BenchmarkReport {
    pub fn new(max_concurrency: usize, body: ReportBody) -> Self {
        Self {
            generated_at: Utc::now(),
            max_concurrency,
            body,
        }
    }

    pub fn benchmark(max_concurrency: usize, result: BenchmarkResult) -> Self {
        Self::new(max_concurrency, ReportBody::Benchmark(result))
    }

    pub fn comparison(max_concurrency: usize, result: ComparisonResult) -> Self {
        Self::new(max_concurrency, ReportBody::Comparison(result))
    }

    pub fn load_test(max_concurrency: usize, result: LoadTestResult) -> Self {
        Self::new(max_concurrency, ReportBody::LoadTest(result))
    }

    /// Export the report as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Print the report as an ASCII table
    pub fn print_table(&self) {
        println!("{}", self.render_table());
    }

    /// Render the report as an ASCII table
    pub fn render_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "LLM BENCHMARK RESULTS  ({}, max concurrency {})",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.max_concurrency
        );
        out.push('\n');

        match &self.body {
            ReportBody::Benchmark(result) => {
                render_benchmark_rows(&mut out, std::iter::once(result));
                render_errors(&mut out, std::iter::once(result));
            }
            ReportBody::Comparison(comparison) => {
                render_benchmark_rows(&mut out, comparison.results().values());
                render_errors(&mut out, comparison.results().values());
                let _ = writeln!(
                    out,
                    "Best performer:   {}",
                    comparison.best_performer().unwrap_or("N/A")
                );
                let _ = writeln!(
                    out,
                    "Fastest provider: {}",
                    comparison.fastest_provider().unwrap_or("N/A")
                );
            }
            ReportBody::LoadTest(result) => render_load_test(&mut out, result),
        }

        out
    }
}

const BENCH_TOP: &str = "┌──────────────────────┬──────────┬──────────┬──────────┬──────────┬──────────┬──────────┐";
const BENCH_MID: &str = "├──────────────────────┼──────────┼──────────┼──────────┼──────────┼──────────┼──────────┤";
const BENCH_BOT: &str = "└──────────────────────┴──────────┴──────────┴──────────┴──────────┴──────────┴──────────┘";

fn render_benchmark_rows<'a>(out: &mut String, results: impl Iterator<Item = &'a BenchmarkResult>) {
    let _ = writeln!(out, "{}", BENCH_TOP);
    let _ = writeln!(
        out,
        "│ {:<20} │ {:>8} │ {:>8} │ {:>8} │ {:>8} │ {:>8} │ {:>8} │",
        "Provider", "Requests", "Success%", "avg(ms)", "p50(ms)", "p95(ms)", "p99(ms)"
    );
    let _ = writeln!(out, "{}", BENCH_MID);

    for r in results {
        let _ = writeln!(
            out,
            "│ {:<20} │ {:>8} │ {:>7.1}% │ {:>8.1} │ {:>8.1} │ {:>8.1} │ {:>8.1} │",
            truncate(&r.provider_name, 20),
            r.total_requests,
            r.success_rate * 100.0,
            r.average_response_time_ms,
            r.p50_response_time_ms,
            r.p95_response_time_ms,
            r.p99_response_time_ms
        );
    }

    let _ = writeln!(out, "{}", BENCH_BOT);
    out.push('\n');
}

fn render_errors<'a>(out: &mut String, results: impl Iterator<Item = &'a BenchmarkResult>) {
    for r in results.filter(|r| !r.sample_errors.is_empty()) {
        let _ = writeln!(
            out,
            "Failures for {} ({} of {}):",
            r.provider_name, r.failed_requests, r.total_requests
        );
        for error in &r.sample_errors {
            let _ = writeln!(out, "  - {}", error);
        }
    }
}

fn render_load_test(out: &mut String, r: &LoadTestResult) {
    let _ = writeln!(out, "Load test: {}", r.provider_name);
    let _ = writeln!(out, "  Concurrent requests: {}", r.concurrent_requests);
    let _ = writeln!(
        out,
        "  Successful:          {} ({:.1}%)",
        r.successful_requests,
        r.success_rate * 100.0
    );
    let _ = writeln!(out, "  Failed:              {}", r.failed_requests);
    let _ = writeln!(out, "  Total time:          {} ms", r.total_time_ms);
    let _ = writeln!(out, "  Throughput:          {:.2} req/s", r.throughput);
    let _ = writeln!(out, "  Average latency:     {:.1} ms", r.average_response_time_ms);
    let _ = writeln!(out, "  p95 latency:         {:.1} ms", r.p95_response_time_ms);
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(max - 1).collect();
        t.push('…');
        t
    }
}
