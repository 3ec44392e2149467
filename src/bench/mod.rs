//! Benchmark module for measuring LLM client performance.
//!
//! This module provides:
//! - Bounded task pool for concurrent probes
//! - Single-request prober with failure isolation
//! - Nearest-rank latency statistics
//! - Benchmark, comparison and load test runs
//! - Report generation

pub mod config;
pub mod pool;
pub mod probe;
pub mod report;
pub mod result;
pub mod runner;
pub mod stats;

pub use config::EngineConfig;
pub use pool::{TaskHandle, TaskPool};
pub use probe::{probe, RequestMetric};
pub use report::BenchmarkReport;
pub use result::{BenchmarkResult, ComparisonResult, LoadTestResult};
pub use runner::BenchmarkEngine;
pub use stats::{percentile, LatencySummary};
