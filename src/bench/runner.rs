//! Benchmark engine with concurrency control.
//!
//! All runs submit their probes to one shared `TaskPool`. Comparison runs
//! drive the per-client aggregations concurrently from the calling task; the
//! drivers hold no pool slots, so only probes compete for the
//! `max_concurrency` permits and nested runs cannot deadlock.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

use super::config::EngineConfig;
use super::pool::{TaskHandle, TaskPool};
use super::probe::{probe, RequestMetric};
use super::result::{BenchmarkResult, ComparisonResult, LoadTestResult};
use crate::client::LlmClient;
use crate::error::{BenchError, Result};

/// Engine that runs benchmarks, comparisons and load tests.
///
/// The caller owns the engine: construct it, run any number of operations,
/// then call [`BenchmarkEngine::shutdown`] once.
pub struct BenchmarkEngine {
    config: EngineConfig,
    pool: TaskPool,
}

impl BenchmarkEngine {
    /// Create a new engine. Fails on invalid configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let pool = TaskPool::new(config.max_concurrency)?;
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn pool(&self) -> &TaskPool {
        &self.pool
    }

    /// Run every prompt `iterations` times against `client`.
    ///
    /// Produces `prompts.len() * iterations` probes. Blocks until all of them
    /// have completed.
    pub async fn run_benchmark<S: AsRef<str>>(
        &self,
        client: Arc<dyn LlmClient>,
        prompts: &[S],
        iterations: usize,
    ) -> Result<BenchmarkResult> {
        validate_workload(prompts, iterations)?;
        let name = client.name().to_string();
        self.run_named(&name, client, prompts, iterations).await
    }

    /// Benchmark every named client on the same workload, all concurrently
    pub async fn compare_benchmark<S: AsRef<str>>(
        &self,
        clients: &HashMap<String, Arc<dyn LlmClient>>,
        prompts: &[S],
        iterations: usize,
    ) -> Result<ComparisonResult> {
        if clients.is_empty() {
            return Err(BenchError::NoClients);
        }
        validate_workload(prompts, iterations)?;

        tracing::info!(
            clients = clients.len(),
            prompts = prompts.len(),
            iterations,
            "Starting comparison"
        );

        let runs = clients.iter().map(|(name, client)| async move {
            let result = self
                .run_named(name, Arc::clone(client), prompts, iterations)
                .await?;
            Ok::<_, BenchError>((name.clone(), result))
        });

        let results = futures::future::join_all(runs)
            .await
            .into_iter()
            .collect::<Result<BTreeMap<_, _>>>()?;

        let comparison = ComparisonResult::new(results);
        tracing::info!(
            best_performer = comparison.best_performer().unwrap_or("-"),
            fastest_provider = comparison.fastest_provider().unwrap_or("-"),
            "Comparison complete"
        );

        Ok(comparison)
    }

    /// Fire `concurrent_requests` probes of one prompt as a single burst.
    ///
    /// `total_time_ms` on the result is the wall-clock span from the first
    /// dispatch to the last completion. Bursts larger than `max_concurrency`
    /// queue on the pool.
    pub async fn run_load_test(
        &self,
        client: Arc<dyn LlmClient>,
        prompt: &str,
        concurrent_requests: usize,
    ) -> Result<LoadTestResult> {
        if concurrent_requests == 0 {
            return Err(BenchError::ZeroConcurrentRequests);
        }

        let name = client.name().to_string();
        if concurrent_requests > self.pool.max_concurrency() {
            tracing::debug!(
                provider = %name,
                concurrent_requests,
                max_concurrency = self.pool.max_concurrency(),
                "Burst exceeds pool size, excess probes will queue"
            );
        }
        tracing::info!(provider = %name, concurrent_requests, "Starting load test");

        let start = Instant::now();
        let handles = (0..concurrent_requests)
            .map(|i| self.submit_probe(&client, prompt, i))
            .collect::<Result<Vec<_>>>()?;
        let metrics = TaskPool::join_all(handles).await?;
        let total_time_ms = start.elapsed().as_millis() as u64;

        let result = LoadTestResult::from_metrics(name, concurrent_requests, &metrics, total_time_ms);
        tracing::info!(
            provider = %result.provider_name,
            successful = result.successful_requests,
            total_time_ms = result.total_time_ms,
            throughput = result.throughput,
            "Load test complete"
        );

        Ok(result)
    }

    /// Stop accepting work. Results already returned stay valid.
    pub fn shutdown(&self) {
        self.pool.shutdown();
        tracing::info!("Benchmark engine shut down");
    }

    async fn run_named<S: AsRef<str>>(
        &self,
        name: &str,
        client: Arc<dyn LlmClient>,
        prompts: &[S],
        iterations: usize,
    ) -> Result<BenchmarkResult> {
        tracing::info!(
            provider = %name,
            total = prompts.len() * iterations,
            "Starting benchmark"
        );
        let start = Instant::now();

        let mut handles = Vec::with_capacity(prompts.len() * iterations);
        for prompt in prompts {
            for iteration in 0..iterations {
                handles.push(self.submit_probe(&client, prompt.as_ref(), iteration)?);
            }
        }

        let metrics = TaskPool::join_all(handles).await?;
        let result = BenchmarkResult::from_metrics(name, &metrics);

        tracing::info!(
            provider = %name,
            total = result.total_requests,
            successful = result.successful_requests,
            avg_ms = result.average_response_time_ms,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Benchmark complete"
        );

        Ok(result)
    }

    fn submit_probe(
        &self,
        client: &Arc<dyn LlmClient>,
        prompt: &str,
        iteration_index: usize,
    ) -> Result<TaskHandle<RequestMetric>> {
        let client = Arc::clone(client);
        let prompt = prompt.to_string();
        let timeout = self.config.probe_timeout;

        self.pool.submit(async move {
            probe(client.as_ref(), &prompt, iteration_index, timeout).await
        })
    }
}

fn validate_workload<S: AsRef<str>>(prompts: &[S], iterations: usize) -> Result<()> {
    if prompts.is_empty() {
        return Err(BenchError::EmptyPrompts);
    }
    if iterations == 0 {
        return Err(BenchError::ZeroIterations);
    }
    Ok(())
}
