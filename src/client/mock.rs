//! Mock client with simulated latency and failures.

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::{LlmClient, LlmResponse, Usage};
use crate::error::ClientError;

/// Configuration for the mock client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockClientConfig {
    /// Model identifier reported in responses
    pub model: String,
    /// Base latency per invocation in milliseconds
    pub latency_ms: u64,
    /// Upper bound of the random latency added on top of the base
    pub jitter_ms: u64,
    /// Random error rate (0.0 to 1.0)
    pub error_rate: f64,
    /// Fail every Nth invocation (1-based), for reproducible failure patterns
    pub fail_every: Option<u64>,
}

impl Default for MockClientConfig {
    fn default() -> Self {
        Self {
            model: "mock-model".to_string(),
            latency_ms: 50,
            jitter_ms: 0,
            error_rate: 0.0,
            fail_every: None,
        }
    }
}

/// In-process client that sleeps instead of calling a real endpoint
pub struct MockClient {
    config: MockClientConfig,
    calls: AtomicU64,
}

impl MockClient {
    /// Create a new mock client with the given configuration
    pub fn new(config: MockClientConfig) -> Self {
        Self {
            config,
            calls: AtomicU64::new(0),
        }
    }

    /// Mock client with a fixed latency and no failures
    pub fn with_latency(latency_ms: u64) -> Self {
        Self::new(MockClientConfig {
            latency_ms,
            ..Default::default()
        })
    }

    /// Number of invocations so far
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    fn simulated_delay(&self) -> Duration {
        let jitter = if self.config.jitter_ms > 0 {
            rand::thread_rng().gen_range(0..=self.config.jitter_ms)
        } else {
            0
        };
        Duration::from_millis(self.config.latency_ms + jitter)
    }

    fn should_fail_randomly(&self) -> bool {
        let rate = self.config.error_rate.clamp(0.0, 1.0);
        rate > 0.0 && rand::thread_rng().gen_bool(rate)
    }
}

#[async_trait]
impl LlmClient for MockClient {
    async fn invoke(&self, prompt: &str) -> Result<LlmResponse, ClientError> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        let delay = self.simulated_delay();
        let random_failure = self.should_fail_randomly();

        tokio::time::sleep(delay).await;

        if prompt.trim().is_empty() {
            return Err(ClientError::InvalidInput(
                "prompt must not be empty".to_string(),
            ));
        }

        if let Some(every) = self.config.fail_every {
            if every > 0 && call % every == 0 {
                return Err(ClientError::Api {
                    status: 503,
                    message: format!("simulated outage on call {}", call),
                });
            }
        }

        if random_failure {
            return Err(ClientError::Api {
                status: 500,
                message: "simulated upstream failure".to_string(),
            });
        }

        let content = format!("Mock response to: {}", prompt);
        let usage = Usage::new(
            prompt.split_whitespace().count() as u64,
            content.split_whitespace().count() as u64,
        );

        Ok(LlmResponse {
            content,
            model: self.config.model.clone(),
            usage,
        })
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}
