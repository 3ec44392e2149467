//! Single-request prober.

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use crate::client::{LlmClient, LlmResponse};
use crate::error::ClientError;

/// Outcome of one timed invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMetric {
    pub iteration_index: usize,
    pub prompt: String,
    pub succeeded: bool,
    /// Wall-clock duration of the invocation, failures included
    pub response_time_ms: u64,
    /// Set iff `succeeded` is false
    pub error_message: Option<String>,
}

impl RequestMetric {
    pub fn success(iteration_index: usize, prompt: impl Into<String>, response_time_ms: u64) -> Self {
        Self {
            iteration_index,
            prompt: prompt.into(),
            succeeded: true,
            response_time_ms,
            error_message: None,
        }
    }

    pub fn failure(
        iteration_index: usize,
        prompt: impl Into<String>,
        response_time_ms: u64,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            iteration_index,
            prompt: prompt.into(),
            succeeded: false,
            response_time_ms,
            error_message: Some(error_message.into()),
        }
    }
}

/// Invoke `client` once and record the outcome.
///
/// Never fails: client errors, timeouts and panics inside the client all
/// become a failed metric. Timing covers exactly the invocation, or up to the
/// deadline when it times out.
///
/// A timed-out call on a client that does not cancel on drop is still awaited
/// before returning, so the caller's pool slot stays occupied until the
/// underlying call has actually finished.
pub async fn probe(
    client: &dyn LlmClient,
    prompt: &str,
    iteration_index: usize,
    timeout: Option<Duration>,
) -> RequestMetric {
    let (outcome, elapsed_ms) = invoke_guarded(client, prompt, timeout).await;

    match outcome {
        Ok(response) => {
            tracing::debug!(
                iteration = iteration_index,
                elapsed_ms,
                completion_tokens = response.usage.completion_tokens,
                "Probe succeeded"
            );
            RequestMetric::success(iteration_index, prompt, elapsed_ms)
        }
        Err(e) => {
            tracing::warn!(iteration = iteration_index, elapsed_ms, error = %e, "Probe failed");
            RequestMetric::failure(iteration_index, prompt, elapsed_ms, e.to_string())
        }
    }
}

async fn invoke_guarded(
    client: &dyn LlmClient,
    prompt: &str,
    timeout: Option<Duration>,
) -> (Result<LlmResponse, ClientError>, u64) {
    let start = Instant::now();
    let call = AssertUnwindSafe(client.invoke(prompt)).catch_unwind();
    tokio::pin!(call);

    let caught = match timeout {
        Some(limit) => match tokio::time::timeout(limit, call.as_mut()).await {
            Ok(caught) => caught,
            Err(_) => {
                let elapsed_ms = start.elapsed().as_millis() as u64;
                if !client.cancel_on_drop() {
                    let _ = call.await;
                    tracing::debug!(
                        elapsed_ms,
                        drained_ms = start.elapsed().as_millis() as u64,
                        "Timed-out call returned"
                    );
                }
                return (Err(ClientError::Timeout(limit.as_millis() as u64)), elapsed_ms);
            }
        },
        None => call.await,
    };
    let elapsed_ms = start.elapsed().as_millis() as u64;

    let outcome =
        caught.unwrap_or_else(|payload| Err(ClientError::Other(panic_message(payload))));
    (outcome, elapsed_ms)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("client panicked: {}", detail)
}
