//! Client capability consumed by the benchmarking engine.
//!
//! The engine only needs to know whether an invocation succeeded and how
//! long it took; the response payload is opaque to it. Implementations must
//! be safe to invoke from many tasks at once.

pub mod mock;
pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ClientError;

pub use mock::{MockClient, MockClientConfig};
pub use openai::{OpenAiClient, OpenAiConfig};

/// Token accounting reported by a client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl Usage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Successful response from a client invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    pub model: String,
    pub usage: Usage,
}

/// A request/response client that can be benchmarked
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Submit a prompt and wait for the response or a typed failure
    async fn invoke(&self, prompt: &str) -> Result<LlmResponse, ClientError>;

    /// Name used for the client in results
    fn name(&self) -> &str {
        "llm-client"
    }

    /// Whether dropping an in-flight `invoke` future stops the underlying
    /// call. Clients that hand the call to another thread return false, and
    /// a timed-out probe then waits for the call before releasing its slot.
    fn cancel_on_drop(&self) -> bool {
        true
    }
}

#[async_trait]
impl<T: LlmClient + ?Sized> LlmClient for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn cancel_on_drop(&self) -> bool {
        (**self).cancel_on_drop()
    }

    async fn invoke(&self, prompt: &str) -> Result<LlmResponse, ClientError> {
        (**self).invoke(prompt).await
    }
}

/// Adapter for synchronous clients.
///
/// The wrapped closure runs on tokio's blocking thread pool so a slow call
/// never stalls the async workers that drive other probes.
pub struct BlockingClient<F> {
    name: String,
    call: Arc<F>,
}

impl<F> BlockingClient<F>
where
    F: Fn(&str) -> Result<LlmResponse, ClientError> + Send + Sync + 'static,
{
    pub fn new(call: F) -> Self {
        Self::named("blocking-client", call)
    }

    pub fn named(name: impl Into<String>, call: F) -> Self {
        Self {
            name: name.into(),
            call: Arc::new(call),
        }
    }
}

#[async_trait]
impl<F> LlmClient for BlockingClient<F>
where
    F: Fn(&str) -> Result<LlmResponse, ClientError> + Send + Sync + 'static,
{
    async fn invoke(&self, prompt: &str) -> Result<LlmResponse, ClientError> {
        let call = Arc::clone(&self.call);
        let prompt = prompt.to_string();

        tokio::task::spawn_blocking(move || call(&prompt))
            .await
            .map_err(|e| ClientError::Other(format!("blocking client task failed: {}", e)))?
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn cancel_on_drop(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn echo(prompt: &str) -> Result<LlmResponse, ClientError> {
        if prompt.is_empty() {
            return Err(ClientError::InvalidInput("empty prompt".to_string()));
        }
        std::thread::sleep(Duration::from_millis(5));
        Ok(LlmResponse {
            content: prompt.to_uppercase(),
            model: "echo".to_string(),
            usage: Usage::new(1, 1),
        })
    }

    #[test]
    fn test_usage_total() {
        let usage = Usage::new(12, 30);
        assert_eq!(usage.total_tokens, 42);
    }

    #[tokio::test]
    async fn test_blocking_client_success() {
        let client = BlockingClient::new(echo);
        let response = client.invoke("hello").await.unwrap();
        assert_eq!(response.content, "HELLO");
        assert_eq!(response.model, "echo");
    }

    #[tokio::test]
    async fn test_blocking_client_failure_is_passed_through() {
        let client = BlockingClient::new(echo);
        let err = client.invoke("").await.unwrap_err();
        assert_eq!(err, ClientError::InvalidInput("empty prompt".to_string()));
    }

    #[tokio::test]
    async fn test_blocking_client_panic_becomes_failure() {
        let client = BlockingClient::new(|_: &str| -> Result<LlmResponse, ClientError> {
            panic!("driver crashed")
        });
        let err = client.invoke("hi").await.unwrap_err();
        assert!(matches!(err, ClientError::Other(_)));
    }

    #[tokio::test]
    async fn test_arc_client_delegates() {
        let client: Arc<dyn LlmClient> = Arc::new(BlockingClient::new(echo));
        let response = client.invoke("abc").await.unwrap();
        assert_eq!(response.content, "ABC");
        assert_eq!(client.name(), "blocking-client");
        assert!(!client.cancel_on_drop());

        let named = BlockingClient::named("legacy-sdk", echo);
        assert_eq!(named.name(), "legacy-sdk");
    }
}
