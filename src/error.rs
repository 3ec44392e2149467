// Error handling module
// Engine-level errors and probe-level client failures

use thiserror::Error;

/// Errors raised by the benchmarking engine itself.
///
/// Individual probe failures never surface here; they are recorded on the
/// corresponding `RequestMetric` instead.
#[derive(Error, Debug)]
pub enum BenchError {
    /// Invalid engine configuration
    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    /// No prompts supplied to a benchmark run
    #[error("Validation error: prompt list must not be empty")]
    EmptyPrompts,

    /// Iteration count of zero
    #[error("Validation error: iterations must be greater than zero")]
    ZeroIterations,

    /// Load test burst size of zero
    #[error("Validation error: concurrent requests must be greater than zero")]
    ZeroConcurrentRequests,

    /// Comparison requested without any clients
    #[error("Validation error: at least one client is required for a comparison")]
    NoClients,

    /// Work submitted after the pool was shut down
    #[error("Task pool has been shut down")]
    PoolShutdown,

    /// A submitted task panicked or was aborted
    #[error("Task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

/// Failures reported by an `LlmClient` for a single invocation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    /// The invocation did not complete in time
    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    /// Network or connection level failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// The prompt was rejected before it was sent
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Upstream API returned an error status
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Upstream response could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Anything else
    #[error("{0}")]
    Other(String),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, BenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bench_error_messages() {
        let err = BenchError::InvalidConfig("max_concurrency must be at least 1".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: max_concurrency must be at least 1"
        );

        assert_eq!(
            BenchError::EmptyPrompts.to_string(),
            "Validation error: prompt list must not be empty"
        );
        assert_eq!(
            BenchError::ZeroIterations.to_string(),
            "Validation error: iterations must be greater than zero"
        );
        assert_eq!(
            BenchError::PoolShutdown.to_string(),
            "Task pool has been shut down"
        );
    }

    #[test]
    fn test_client_error_messages() {
        let err = ClientError::Api {
            status: 429,
            message: "Rate limit exceeded".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 429 - Rate limit exceeded");

        assert_eq!(
            ClientError::Timeout(1500).to_string(),
            "Request timed out after 1500 ms"
        );
        assert_eq!(
            ClientError::Transport("connection refused".to_string()).to_string(),
            "Transport error: connection refused"
        );
        assert_eq!(ClientError::Other("boom".to_string()).to_string(), "boom");
    }

    #[tokio::test]
    async fn test_join_error_conversion() {
        let handle = tokio::spawn(async {
            panic!("probe exploded");
        });
        let join_err = handle.await.unwrap_err();
        let err: BenchError = join_err.into();
        assert!(matches!(err, BenchError::TaskFailed(_)));
        assert!(err.to_string().starts_with("Task failed:"));
    }
}
