// LLM Bench - Library root

pub mod bench;
pub mod client;
pub mod config;
pub mod error;

pub use bench::{BenchmarkEngine, BenchmarkResult, ComparisonResult, EngineConfig, LoadTestResult};
pub use client::{LlmClient, LlmResponse};
pub use error::{BenchError, ClientError};
