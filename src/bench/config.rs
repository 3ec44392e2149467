//! Configuration structs for the benchmarking engine.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{BenchError, Result};

/// Default number of probes allowed to run at once
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// Configuration for a `BenchmarkEngine`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of probes running simultaneously
    pub max_concurrency: usize,
    /// Optional per-probe timeout. `None` lets a hung client block its slot
    /// indefinitely.
    #[serde(default, with = "optional_millis")]
    pub probe_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            probe_timeout: None,
        }
    }
}

impl EngineConfig {
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency,
            ..Default::default()
        }
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.probe_timeout = Some(timeout);
        }
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 {
            return Err(BenchError::InvalidConfig(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Serialize `Option<Duration>` as optional milliseconds
mod optional_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}
