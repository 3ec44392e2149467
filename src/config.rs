use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::bench::config::{EngineConfig, DEFAULT_MAX_CONCURRENCY};
use crate::client::{LlmClient, MockClient, MockClientConfig, OpenAiClient, OpenAiConfig};

/// Prompt used when none is given
pub const DEFAULT_PROMPT: &str = "Say hello in exactly 10 words.";

/// LLM Bench - concurrent benchmarking for LLM clients
#[derive(Parser, Debug)]
#[command(name = "llm-bench", author, version, about, long_about = None)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    /// Maximum number of requests in flight at once
    #[arg(
        short = 'c',
        long,
        env = "MAX_CONCURRENCY",
        default_value_t = DEFAULT_MAX_CONCURRENCY,
        global = true
    )]
    pub max_concurrency: usize,

    /// Per-request timeout in milliseconds (0 disables the timeout)
    #[arg(long, env = "PROBE_TIMEOUT_MS", default_value_t = 0, global = true)]
    pub probe_timeout_ms: u64,

    /// Output results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Benchmark one client over a list of prompts
    Run {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        prompts: PromptArgs,

        /// Repetitions of each prompt
        #[arg(short = 'n', long, default_value_t = 5)]
        iterations: usize,
    },

    /// Benchmark several clients on the same workload
    Compare {
        /// Mock client profile NAME:LATENCY_MS[:ERROR_RATE] (repeatable)
        #[arg(long = "mock", value_name = "PROFILE")]
        mocks: Vec<MockProfile>,

        #[command(flatten)]
        endpoint: EndpointArgs,

        #[command(flatten)]
        prompts: PromptArgs,

        /// Repetitions of each prompt
        #[arg(short = 'n', long, default_value_t = 5)]
        iterations: usize,
    },

    /// Fire a burst of concurrent requests with a single prompt
    LoadTest {
        #[command(flatten)]
        target: TargetArgs,

        /// Prompt sent by every request in the burst
        #[arg(short = 'p', long, default_value = DEFAULT_PROMPT)]
        prompt: String,

        /// Number of requests in the burst
        #[arg(short = 'r', long, default_value_t = 50)]
        requests: usize,
    },
}

/// Client under test: an endpoint if one is given, otherwise a mock
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    #[command(flatten)]
    pub endpoint: EndpointArgs,

    /// Mock latency in milliseconds
    #[arg(long, default_value_t = 50)]
    pub latency_ms: u64,

    /// Mock random extra latency in milliseconds
    #[arg(long, default_value_t = 0)]
    pub jitter_ms: u64,

    /// Mock error rate (0.0 to 1.0)
    #[arg(long, default_value_t = 0.0)]
    pub error_rate: f64,
}

/// OpenAI-compatible endpoint settings
#[derive(Args, Debug, Clone)]
pub struct EndpointArgs {
    /// Base URL of an OpenAI-compatible API
    #[arg(long, env = "LLM_ENDPOINT")]
    pub endpoint: Option<String>,

    /// API key for the endpoint
    #[arg(short = 'k', long, env = "LLM_API_KEY")]
    pub api_key: Option<String>,

    /// Model to request
    #[arg(short = 'm', long, env = "LLM_MODEL", default_value = "gpt-4o-mini")]
    pub model: String,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT", default_value_t = 60)]
    pub http_timeout: u64,
}

#[derive(Args, Debug, Clone)]
pub struct PromptArgs {
    /// Prompt to send (repeatable)
    #[arg(short = 'p', long = "prompt", default_value = DEFAULT_PROMPT)]
    pub prompts: Vec<String>,

    /// File with one prompt per line; replaces --prompt
    #[arg(long)]
    pub prompts_file: Option<PathBuf>,
}

/// Named mock client settings parsed from `NAME:LATENCY_MS[:ERROR_RATE]`
#[derive(Debug, Clone, PartialEq)]
pub struct MockProfile {
    pub name: String,
    pub latency_ms: u64,
    pub error_rate: f64,
}

impl FromStr for MockProfile {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() < 2 || parts.len() > 3 || parts[0].is_empty() {
            return Err(format!(
                "Invalid mock profile '{}', expected NAME:LATENCY_MS[:ERROR_RATE]",
                s
            ));
        }

        let latency_ms = parts[1]
            .parse::<u64>()
            .map_err(|_| format!("Invalid latency in mock profile '{}'", s))?;

        let error_rate = match parts.get(2) {
            Some(rate) => rate
                .parse::<f64>()
                .ok()
                .filter(|r| (0.0..=1.0).contains(r))
                .ok_or_else(|| format!("Invalid error rate in mock profile '{}'", s))?,
            None => 0.0,
        };

        Ok(Self {
            name: parts[0].to_string(),
            latency_ms,
            error_rate,
        })
    }
}

impl MockProfile {
    pub fn build(&self) -> Arc<dyn LlmClient> {
        Arc::new(MockClient::new(MockClientConfig {
            model: self.name.clone(),
            latency_ms: self.latency_ms,
            error_rate: self.error_rate,
            ..Default::default()
        }))
    }
}

impl Cli {
    /// Load configuration with priority: CLI > ENV (.env included) > defaults
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::parse()
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new(self.max_concurrency)
            .with_probe_timeout(Duration::from_millis(self.probe_timeout_ms))
    }
}

impl EndpointArgs {
    /// Build an endpoint client if `--endpoint` was given
    pub fn build(&self) -> Result<Option<Arc<dyn LlmClient>>> {
        let Some(base_url) = &self.endpoint else {
            return Ok(None);
        };

        let client = OpenAiClient::new(OpenAiConfig {
            base_url: base_url.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            timeout_secs: self.http_timeout,
            ..Default::default()
        })?;

        Ok(Some(Arc::new(client)))
    }
}

/// Build the named client set for `compare`. Names must be unique across the
/// mock profiles and the endpoint model.
pub fn compare_clients(
    mocks: &[MockProfile],
    endpoint: &EndpointArgs,
) -> Result<HashMap<String, Arc<dyn LlmClient>>> {
    let mut clients: HashMap<String, Arc<dyn LlmClient>> = HashMap::new();
    let endpoint_client = endpoint.build()?;

    let candidates = mocks
        .iter()
        .map(|profile| (profile.name.clone(), profile.build()))
        .chain(endpoint_client.map(|client| (client.name().to_string(), client)));

    for (name, client) in candidates {
        match clients.entry(name) {
            Entry::Occupied(entry) => bail!("Duplicate client name '{}' in compare", entry.key()),
            Entry::Vacant(entry) => {
                entry.insert(client);
            }
        }
    }

    Ok(clients)
}

impl TargetArgs {
    pub fn build(&self) -> Result<Arc<dyn LlmClient>> {
        if let Some(client) = self.endpoint.build()? {
            return Ok(client);
        }

        if !(0.0..=1.0).contains(&self.error_rate) {
            bail!("error rate must be between 0.0 and 1.0, got {}", self.error_rate);
        }

        Ok(Arc::new(MockClient::new(MockClientConfig {
            model: "mock".to_string(),
            latency_ms: self.latency_ms,
            jitter_ms: self.jitter_ms,
            error_rate: self.error_rate,
            fail_every: None,
        })))
    }
}

impl PromptArgs {
    /// Prompts from the file if given, otherwise from `--prompt`
    pub fn load(&self) -> Result<Vec<String>> {
        let Some(path) = &self.prompts_file else {
            return Ok(self.prompts.clone());
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read prompts from {}", path.display()))?;

        let prompts: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        if prompts.is_empty() {
            bail!("{} does not contain any prompts", path.display());
        }

        Ok(prompts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_mock_profile() {
        let profile: MockProfile = "fast:20".parse().unwrap();
        assert_eq!(
            profile,
            MockProfile {
                name: "fast".to_string(),
                latency_ms: 20,
                error_rate: 0.0
            }
        );

        let profile: MockProfile = "flaky:80:0.25".parse().unwrap();
        assert_eq!(profile.error_rate, 0.25);
        assert_eq!(profile.build().name(), "flaky");
    }

    #[test]
    fn test_parse_mock_profile_invalid() {
        assert!("fast".parse::<MockProfile>().is_err());
        assert!(":20".parse::<MockProfile>().is_err());
        assert!("fast:abc".parse::<MockProfile>().is_err());
        assert!("fast:20:1.5".parse::<MockProfile>().is_err());
        assert!("fast:20:0.1:extra".parse::<MockProfile>().is_err());
    }

    #[test]
    fn test_cli_run_defaults() {
        let cli = Cli::try_parse_from(["llm-bench", "run"]).unwrap();
        assert_eq!(cli.max_concurrency, DEFAULT_MAX_CONCURRENCY);
        assert!(!cli.json);
        assert!(cli.engine_config().probe_timeout.is_none());

        match cli.command {
            Command::Run {
                prompts,
                iterations,
                target,
            } => {
                assert_eq!(iterations, 5);
                assert_eq!(prompts.load().unwrap(), vec![DEFAULT_PROMPT.to_string()]);
                assert_eq!(target.build().unwrap().name(), "mock");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_compare_profiles() {
        let cli = Cli::try_parse_from([
            "llm-bench",
            "compare",
            "--mock",
            "a:10",
            "--mock",
            "b:30:0.5",
            "-n",
            "3",
            "-c",
            "16",
            "--probe-timeout-ms",
            "500",
            "--json",
        ])
        .unwrap();

        assert!(cli.json);
        let config = cli.engine_config();
        assert_eq!(config.max_concurrency, 16);
        assert_eq!(config.probe_timeout, Some(Duration::from_millis(500)));

        match cli.command {
            Command::Compare {
                mocks, iterations, ..
            } => {
                assert_eq!(mocks.len(), 2);
                assert_eq!(mocks[1].name, "b");
                assert_eq!(iterations, 3);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    fn compare_args(args: &[&str]) -> (Vec<MockProfile>, EndpointArgs) {
        let cli = Cli::try_parse_from(["llm-bench", "compare"].iter().chain(args)).unwrap();
        match cli.command {
            Command::Compare {
                mocks, endpoint, ..
            } => (mocks, endpoint),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_compare_clients() {
        let (mocks, endpoint) = compare_args(&[
            "--mock",
            "a:10",
            "--mock",
            "b:30",
            "--endpoint",
            "http://localhost:9999",
            "-m",
            "served-model",
        ]);
        let clients = compare_clients(&mocks, &endpoint).unwrap();

        let mut names: Vec<&String> = clients.keys().collect();
        names.sort();
        assert_eq!(names, vec!["a", "b", "served-model"]);
    }

    #[test]
    fn test_compare_clients_rejects_duplicate_mock() {
        let (mocks, endpoint) = compare_args(&["--mock", "a:10", "--mock", "a:50"]);
        let err = compare_clients(&mocks, &endpoint).err().unwrap();
        assert!(err.to_string().contains("Duplicate client name 'a'"));
    }

    #[test]
    fn test_compare_clients_rejects_endpoint_clash() {
        let (mocks, endpoint) = compare_args(&[
            "--mock",
            "served-model:10",
            "--endpoint",
            "http://localhost:9999",
            "-m",
            "served-model",
        ]);
        let err = compare_clients(&mocks, &endpoint).err().unwrap();
        assert!(err.to_string().contains("Duplicate client name 'served-model'"));
    }

    #[test]
    fn test_cli_load_test() {
        let cli =
            Cli::try_parse_from(["llm-bench", "load-test", "-r", "200", "-p", "ping"]).unwrap();
        match cli.command {
            Command::LoadTest {
                prompt, requests, ..
            } => {
                assert_eq!(prompt, "ping");
                assert_eq!(requests, 200);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_target_rejects_bad_error_rate() {
        let cli = Cli::try_parse_from(["llm-bench", "run", "--error-rate", "2.0"]).unwrap();
        if let Command::Run { target, .. } = cli.command {
            assert!(target.build().is_err());
        }
    }

    #[test]
    fn test_endpoint_target() {
        let cli = Cli::try_parse_from([
            "llm-bench",
            "run",
            "--endpoint",
            "http://localhost:9999",
            "-m",
            "served-model",
        ])
        .unwrap();
        if let Command::Run { target, .. } = cli.command {
            assert_eq!(target.build().unwrap().name(), "served-model");
        }
    }

    #[test]
    fn test_prompts_file() {
        let path = std::env::temp_dir().join(format!("llm-bench-prompts-{}.txt", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "first prompt\n\n  second prompt  \n").unwrap();
        drop(file);

        let args = PromptArgs {
            prompts: vec!["ignored".to_string()],
            prompts_file: Some(path.clone()),
        };
        assert_eq!(
            args.load().unwrap(),
            vec!["first prompt".to_string(), "second prompt".to_string()]
        );

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_prompts_file_missing() {
        let args = PromptArgs {
            prompts: Vec::new(),
            prompts_file: Some(PathBuf::from("/nonexistent/prompts.txt")),
        };
        assert!(args.load().is_err());
    }
}
