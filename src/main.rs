use anyhow::Result;

use llm_bench::bench::{BenchmarkEngine, BenchmarkReport};
use llm_bench::config::{compare_clients, Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (for log level)
    let cli = Cli::load();

    // Initialize logging with a configured level
    let log_level = cli.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();

    let engine = BenchmarkEngine::new(cli.engine_config())?;
    tracing::info!(
        max_concurrency = engine.config().max_concurrency,
        probe_timeout_ms = engine.config().probe_timeout.map(|d| d.as_millis() as u64),
        "Benchmark engine ready"
    );

    let outcome = run_command(&engine, &cli).await;
    engine.shutdown();
    let report = outcome?;

    if cli.json {
        println!("{}", report.to_json());
    } else {
        report.print_table();
    }

    Ok(())
}

async fn run_command(engine: &BenchmarkEngine, cli: &Cli) -> Result<BenchmarkReport> {
    let max_concurrency = engine.config().max_concurrency;

    let report = match &cli.command {
        Command::Run {
            target,
            prompts,
            iterations,
        } => {
            let client = target.build()?;
            let prompts = prompts.load()?;
            let result = engine.run_benchmark(client, &prompts, *iterations).await?;
            BenchmarkReport::benchmark(max_concurrency, result)
        }

        Command::Compare {
            mocks,
            endpoint,
            prompts,
            iterations,
        } => {
            let clients = compare_clients(mocks, endpoint)?;

            let prompts = prompts.load()?;
            let comparison = engine
                .compare_benchmark(&clients, &prompts, *iterations)
                .await?;
            BenchmarkReport::comparison(max_concurrency, comparison)
        }

        Command::LoadTest {
            target,
            prompt,
            requests,
        } => {
            let client = target.build()?;
            let result = engine.run_load_test(client, prompt, *requests).await?;
            BenchmarkReport::load_test(max_concurrency, result)
        }
    };

    Ok(report)
}
