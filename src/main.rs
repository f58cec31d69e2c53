use anyhow::{Context, Result};
use clap::Parser;

use llm_endpoint_bench::config::{BenchConfig, CliArgs};
use llm_endpoint_bench::executor;
use llm_endpoint_bench::models::RunMode;
use llm_endpoint_bench::report::{self, FileResultWriter};
use llm_endpoint_bench::runner::BenchmarkRunner;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let args = CliArgs::parse();

    // Initialize logging with the configured level
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.log_level.to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    println!("mock_mode={}", args.mock);

    let config = BenchConfig::from_args(&args).context("Invalid arguments")?;
    let mode = if args.mock { RunMode::Mock } else { RunMode::Live };

    // Endpoint settings are resolved here, before any request is attempted
    let executor = executor::for_mode(mode, &config)?;
    let writer = FileResultWriter::new(&config.requests_csv, &config.summary_json);

    let runner = BenchmarkRunner::new(config, executor.as_ref(), &writer);
    let outcome = runner.run().await?;

    report::print_summary(&outcome.summary);

    println!("\nmetrics written to:");
    println!("- {}", writer.requests_csv().display());
    println!("- {}", writer.summary_json().display());

    Ok(())
}
