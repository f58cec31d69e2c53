//! Sequential benchmark runner.

use std::time::Instant;

use crate::config::BenchConfig;
use crate::error::{BenchError, Result};
use crate::executor::RequestExecutor;
use crate::metrics;
use crate::models::{RequestRecord, RunId, RunSummary};
use crate::report::ResultWriter;

/// Records and summary of a completed run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub records: Vec<RequestRecord>,
    pub summary: RunSummary,
}

/// Runs every prompt through one executor, strictly one at a time
pub struct BenchmarkRunner<'a> {
    config: BenchConfig,
    executor: &'a dyn RequestExecutor,
    writer: &'a dyn ResultWriter,
}

impl<'a> BenchmarkRunner<'a> {
    pub fn new(
        config: BenchConfig,
        executor: &'a dyn RequestExecutor,
        writer: &'a dyn ResultWriter,
    ) -> Self {
        Self {
            config,
            executor,
            writer,
        }
    }

    /// Execute the run, summarize it and hand both to the writer.
    ///
    /// The first failing request aborts the run: nothing is summarized or written.
    pub async fn run(&self) -> Result<RunOutcome> {
        let prompts = &self.config.prompts;
        if prompts.is_empty() {
            return Err(BenchError::EmptyPrompts);
        }

        let run_id = RunId::now();
        let mode = self.executor.mode();

        println!("\n--- running LLM endpoint tests ---");
        println!("Mode: {}\n", mode.to_string().to_uppercase());
        tracing::info!(run_id = %run_id, mode = %mode, prompts = prompts.len(), "Starting run");

        let start = Instant::now();
        let mut records = Vec::with_capacity(prompts.len());

        for (idx, prompt) in prompts.iter().enumerate() {
            let prompt_index = idx + 1;
            let latency = self.executor.execute(prompt).await.map_err(|e| {
                tracing::error!(prompt_index, "Request failed, aborting run: {}", e);
                e
            })?;

            records.push(RequestRecord::new(
                run_id.clone(),
                prompt_index,
                prompt.as_str(),
                latency,
                mode,
            ));
            println!("[{}] Latency: {:.3}s", prompt_index, latency.as_secs_f64());
        }

        let total_time = start.elapsed();
        let summary = metrics::summarize(&records, total_time)?;
        tracing::debug!(
            total_time_ms = total_time.as_millis() as u64,
            throughput_rps = summary.throughput_rps,
            "Run complete"
        );

        self.writer.write_all(&records, &summary)?;

        Ok(RunOutcome { records, summary })
    }
}
