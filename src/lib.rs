// LLM endpoint bench - library root

pub mod config;
pub mod error;
pub mod executor;
pub mod metrics;
pub mod models;
pub mod report;
pub mod runner;

pub use config::{BenchConfig, CliArgs, EndpointConfig, LatencyRange, SettingNames};
pub use error::{BenchError, Result};
pub use executor::{LiveExecutor, MockExecutor, RequestExecutor};
pub use models::{RequestRecord, RunId, RunMode, RunSummary};
pub use report::{FileResultWriter, ResultWriter};
pub use runner::{BenchmarkRunner, RunOutcome};
