use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{BenchError, Result};
use crate::metrics::round_to;

/// Prompts used when none are given on the command line
pub const DEFAULT_PROMPTS: [&str; 4] = [
    "explain MLOps in simple terms.",
    "what are challenges in deploying LLMs?",
    "explain latency vs throughput.",
    "give an example of prompt inconsistency.",
];

pub const DEFAULT_REQUESTS_CSV: &str = "metrics_requests.csv";
pub const DEFAULT_SUMMARY_JSON: &str = "metrics_summary.json";

/// Per-request timeout for live calls
pub const LIVE_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// LLM endpoint latency and throughput tester
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Simulate endpoint latency instead of calling a real endpoint
    #[arg(long, env = "BENCH_MOCK")]
    pub mock: bool,

    /// Prompt to send (repeatable, replaces the built-in prompt list)
    #[arg(short, long = "prompt", value_name = "TEXT")]
    pub prompts: Vec<String>,

    /// Where to write the per-request CSV log
    #[arg(long, env = "BENCH_REQUESTS_CSV", default_value = DEFAULT_REQUESTS_CSV)]
    pub requests_csv: PathBuf,

    /// Where to write the run summary JSON
    #[arg(long, env = "BENCH_SUMMARY_JSON", default_value = DEFAULT_SUMMARY_JSON)]
    pub summary_json: PathBuf,

    /// Lower bound of simulated latency in seconds (mock mode)
    #[arg(long, env = "BENCH_MIN_LATENCY", default_value = "0.3")]
    pub min_latency: f64,

    /// Upper bound of simulated latency in seconds (mock mode)
    #[arg(long, env = "BENCH_MAX_LATENCY", default_value = "1.2")]
    pub max_latency: f64,

    /// Seed for reproducible simulated latencies (mock mode)
    #[arg(long, env = "BENCH_SEED")]
    pub seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: String,
}

// ==================================================================================================
// Mock latency interval
// ==================================================================================================

/// Closed interval `[min_secs, max_secs]` simulated latencies are drawn from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyRange {
    min_secs: f64,
    max_secs: f64,
}

/// Resolution of recorded latencies, in decimal places
pub const LATENCY_DECIMALS: i32 = 4;

impl LatencyRange {
    /// Bounds must be representable as a `Duration` and lie on the
    /// 4-decimal grid latencies are recorded with, so a rounded sample
    /// never leaves the interval.
    pub fn new(min_secs: f64, max_secs: f64) -> Result<Self> {
        let valid = [min_secs, max_secs]
            .iter()
            .all(|&secs| Duration::try_from_secs_f64(secs).is_ok() && on_latency_grid(secs))
            && min_secs <= max_secs;
        if !valid {
            return Err(BenchError::InvalidLatencyRange {
                min: min_secs,
                max: max_secs,
            });
        }
        Ok(Self {
            min_secs: round_to(min_secs, LATENCY_DECIMALS),
            max_secs: round_to(max_secs, LATENCY_DECIMALS),
        })
    }

    /// Degenerate interval that always yields `secs`
    pub fn fixed(secs: f64) -> Result<Self> {
        Self::new(secs, secs)
    }

    pub fn min_secs(&self) -> f64 {
        self.min_secs
    }

    pub fn max_secs(&self) -> f64 {
        self.max_secs
    }

    pub fn contains(&self, secs: f64) -> bool {
        secs >= self.min_secs && secs <= self.max_secs
    }
}

fn on_latency_grid(secs: f64) -> bool {
    (round_to(secs, LATENCY_DECIMALS) - secs).abs() <= 1e-9 * secs.max(1.0)
}

impl Default for LatencyRange {
    fn default() -> Self {
        Self {
            min_secs: 0.3,
            max_secs: 1.2,
        }
    }
}

// ==================================================================================================
// Endpoint settings (live mode only)
// ==================================================================================================

/// Environment variable names the endpoint settings are read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingNames {
    pub endpoint_url: String,
    pub api_key: String,
    pub model: String,
}

impl Default for SettingNames {
    fn default() -> Self {
        Self {
            endpoint_url: "LLM_ENDPOINT_URL".to_string(),
            api_key: "LLM_API_KEY".to_string(),
            model: "LLM_MODEL_NAME".to_string(),
        }
    }
}

/// Resolved connection parameters for a live run
#[derive(Clone)]
pub struct EndpointConfig {
    pub endpoint_url: String,
    pub api_key: String,
    pub model: String,
}

impl std::fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("endpoint_url", &self.endpoint_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .finish()
    }
}

impl EndpointConfig {
    /// Resolve through `lookup`, reporting every missing or blank setting at once
    pub fn resolve<F>(names: &SettingNames, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut fetch = |name: &str| match lookup(name) {
            Some(value) if !value.trim().is_empty() => value,
            _ => {
                missing.push(name.to_string());
                String::new()
            }
        };

        let endpoint_url = fetch(&names.endpoint_url);
        let api_key = fetch(&names.api_key);
        let model = fetch(&names.model);

        if !missing.is_empty() {
            return Err(BenchError::Configuration { missing });
        }

        Ok(Self {
            endpoint_url,
            api_key,
            model,
        })
    }
}

// ==================================================================================================
// Run configuration
// ==================================================================================================

/// Everything a run needs besides the executor
#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub prompts: Vec<String>,
    pub requests_csv: PathBuf,
    pub summary_json: PathBuf,
    pub mock_latency: LatencyRange,
    pub mock_seed: Option<u64>,
    pub setting_names: SettingNames,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            prompts: DEFAULT_PROMPTS.iter().map(|p| p.to_string()).collect(),
            requests_csv: PathBuf::from(DEFAULT_REQUESTS_CSV),
            summary_json: PathBuf::from(DEFAULT_SUMMARY_JSON),
            mock_latency: LatencyRange::default(),
            mock_seed: None,
            setting_names: SettingNames::default(),
        }
    }
}

impl BenchConfig {
    /// Build from parsed command-line arguments
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let prompts = if args.prompts.is_empty() {
            DEFAULT_PROMPTS.iter().map(|p| p.to_string()).collect()
        } else {
            args.prompts.clone()
        };

        Ok(Self {
            prompts,
            requests_csv: args.requests_csv.clone(),
            summary_json: args.summary_json.clone(),
            mock_latency: LatencyRange::new(args.min_latency, args.max_latency)?,
            mock_seed: args.seed,
            setting_names: SettingNames::default(),
        })
    }
}
