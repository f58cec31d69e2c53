use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LATENCY_DECIMALS;
use crate::metrics::round_to;

// ==================================================================================================
// Run identity and mode
// ==================================================================================================

/// Identifier shared by every record and the summary of one run.
///
/// Derived from the UTC instant the run started, formatted as RFC 3339.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Create an identifier from the current UTC instant
    pub fn now() -> Self {
        Self::from_instant(Utc::now())
    }

    pub fn from_instant(instant: DateTime<Utc>) -> Self {
        Self(instant.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RunId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which executor produced the measurements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Mock,
    Live,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunMode::Mock => write!(f, "mock"),
            RunMode::Live => write!(f, "live"),
        }
    }
}

impl std::str::FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mock" => Ok(RunMode::Mock),
            // Request logs from the older script call live mode "real"
            "live" | "real" => Ok(RunMode::Live),
            _ => Err(format!("Unknown run mode: {}", s)),
        }
    }
}

// ==================================================================================================
// Per-request record
// ==================================================================================================

/// One measured request. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub run_id: RunId,
    /// 1-based position of the prompt in the run
    pub prompt_index: usize,
    pub prompt: String,
    /// Seconds, rounded to 4 decimals
    pub latency_seconds: f64,
    pub timestamp_utc: DateTime<Utc>,
    pub mode: RunMode,
}

impl RequestRecord {
    /// Build a record stamped with the current UTC instant
    pub fn new(
        run_id: RunId,
        prompt_index: usize,
        prompt: impl Into<String>,
        latency: Duration,
        mode: RunMode,
    ) -> Self {
        Self {
            run_id,
            prompt_index,
            prompt: prompt.into(),
            latency_seconds: round_to(latency.as_secs_f64(), LATENCY_DECIMALS),
            timestamp_utc: Utc::now(),
            mode,
        }
    }
}

// ==================================================================================================
// Run summary
// ==================================================================================================

/// Aggregate metrics for one run. Field order is the key order of the JSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: RunId,
    pub mode: RunMode,
    pub total_requests: usize,
    pub total_time_seconds: f64,
    pub average_latency_seconds: f64,
    pub min_latency_seconds: f64,
    pub max_latency_seconds: f64,
    pub throughput_rps: f64,
}
