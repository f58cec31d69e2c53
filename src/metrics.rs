//! Run-level aggregation over the per-request records.

use std::time::Duration;

use crate::error::{BenchError, Result};
use crate::models::{RequestRecord, RunSummary};

/// Round `value` to `decimals` decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Summarize a completed run.
///
/// Mean, min and max come from the record latencies, never from `total_time`.
/// Throughput is `records.len()` over the published (rounded) total time, so the
/// two reported figures agree. Latencies keep 4 decimals, throughput 2, and the
/// total time 6 so sub-millisecond runs stay positive.
pub fn summarize(records: &[RequestRecord], total_time: Duration) -> Result<RunSummary> {
    let first = records.first().ok_or(BenchError::EmptyRun)?;

    // A run that did real work cannot take zero time
    let total_secs = total_time.as_secs_f64();
    if total_secs <= 0.0 {
        return Err(BenchError::EmptyRun);
    }

    let latencies = records.iter().map(|r| r.latency_seconds);
    let sum: f64 = latencies.clone().sum();
    let min = latencies.clone().fold(f64::INFINITY, f64::min);
    let max = latencies.fold(f64::NEG_INFINITY, f64::max);
    let count = records.len();

    // Sub-microsecond runs still round to one microsecond
    let total_time_seconds = round_to(total_secs, 6).max(1e-6);

    Ok(RunSummary {
        run_id: first.run_id.clone(),
        mode: first.mode,
        total_requests: count,
        total_time_seconds,
        average_latency_seconds: round_to(sum / count as f64, 4),
        min_latency_seconds: min,
        max_latency_seconds: max,
        throughput_rps: round_to(count as f64 / total_time_seconds, 2),
    })
}
