// Integration tests for the endpoint bench
//
// These tests drive the full pipeline: executor selection, sequential run,
// aggregation and both output files.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use llm_endpoint_bench::{
    executor,
    report::parse_requests_csv,
    BenchConfig, BenchError, BenchmarkRunner, EndpointConfig, FileResultWriter, LatencyRange,
    LiveExecutor, MockExecutor, RequestExecutor, RunMode, RunSummary, SettingNames,
};

// ==================================================================================================
// Test Helpers
// ==================================================================================================

/// Output paths in the temp dir, removed on drop
struct TempOutputs {
    requests_csv: PathBuf,
    summary_json: PathBuf,
}

impl TempOutputs {
    fn new() -> Self {
        let dir = std::env::temp_dir();
        let id = uuid::Uuid::new_v4();
        Self {
            requests_csv: dir.join(format!("bench-requests-{}.csv", id)),
            summary_json: dir.join(format!("bench-summary-{}.json", id)),
        }
    }

    fn writer(&self) -> FileResultWriter {
        FileResultWriter::new(&self.requests_csv, &self.summary_json)
    }

    fn config(&self, prompts: &[&str]) -> BenchConfig {
        BenchConfig {
            prompts: prompts.iter().map(|p| p.to_string()).collect(),
            requests_csv: self.requests_csv.clone(),
            summary_json: self.summary_json.clone(),
            ..Default::default()
        }
    }

    fn read_summary(&self) -> RunSummary {
        let text = std::fs::read_to_string(&self.summary_json).unwrap();
        serde_json::from_str(&text).unwrap()
    }
}

impl Drop for TempOutputs {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.requests_csv);
        let _ = std::fs::remove_file(&self.summary_json);
    }
}

/// Deterministic executor returning fixed latencies and counting calls
struct ScriptedExecutor {
    latencies_ms: Vec<u64>,
    fail_on_call: Option<usize>,
    calls: AtomicUsize,
}

impl ScriptedExecutor {
    fn new(latencies_ms: Vec<u64>) -> Self {
        Self {
            latencies_ms,
            fail_on_call: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn failing_on(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RequestExecutor for ScriptedExecutor {
    fn mode(&self) -> RunMode {
        RunMode::Live
    }

    async fn execute(&self, _prompt: &str) -> llm_endpoint_bench::Result<Duration> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_call == Some(call) {
            return Err(BenchError::Status {
                status: 500,
                body: "scripted failure".to_string(),
            });
        }
        let ms = self.latencies_ms[(call - 1) % self.latencies_ms.len()];
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok(Duration::from_millis(ms))
    }
}

fn unset_setting_names() -> SettingNames {
    let suffix = uuid::Uuid::new_v4().simple().to_string().to_uppercase();
    SettingNames {
        endpoint_url: format!("BENCH_IT_URL_{}", suffix),
        api_key: format!("BENCH_IT_KEY_{}", suffix),
        model: format!("BENCH_IT_MODEL_{}", suffix),
    }
}

// ==================================================================================================
// Mock Mode Tests
// ==================================================================================================

#[tokio::test]
async fn test_zero_latency_mock_run_writes_both_outputs() {
    let outputs = TempOutputs::new();
    let config = outputs.config(&["2+2", "capital of France?"]);
    let executor = MockExecutor::new(LatencyRange::fixed(0.0).unwrap());
    let writer = outputs.writer();

    let outcome = BenchmarkRunner::new(config, &executor, &writer)
        .run()
        .await
        .unwrap();

    let summary = outputs.read_summary();
    assert_eq!(summary, outcome.summary);
    assert_eq!(summary.total_requests, 2);
    assert_eq!(summary.mode, RunMode::Mock);
    assert_eq!(summary.average_latency_seconds, 0.0);
    assert_eq!(summary.min_latency_seconds, 0.0);
    assert_eq!(summary.max_latency_seconds, 0.0);
    assert!(summary.total_time_seconds > 0.0);
    assert!(summary.throughput_rps.is_finite() && summary.throughput_rps > 0.0);
    let expected_rps = summary.total_requests as f64 / summary.total_time_seconds;
    assert!((summary.throughput_rps - expected_rps).abs() <= 1e-2);

    let csv = std::fs::read_to_string(&outputs.requests_csv).unwrap();
    assert!(csv.starts_with("run_id,prompt_id,prompt,latency_seconds,timestamp_utc,mode\n"));
    let parsed = parse_requests_csv(&csv).unwrap();
    assert_eq!(parsed, outcome.records);
}

#[tokio::test]
async fn test_single_prompt_default_interval() {
    let outputs = TempOutputs::new();
    let config = outputs.config(&["a"]);
    let executor = MockExecutor::new(config.mock_latency);
    let writer = outputs.writer();

    let outcome = BenchmarkRunner::new(config, &executor, &writer)
        .run()
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 1);
    let record = &outcome.records[0];
    assert_eq!(record.prompt_index, 1);
    assert_eq!(record.mode.to_string(), "mock");
    assert!(record.latency_seconds >= 0.3 && record.latency_seconds <= 1.2);
    assert!(outcome.summary.total_time_seconds >= record.latency_seconds);
}

#[tokio::test]
async fn test_seeded_mock_latencies_stay_in_interval() {
    let outputs = TempOutputs::new();
    let prompts: Vec<String> = (1..=12).map(|i| format!("prompt {}", i)).collect();
    let prompt_refs: Vec<&str> = prompts.iter().map(|p| p.as_str()).collect();
    let config = outputs.config(&prompt_refs);
    let range = LatencyRange::new(0.002, 0.008).unwrap();
    let executor = MockExecutor::seeded(range, 1234);
    let writer = outputs.writer();

    let outcome = BenchmarkRunner::new(config, &executor, &writer)
        .run()
        .await
        .unwrap();

    assert_eq!(outcome.summary.total_requests, 12);
    assert!(outcome
        .records
        .iter()
        .all(|r| range.contains(r.latency_seconds)));

    let mean: f64 =
        outcome.records.iter().map(|r| r.latency_seconds).sum::<f64>() / 12.0;
    assert!((outcome.summary.average_latency_seconds - mean).abs() <= 1e-4);

    let expected_rps =
        outcome.summary.total_requests as f64 / outcome.summary.total_time_seconds;
    assert!((outcome.summary.throughput_rps - expected_rps).abs() <= 1e-2);
}

#[tokio::test]
async fn test_mock_run_overwrites_previous_outputs() {
    let outputs = TempOutputs::new();
    let executor = MockExecutor::new(LatencyRange::fixed(0.0).unwrap());
    let writer = outputs.writer();

    BenchmarkRunner::new(outputs.config(&["a", "b", "c"]), &executor, &writer)
        .run()
        .await
        .unwrap();
    let second = BenchmarkRunner::new(outputs.config(&["only"]), &executor, &writer)
        .run()
        .await
        .unwrap();

    let csv = std::fs::read_to_string(&outputs.requests_csv).unwrap();
    assert_eq!(parse_requests_csv(&csv).unwrap(), second.records);
    assert_eq!(outputs.read_summary().total_requests, 1);
}

// ==================================================================================================
// Executor Call Accounting
// ==================================================================================================

#[tokio::test]
async fn test_executor_called_once_per_prompt() {
    let outputs = TempOutputs::new();
    let executor = ScriptedExecutor::new(vec![3, 1, 2]);
    let writer = outputs.writer();

    let outcome = BenchmarkRunner::new(outputs.config(&["x", "y", "z"]), &executor, &writer)
        .run()
        .await
        .unwrap();

    assert_eq!(executor.calls(), 3);
    let latencies: Vec<f64> = outcome.records.iter().map(|r| r.latency_seconds).collect();
    assert_eq!(latencies, vec![0.003, 0.001, 0.002]);
    assert_eq!(outcome.summary.min_latency_seconds, 0.001);
    assert_eq!(outcome.summary.max_latency_seconds, 0.003);
}

#[tokio::test]
async fn test_failure_mid_run_aborts_without_output() {
    let outputs = TempOutputs::new();
    let executor = ScriptedExecutor::new(vec![1]).failing_on(2);
    let writer = outputs.writer();

    let err = BenchmarkRunner::new(outputs.config(&["x", "y", "z"]), &executor, &writer)
        .run()
        .await
        .unwrap_err();

    assert!(err.is_execution_error());
    assert_eq!(executor.calls(), 2);
    assert!(!outputs.requests_csv.exists());
    assert!(!outputs.summary_json.exists());
}

// ==================================================================================================
// Live Mode Tests
// ==================================================================================================

#[tokio::test]
async fn test_live_missing_settings_makes_no_calls() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", mockito::Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    // Only the endpoint URL resolves, and it points at the server above
    let names = unset_setting_names();
    let url_name = names.endpoint_url.clone();
    let url = server.url();
    let config = BenchConfig {
        setting_names: names.clone(),
        ..Default::default()
    };

    let err = match executor::for_mode_with(RunMode::Live, &config, |name| {
        (name == url_name).then(|| url.clone())
    }) {
        Err(e) => e,
        Ok(_) => panic!("live executor built without settings"),
    };

    assert!(err.is_configuration_error());
    match &err {
        BenchError::Configuration { missing } => {
            assert_eq!(missing, &vec![names.api_key.clone(), names.model.clone()]);
        }
        other => panic!("unexpected error: {other}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_live_resolved_settings_reach_endpoint() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_header("authorization", "Bearer sk-resolved")
        .with_status(200)
        .with_body("{}")
        .expect(2)
        .create_async()
        .await;

    let names = unset_setting_names();
    let settings = [
        (names.endpoint_url.clone(), server.url()),
        (names.api_key.clone(), "sk-resolved".to_string()),
        (names.model.clone(), "test-model".to_string()),
    ];
    let outputs = TempOutputs::new();
    let config = BenchConfig {
        setting_names: names,
        ..outputs.config(&["a", "b"])
    };

    let executor = executor::for_mode_with(RunMode::Live, &config, |name| {
        settings
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    })
    .unwrap();
    let writer = outputs.writer();

    let outcome = BenchmarkRunner::new(config, executor.as_ref(), &writer)
        .run()
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(outcome.summary.mode, RunMode::Live);
    assert_eq!(outcome.summary.total_requests, 2);
}

#[tokio::test]
async fn test_live_run_against_endpoint() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer sk-integration")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"4"}}]}"#)
        .expect(3)
        .create_async()
        .await;

    let outputs = TempOutputs::new();
    let executor = LiveExecutor::new(EndpointConfig {
        endpoint_url: format!("{}/v1/chat/completions", server.url()),
        api_key: "sk-integration".to_string(),
        model: "test-model".to_string(),
    })
    .unwrap();
    let writer = outputs.writer();

    let outcome = BenchmarkRunner::new(outputs.config(&["1", "2", "3"]), &executor, &writer)
        .run()
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(outcome.summary.mode, RunMode::Live);
    assert_eq!(outcome.summary.total_requests, 3);
    assert!(outcome.records.iter().all(|r| r.mode == RunMode::Live));
    assert_eq!(outputs.read_summary(), outcome.summary);
}

#[tokio::test]
async fn test_live_error_on_first_request_aborts_run() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(500)
        .with_body("internal error")
        .expect(1)
        .create_async()
        .await;

    let outputs = TempOutputs::new();
    let executor = LiveExecutor::new(EndpointConfig {
        endpoint_url: server.url(),
        api_key: "sk-integration".to_string(),
        model: "test-model".to_string(),
    })
    .unwrap();
    let writer = outputs.writer();

    let err = BenchmarkRunner::new(outputs.config(&["a", "b", "c"]), &executor, &writer)
        .run()
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, BenchError::Status { status: 500, .. }));
    assert!(!outputs.requests_csv.exists());
    assert!(!outputs.summary_json.exists());
}
