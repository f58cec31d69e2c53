//! Executor that calls a real OpenAI-compatible chat-completions endpoint.

use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};

use super::RequestExecutor;
use crate::config::{EndpointConfig, LIVE_REQUEST_TIMEOUT};
use crate::error::{BenchError, Result};
use crate::models::openai::ChatCompletionRequest;
use crate::models::RunMode;

/// Longest error body kept in a status error
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Live chat-completion executor with a fixed per-request timeout
pub struct LiveExecutor {
    client: Client,
    config: EndpointConfig,
    timeout: Duration,
}

impl LiveExecutor {
    /// Create an executor using the standard 30 second timeout
    pub fn new(config: EndpointConfig) -> Result<Self> {
        Self::with_timeout(config, LIVE_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(config: EndpointConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BenchError::Execution(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            timeout,
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> BenchError {
        if err.is_timeout() {
            BenchError::Timeout {
                timeout: self.timeout,
            }
        } else {
            BenchError::Execution(err.to_string())
        }
    }
}

#[async_trait]
impl RequestExecutor for LiveExecutor {
    fn mode(&self) -> RunMode {
        RunMode::Live
    }

    /// POST `prompt` and time the round trip.
    ///
    /// The measured latency starts when the built request is sent and ends once
    /// the full response body has been downloaded. Building the request is not
    /// timed. Non-2xx statuses and timeouts are errors.
    async fn execute(&self, prompt: &str) -> Result<Duration> {
        let body = ChatCompletionRequest::single_prompt(&self.config.model, prompt);
        let request = self
            .client
            .post(&self.config.endpoint_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&body)
            .build()
            .map_err(|e| BenchError::Execution(format!("Failed to build request: {}", e)))?;

        let start = Instant::now();
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let payload = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;
        let latency = start.elapsed();

        if !status.is_success() {
            let body: String = String::from_utf8_lossy(&payload)
                .chars()
                .take(MAX_ERROR_BODY_CHARS)
                .collect();
            tracing::error!(status = status.as_u16(), "Endpoint returned error: {}", body);
            return Err(BenchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(
            status = status.as_u16(),
            bytes = payload.len(),
            latency_ms = latency.as_millis() as u64,
            "Request completed"
        );

        Ok(latency)
    }
}
