//! Request executors: the component that turns one prompt into one latency measurement.
//!
//! - [`MockExecutor`] simulates endpoint latency without touching the network
//! - [`LiveExecutor`] issues a real chat-completion request

pub mod live;
pub mod mock;

use async_trait::async_trait;
use std::time::Duration;

use crate::config::{BenchConfig, EndpointConfig};
use crate::error::Result;
use crate::models::RunMode;

pub use live::LiveExecutor;
pub use mock::{DelaySource, MockExecutor, UniformDelay};

/// Produces one latency measurement per prompt
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    /// Mode recorded on every measurement this executor produces
    fn mode(&self) -> RunMode;

    /// Run one request for `prompt` and return its latency
    async fn execute(&self, prompt: &str) -> Result<Duration>;
}

/// Pick the executor for `mode`. Endpoint settings are only resolved for live runs.
pub fn for_mode(mode: RunMode, config: &BenchConfig) -> Result<Box<dyn RequestExecutor>> {
    for_mode_with(mode, config, |name| std::env::var(name).ok())
}

/// Like [`for_mode`], resolving live settings through `lookup`
pub fn for_mode_with<F>(
    mode: RunMode,
    config: &BenchConfig,
    lookup: F,
) -> Result<Box<dyn RequestExecutor>>
where
    F: Fn(&str) -> Option<String>,
{
    match mode {
        RunMode::Mock => {
            let executor = match config.mock_seed {
                Some(seed) => MockExecutor::seeded(config.mock_latency, seed),
                None => MockExecutor::new(config.mock_latency),
            };
            Ok(Box::new(executor))
        }
        RunMode::Live => {
            let endpoint = EndpointConfig::resolve(&config.setting_names, lookup)?;
            tracing::info!(endpoint = %endpoint.endpoint_url, model = %endpoint.model, "Resolved endpoint settings");
            Ok(Box::new(LiveExecutor::new(endpoint)?))
        }
    }
}
