//! Network-free executor that simulates endpoint latency.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use super::RequestExecutor;
use crate::config::LatencyRange;
use crate::error::Result;
use crate::models::RunMode;

/// Strategy producing the simulated latency for the next request
pub trait DelaySource: Send + Sync {
    fn next_delay(&self) -> Duration;
}

impl<F> DelaySource for F
where
    F: Fn() -> Duration + Send + Sync,
{
    fn next_delay(&self) -> Duration {
        self()
    }
}

/// Samples uniformly from a closed latency interval
pub struct UniformDelay {
    range: LatencyRange,
    rng: Mutex<StdRng>,
}

impl UniformDelay {
    pub fn new(range: LatencyRange) -> Self {
        Self {
            range,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible sequence for a given seed
    pub fn seeded(range: LatencyRange, seed: u64) -> Self {
        Self {
            range,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl DelaySource for UniformDelay {
    fn next_delay(&self) -> Duration {
        let (min, max) = (self.range.min_secs(), self.range.max_secs());
        let secs = if min == max {
            min
        } else {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            rng.gen_range(min..=max)
        };
        Duration::from_secs_f64(secs)
    }
}

/// Executor that waits for a sampled latency and reports the sample
pub struct MockExecutor {
    delays: Box<dyn DelaySource>,
}

impl MockExecutor {
    /// Uniform sampling over `range` with an entropy-seeded generator
    pub fn new(range: LatencyRange) -> Self {
        Self::with_source(UniformDelay::new(range))
    }

    pub fn seeded(range: LatencyRange, seed: u64) -> Self {
        Self::with_source(UniformDelay::seeded(range, seed))
    }

    /// Use a custom delay strategy
    pub fn with_source(source: impl DelaySource + 'static) -> Self {
        Self {
            delays: Box::new(source),
        }
    }
}

#[async_trait]
impl RequestExecutor for MockExecutor {
    fn mode(&self) -> RunMode {
        RunMode::Mock
    }

    async fn execute(&self, prompt: &str) -> Result<Duration> {
        let delay = self.delays.next_delay();
        tracing::trace!(
            prompt_len = prompt.len(),
            delay_ms = delay.as_millis() as u64,
            "Simulating request"
        );

        tokio::time::sleep(delay).await;
        Ok(delay)
    }
}
