//! Bounded retry with exponential backoff for idempotent admin reads.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use super::UpstreamError;

#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(2),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that runs the operation exactly once.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error, or the
    /// attempts are exhausted. Only use this for reads.
    ///
    /// # Errors
    /// Returns the last error produced by `operation`.
    pub async fn run<F, Fut, T>(&self, mut operation: F) -> Result<T, UpstreamError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut backoff = self.initial_backoff;
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() || attempt >= max_attempts => return Err(e),
                Err(e) => {
                    warn!(attempt, max_attempts, error = %e, "retrying admin read");

                    // 75%..125% of the nominal backoff
                    let jitter = rand::thread_rng().gen_range(0.75..1.25);
                    tokio::time::sleep(backoff.mul_f64(jitter)).await;

                    backoff = backoff.mul_f64(self.multiplier).min(self.max_backoff);
                    attempt += 1;
                }
            }
        }
    }
}
