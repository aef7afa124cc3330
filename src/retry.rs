//! Retry policy shared by the provider clients
//!
//! Each client decides which of its errors are worth another attempt and with
//! which backoff shape; the loop, attempt accounting and sleeping live here.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Delay shape between two attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `base_delay * 2^attempt`
    Exponential,
    /// `base_delay` every time
    Fixed,
}

/// Attempt budget and base delay for a retried operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy; at least one attempt is always made
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay to wait after the zero-based `attempt` failed
    pub fn delay(&self, backoff: Backoff, attempt: u32) -> Duration {
        match backoff {
            Backoff::Exponential => self
                .base_delay
                .saturating_mul(2u32.saturating_pow(attempt)),
            Backoff::Fixed => self.base_delay,
        }
    }

    /// Runs `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent
    ///
    /// `op` receives the zero-based attempt number. `classify` returns the
    /// backoff to apply for a retryable error, or `None` to stop immediately.
    /// The last error is returned unchanged.
    pub async fn run<T, E, Op, Fut, Classify>(
        &self,
        label: &str,
        mut op: Op,
        classify: Classify,
    ) -> Result<T, E>
    where
        Op: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        Classify: Fn(&E) -> Option<Backoff>,
        E: Display,
    {
        let mut attempt = 0;
        loop {
            let err = match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let Some(backoff) = classify(&err) else {
                tracing::debug!(label, attempt = attempt + 1, error = %err, "not retryable");
                return Err(err);
            };

            if attempt + 1 >= self.max_attempts {
                tracing::warn!(
                    label,
                    attempts = self.max_attempts,
                    error = %err,
                    "retries exhausted"
                );
                return Err(err);
            }

            let delay = self.delay(backoff, attempt);
            tracing::warn!(
                label,
                attempt = attempt + 1,
                max_attempts = self.max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "attempt failed, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
