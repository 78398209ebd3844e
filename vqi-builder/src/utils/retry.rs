//! Fetch Retry Logic
//!
//! Retries transient fetch failures (network, 429, 5xx) with exponential
//! backoff. Permanent failures (auth, 404, bad payload) return immediately.

use crate::error::FetchError;
use std::time::{Duration, Instant};

/// Attempt budget and backoff curve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (total attempts = retries + 1)
    pub retries: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Ceiling for any single delay, including server-requested ones
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            initial_backoff: Duration::from_millis(800),
            max_backoff: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Policy with `retries` and default backoff curve
    pub fn with_retries(retries: u32) -> Self {
        Self {
            retries,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based), doubling and capped
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Retry an async fetch until it succeeds, fails permanently, or runs out of
/// attempts.
///
/// **Algorithm:**
/// 1. Attempt operation
/// 2. If successful, return result
/// 3. If the error is transient and attempts remain: log WARN, back off, retry
/// 4. Otherwise return the last error
///
/// A `Retry-After` hint on 429 replaces the computed delay, still capped at
/// `max_backoff`. No delay follows the final attempt.
pub async fn retry_with_backoff<F, Fut, T>(
    operation_name: &str,
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, FetchError>>,
{
    let start_time = Instant::now();
    let max_attempts = policy.retries.saturating_add(1);
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        if attempt > 1 {
            tracing::debug!(operation = operation_name, attempt, "Retrying fetch");
        }

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis(),
                        "Fetch succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) => {
                if !err.is_transient() {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        error = %err,
                        "Permanent fetch error, not retrying"
                    );
                    return Err(err);
                }

                if attempt >= max_attempts {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis(),
                        error = %err,
                        "Fetch failed: retries exhausted"
                    );
                    return Err(err);
                }

                let backoff = err
                    .retry_after()
                    .unwrap_or_else(|| policy.backoff_for(attempt))
                    .min(policy.max_backoff);

                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    backoff_ms = backoff.as_millis(),
                    error = %err,
                    "Transient fetch error, will retry after backoff"
                );

                tokio::time::sleep(backoff).await;
            }
        }
    }
}
