//! Retry with exponential backoff for transient geocoding failures.
//!
//! Every provider call made by [`crate::Geocoder`] goes through
//! [`with_retry`]. Only errors for which
//! [`GeocodeError::is_transient`](crate::GeocodeError::is_transient) holds
//! (timeouts, unreachable host, HTTP 429 and 5xx) are retried; anything
//! else ends the loop immediately.

use std::future::Future;
use std::time::Duration;

use crate::GeocodeError;

/// Attempt budget and backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay before the first retry; doubled for each later retry.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// 3 attempts, waiting 2s then 4s, never more than 8s.
    pub const DEFAULT: Self = Self {
        max_attempts: 3,
        base_delay: Duration::from_secs(2),
        max_delay: Duration::from_secs(8),
    };

    /// Delay before retry number `retry` (1-based): `base * 2^(retry - 1)`,
    /// capped at `max_delay`.
    #[must_use]
    pub fn delay_before(&self, retry: u32) -> Duration {
        let factor = 1u32
            .checked_shl(retry.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Runs `op` until it succeeds, fails permanently, or the attempt budget
/// is spent.
///
/// `op` is called once per attempt, so it must build a fresh request each
/// time.
///
/// # Errors
///
/// Returns the last [`GeocodeError`] when the error is permanent or the
/// budget is exhausted.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, GeocodeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GeocodeError>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < attempts => {
                let delay = policy.delay_before(attempt);
                log::warn!(
                    "  transient geocoding error: {e}; retry {attempt}/{} in {delay:?}...",
                    attempts - 1
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                if e.is_transient() {
                    log::error!("Geocoding gave up after {attempts} attempts: {e}");
                }
                return Err(e);
            }
        }
    }
}
