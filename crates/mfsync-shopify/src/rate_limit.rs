//! Retry scheduling for Admin API calls.
//!
//! | Failure                         | Wait before retry                                   |
//! |---------------------------------|-----------------------------------------------------|
//! | 429 with `Retry-After`          | the hint                                            |
//! | 429 without a hint              | `rate_limit_fallback_ms × 2^attempt` ± 25 % jitter |
//! | 5xx, connect error, timeout     | `server_error_step_ms × (attempt + 1)`              |
//! | anything else (4xx, bad JSON)   | not retried                                         |
//!
//! Every wait is capped at 60 s and the total number of retries at
//! `max_retries`. The same request is replayed on each attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::ShopifyError;

const MAX_DELAY_MS: u64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    pub rate_limit_fallback_ms: u64,
    pub server_error_step_ms: u64,
}

impl RetryPolicy {
    /// Fail on the first error; used by tests that assert on raw statuses.
    #[must_use]
    pub const fn no_retries() -> Self {
        Self {
            max_retries: 0,
            rate_limit_fallback_ms: 0,
            server_error_step_ms: 0,
        }
    }

    /// Delay before retry number `attempt + 1`, or `None` if `err` is permanent.
    #[must_use]
    pub fn delay_for(&self, err: &ShopifyError, attempt: u32) -> Option<Duration> {
        let delay_ms = match err {
            ShopifyError::RateLimited {
                retry_after_ms: Some(hint),
                ..
            } => *hint,
            ShopifyError::RateLimited {
                retry_after_ms: None,
                ..
            } => with_jitter(
                self.rate_limit_fallback_ms
                    .saturating_mul(1u64 << attempt.min(10)),
            ),
            ShopifyError::ServerError { .. } => self.linear(attempt),
            ShopifyError::Http(e) if e.is_timeout() || e.is_connect() => self.linear(attempt),
            _ => return None,
        };
        Some(Duration::from_millis(delay_ms.min(MAX_DELAY_MS)))
    }

    fn linear(&self, attempt: u32) -> u64 {
        self.server_error_step_ms
            .saturating_mul(u64::from(attempt) + 1)
    }
}

fn with_jitter(ms: u64) -> u64 {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let jittered = (ms.min(MAX_DELAY_MS) as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
    jittered
}

/// Runs `operation`, replaying it per `policy` while it fails with a
/// retriable error. Returns the last error once retries are exhausted.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, ShopifyError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ShopifyError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= policy.max_retries {
                    return Err(err);
                }
                let Some(delay) = policy.delay_for(&err, attempt) else {
                    return Err(err);
                };
                tracing::warn!(
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "transient Shopify error, retrying after backoff"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
