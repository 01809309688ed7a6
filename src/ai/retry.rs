//! Exponential backoff retry for remote calls
//!
//! Wraps an async operation and retries transient failures (rate limit,
//! service unavailable, connection reset, timeout) with a pure exponential
//! delay. Non-transient failures propagate immediately; after the attempt
//! budget is exhausted the last error is surfaced.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use crate::types::{AtriumError, Result};

/// Retry attempt and delay configuration
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(2000),
        }
    }
}

/// Run `op`, retrying transient failures with exponential backoff.
///
/// The delay before attempt k (0-indexed) is `base_delay * 2^(k-1)`:
/// 2s, then 4s with the defaults. No jitter; attempts never overlap.
pub async fn retry_with_backoff<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error: Option<AtriumError> = None;

    for attempt in 0..policy.max_attempts {
        if attempt > 0 {
            let delay = policy.base_delay * 2u32.pow(attempt - 1);
            warn!(
                attempt = attempt + 1,
                max_attempts = policy.max_attempts,
                delay_ms = delay.as_millis() as u64,
                "retrying remote call after transient failure"
            );
            sleep(delay).await;
        }

        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                let final_attempt = attempt + 1 == policy.max_attempts;
                if !e.is_transient() || final_attempt {
                    return Err(e);
                }
                last_error = Some(e);
            }
        }
    }

    // Unreachable with max_attempts >= 1; kept for a zero-attempt policy.
    Err(last_error.unwrap_or(AtriumError::EmptyResponse))
}
