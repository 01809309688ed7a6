//! Per-user fixed-window rate limiting
//!
//! Guards the free-text analysis route, where every request costs a model
//! call. A window starts on a user's first request and resets wholesale
//! when it elapses; there is no sliding behavior.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

const WINDOW: Duration = Duration::from_secs(15 * 60);
const MAX_REQUESTS: u32 = 10;

/// User-facing message for a rejected request
pub const RATE_LIMIT_MESSAGE: &str =
    "Too many analysis requests. Please try again in a few minutes.";

struct Window {
    started_at: Instant,
    count: u32,
}

/// Fixed-window per-key rate limiter
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    windows: RwLock<HashMap<String, Window>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(WINDOW, MAX_REQUESTS)
    }
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            windows: RwLock::new(HashMap::new()),
        }
    }

    /// Record a request for `key`; returns whether it is allowed
    pub async fn allow(&self, key: &str) -> bool {
        let mut windows = self.windows.write().await;
        let now = Instant::now();

        // Drop every elapsed window so the map tracks active keys only
        let window_len = self.window;
        windows.retain(|_, w| now.duration_since(w.started_at) < window_len);

        let window = windows.entry(key.to_string()).or_insert(Window {
            started_at: now,
            count: 0,
        });

        if window.count >= self.max_requests {
            debug!(key, "rate limit exceeded");
            return false;
        }

        window.count += 1;
        true
    }

    #[cfg(test)]
    async fn tracked_keys(&self) -> usize {
        self.windows.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allows_up_to_the_window_budget() {
        let limiter = RateLimiter::default();
        for _ in 0..10 {
            assert!(limiter.allow("user-1").await);
        }
        assert!(!limiter.allow("user-1").await);
    }

    #[tokio::test]
    async fn keys_are_limited_independently() {
        let limiter = RateLimiter::new(WINDOW, 1);
        assert!(limiter.allow("user-1").await);
        assert!(!limiter.allow("user-1").await);
        assert!(limiter.allow("user-2").await);
    }

    #[tokio::test(start_paused = true)]
    async fn the_window_resets_after_it_elapses() {
        let limiter = RateLimiter::default();
        for _ in 0..10 {
            assert!(limiter.allow("user-1").await);
        }
        assert!(!limiter.allow("user-1").await);

        tokio::time::advance(Duration::from_secs(15 * 60)).await;
        assert!(limiter.allow("user-1").await);
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_windows_are_evicted() {
        let limiter = RateLimiter::default();
        assert!(limiter.allow("user-1").await);
        assert!(limiter.allow("user-2").await);
        assert_eq!(limiter.tracked_keys().await, 2);

        tokio::time::advance(Duration::from_secs(15 * 60)).await;
        assert!(limiter.allow("user-3").await);
        // The earlier windows have elapsed and are gone
        assert_eq!(limiter.tracked_keys().await, 1);
    }
}
