//! Per-host spacing of content fetches.

use dashmap::DashMap;
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// Keeps consecutive requests to the same blog at least `min_delay` apart.
pub struct RateLimiter {
    min_delay: Duration,
    last_request: DashMap<String, Instant>,
}

impl RateLimiter {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last_request: DashMap::new(),
        }
    }

    /// Sleep until `host` may be contacted again, then mark it as contacted.
    pub async fn wait(&self, host: &str) {
        if self.min_delay.is_zero() {
            return;
        }

        let pending = self
            .last_request
            .get(host)
            .map(|last| last.elapsed())
            .filter(|elapsed| *elapsed < self.min_delay)
            .map(|elapsed| self.min_delay - elapsed);

        if let Some(wait_time) = pending {
            tracing::debug!(host, wait_ms = wait_time.as_millis() as u64, "rate limited");
            sleep(wait_time).await;
        }

        self.last_request.insert(host.to_string(), Instant::now());
    }

    pub fn tracked_hosts(&self) -> usize {
        self.last_request.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_zero_delay_does_not_track() {
        let limiter = RateLimiter::new(Duration::ZERO);
        limiter.wait("example.com").await;
        assert_eq!(limiter.tracked_hosts(), 0);
    }

    #[tokio::test]
    async fn test_second_request_waits() {
        let limiter = RateLimiter::new(Duration::from_millis(50));
        let start = Instant::now();
        limiter.wait("example.com").await;
        limiter.wait("example.com").await;
        assert!(start.elapsed() >= Duration::from_millis(50));

        limiter.wait("other.com").await;
        assert_eq!(limiter.tracked_hosts(), 2);
    }
}
