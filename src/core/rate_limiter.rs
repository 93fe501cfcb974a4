//! Sliding-window rate limiter for outbound provider calls

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::core::models::RequestStats;

/// Admission timestamps in a ring bounded by the ceiling.
#[derive(Debug)]
struct RateWindow {
    admissions: VecDeque<Instant>,
    window: Duration,
    max_requests: usize,
}

impl RateWindow {
    fn purge(&mut self, now: Instant) {
        while let Some(oldest) = self.admissions.front() {
            if now.duration_since(*oldest) >= self.window {
                self.admissions.pop_front();
            } else {
                break;
            }
        }
    }

    fn has_capacity(&self) -> bool {
        self.admissions.len() < self.max_requests
    }

    fn push(&mut self, now: Instant) {
        if !self.has_capacity() {
            // Overwrite the oldest slot; capacity never grows past the ceiling.
            warn!("Admission recorded on a full rate window");
            self.admissions.pop_front();
        }
        self.admissions.push_back(now);
    }
}

/// Global limiter shared by every request
#[derive(Debug, Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<RateWindow>>,
    window: Duration,
    max_requests: usize,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RateWindow {
                admissions: VecDeque::with_capacity(max_requests),
                window,
                max_requests,
            })),
            window,
            max_requests,
        }
    }

    /// Whether one more call would fit in the window right now
    pub async fn admit(&self) -> bool {
        let mut state = self.inner.lock().await;
        state.purge(Instant::now());
        state.has_capacity()
    }

    /// Count one call against the window
    pub async fn record_admission(&self) {
        let now = Instant::now();
        let mut state = self.inner.lock().await;
        state.purge(now);
        state.push(now);
    }

    /// Check and record under one lock, so two requests can never share
    /// the last free slot.
    pub async fn try_admit(&self) -> bool {
        let now = Instant::now();
        let mut state = self.inner.lock().await;
        state.purge(now);
        if !state.has_capacity() {
            debug!("Admission denied: {} calls in window", state.admissions.len());
            return false;
        }
        state.admissions.push_back(now);
        true
    }

    /// Time until the oldest admission leaves the window
    pub async fn retry_after(&self) -> Duration {
        let now = Instant::now();
        let mut state = self.inner.lock().await;
        state.purge(now);
        if state.has_capacity() {
            return Duration::ZERO;
        }
        state
            .admissions
            .front()
            .map(|oldest| self.window.saturating_sub(now.duration_since(*oldest)))
            .unwrap_or(Duration::ZERO)
    }

    pub async fn stats(&self) -> RequestStats {
        let mut state = self.inner.lock().await;
        state.purge(Instant::now());
        RequestStats {
            total_requests_in_window: state.admissions.len(),
            max_requests: self.max_requests,
            window_secs: self.window.as_secs(),
            is_rate_limited: !state.has_capacity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_ceiling_then_window_elapses() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 3);

        for _ in 0..3 {
            assert!(limiter.try_admit().await);
        }
        assert!(!limiter.try_admit().await);
        assert!(!limiter.admit().await);

        let stats = limiter.stats().await;
        assert_eq!(stats.total_requests_in_window, 3);
        assert!(stats.is_rate_limited);

        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(limiter.admit().await);
        assert!(limiter.try_admit().await);
        assert_eq!(limiter.stats().await.total_requests_in_window, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_slides() {
        let limiter = RateLimiter::new(Duration::from_secs(10), 2);
        assert!(limiter.try_admit().await);
        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(limiter.try_admit().await);
        assert!(!limiter.try_admit().await);

        assert_eq!(limiter.retry_after().await, Duration::from_secs(4));

        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(limiter.try_admit().await);
        assert!(!limiter.try_admit().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_admit_and_record_separately() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 1);
        assert!(limiter.admit().await);
        limiter.record_admission().await;
        assert!(!limiter.admit().await);

        // A forced record never grows the window past its ceiling.
        limiter.record_admission().await;
        assert_eq!(limiter.stats().await.total_requests_in_window, 1);
    }

    #[tokio::test]
    async fn test_concurrent_admissions_respect_ceiling() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 10);

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.try_admit().await })
            })
            .collect();

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }

        assert_eq!(admitted, 10);
        assert_eq!(limiter.stats().await.total_requests_in_window, 10);
    }
}
