//! Rate limiter for WebSocket message handling.
//!
//! Keeps one misbehaving client from flooding its room actor's inbox.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Sliding-window rate limiter.
///
/// ```
/// use st_server::api::rate_limiter::RateLimiter;
/// use std::time::Duration;
///
/// let mut limiter = RateLimiter::new(2, Duration::from_secs(1));
/// assert!(limiter.check());
/// assert!(limiter.check());
/// assert!(!limiter.check());
/// ```
#[derive(Debug)]
pub struct RateLimiter {
    /// Timestamps of recent requests.
    timestamps: VecDeque<Instant>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(max_requests),
            max_requests,
            window,
        }
    }

    /// Burst protection: 10 messages per second.
    pub fn burst() -> Self {
        Self::new(10, Duration::from_secs(1))
    }

    /// Sustained usage: 100 messages per minute.
    pub fn sustained() -> Self {
        Self::new(100, Duration::from_secs(60))
    }

    /// Record a request if the window allows it; `false` means the caller
    /// should be throttled.
    pub fn check(&mut self) -> bool {
        let now = Instant::now();

        while let Some(ts) = self.timestamps.front() {
            if now.duration_since(*ts) > self.window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }

        if self.timestamps.len() >= self.max_requests {
            return false;
        }

        self.timestamps.push_back(now);
        true
    }
}
