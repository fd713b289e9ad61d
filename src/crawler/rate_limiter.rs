//! Delay between successive board fetches
//!
//! Boards are fetched one at a time; the coordinator calls [`RateLimiter::delay`]
//! between two boards, never before the first or after the last.

use crate::config::RateLimitConfig;
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Fixed or uniformly jittered pause
#[derive(Debug)]
pub struct RateLimiter {
    min: Duration,
    max: Duration,
    waits: AtomicUsize,
}

impl RateLimiter {
    /// Always pauses for `delay`
    pub fn fixed(delay: Duration) -> Self {
        Self::jittered(delay, delay)
    }

    /// Pauses for a duration drawn uniformly from `min..=max`
    pub fn jittered(min: Duration, max: Duration) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            min,
            max,
            waits: AtomicUsize::new(0),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::jittered(
            Duration::from_millis(config.min_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }

    /// Draws the next pause length
    pub fn next_delay(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }

        let min_ms = self.min.as_millis() as u64;
        let max_ms = self.max.as_millis() as u64;
        Duration::from_millis(rand::rng().random_range(min_ms..=max_ms))
    }

    /// Suspends the caller before the next board fetch
    pub async fn delay(&self) {
        let pause = self.next_delay();
        self.waits.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Waiting {:?} before next board", pause);
        tokio::time::sleep(pause).await;
    }

    /// Number of pauses taken so far
    pub fn waits(&self) -> usize {
        self.waits.load(Ordering::Relaxed)
    }
}
