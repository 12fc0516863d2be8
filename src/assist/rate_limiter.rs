//! Sliding-window rate limiter with a cooldown between admitted requests
//!
//! Denials are not queued: a denied check means "no request this cycle" and
//! the next debounce cycle tries again.

use std::collections::VecDeque;

use serde::Serialize;

use super::clock::now_ms;
use crate::config::assist_types::RateLimitConfig;

/// Snapshot of the limiter for observability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimiterStatus {
    /// Admitted requests still inside the window
    pub requests_in_window: usize,
    /// Milliseconds until the cooldown since the last request has passed
    pub cooldown_remaining_ms: u64,
}

/// Admission gate for generation calls.
///
/// Keeps the timestamps of admitted requests; a request is allowed only when
/// fewer than `max_requests` fall inside `window_ms` and more than
/// `cooldown_ms` have passed since the most recent one.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window_ms: u64,
    cooldown_ms: u64,
    /// Admitted request times, oldest first
    timestamps: VecDeque<u64>,
    /// Kept apart from the window so pruning never shortens the cooldown
    last_request: Option<u64>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window_ms: u64, cooldown_ms: u64) -> Self {
        Self {
            max_requests,
            window_ms,
            cooldown_ms,
            timestamps: VecDeque::new(),
            last_request: None,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, config.window_ms, config.cooldown_ms)
    }

    pub fn can_request(&mut self) -> bool {
        self.can_request_at(now_ms())
    }

    /// Check admission at `now`, pruning timestamps that left the window
    pub fn can_request_at(&mut self, now: u64) -> bool {
        self.prune(now);

        if self.timestamps.len() >= self.max_requests {
            return false;
        }

        match self.last_request {
            Some(last) => now.saturating_sub(last) > self.cooldown_ms,
            None => true,
        }
    }

    pub fn record_request(&mut self) {
        self.record_request_at(now_ms());
    }

    /// Record an admitted request
    pub fn record_request_at(&mut self, now: u64) {
        self.timestamps.push_back(now);
        self.last_request = Some(now);
    }

    pub fn status(&self) -> RateLimiterStatus {
        self.status_at(now_ms())
    }

    pub fn status_at(&self, now: u64) -> RateLimiterStatus {
        let requests_in_window = self
            .timestamps
            .iter()
            .filter(|&&t| now.saturating_sub(t) < self.window_ms)
            .count();

        // Admission needs strictly more than cooldown_ms, hence the +1
        let cooldown_remaining_ms = match self.last_request {
            Some(last) => (self.cooldown_ms + 1).saturating_sub(now.saturating_sub(last)),
            None => 0,
        };

        RateLimiterStatus {
            requests_in_window,
            cooldown_remaining_ms,
        }
    }

    /// Forget every recorded request
    pub fn reset(&mut self) {
        self.timestamps.clear();
        self.last_request = None;
    }

    fn prune(&mut self, now: u64) {
        while let Some(&oldest) = self.timestamps.front() {
            if now.saturating_sub(oldest) >= self.window_ms {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::from_config(&RateLimitConfig::default())
    }
}
