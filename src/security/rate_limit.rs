//! Sliding-window rate limiting
//!
//! Every identifier (client IP or forwarded address) owns the timestamps of
//! its admitted requests. A request is admitted while fewer than `limit`
//! timestamps fall inside the trailing window.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Default number of requests admitted per window.
pub const DEFAULT_REQUESTS_PER_WINDOW: u32 = 60;

/// Default window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Returned when a request is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitExceeded {
    pub limit: u32,
    /// Time until the oldest admitted request leaves the window.
    pub retry_after: Duration,
}

impl RateLimitExceeded {
    /// Whole seconds to wait, rounded up and never below 1.
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.retry_after.as_secs();
        let rounded = if self.retry_after.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        };
        rounded.max(1)
    }
}

#[derive(Debug, Default)]
pub struct SlidingWindowRateLimiter {
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` and records the request when it is admitted.
    pub fn check_rate_limit(&self, identifier: &str, limit: u32, window: Duration) -> bool {
        self.check_and_record(identifier, limit, window).is_ok()
    }

    /// Admits and records a request, returning the remaining budget, or
    /// rejects it without recording anything.
    pub fn check_and_record(
        &self,
        identifier: &str,
        limit: u32,
        window: Duration,
    ) -> Result<u32, RateLimitExceeded> {
        self.check_and_record_at(identifier, limit, window, Instant::now())
    }

    pub fn check_and_record_at(
        &self,
        identifier: &str,
        limit: u32,
        window: Duration,
        now: Instant,
    ) -> Result<u32, RateLimitExceeded> {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        let timestamps = windows.entry(identifier.to_string()).or_default();

        prune(timestamps, window, now);

        let count = timestamps.len() as u32;
        if count >= limit {
            let retry_after = match timestamps.front() {
                Some(oldest) => window.saturating_sub(now.saturating_duration_since(*oldest)),
                None => window,
            };
            return Err(RateLimitExceeded { limit, retry_after });
        }

        timestamps.push_back(now);
        Ok(limit - count - 1)
    }

    /// Drops identifiers with no request inside the trailing window.
    pub fn cleanup_stale_entries(&self, window: Duration) -> usize {
        self.cleanup_stale_entries_at(window, Instant::now())
    }

    pub fn cleanup_stale_entries_at(&self, window: Duration, now: Instant) -> usize {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        let before = windows.len();
        windows.retain(|_, timestamps| {
            prune(timestamps, window, now);
            !timestamps.is_empty()
        });
        before - windows.len()
    }

    /// Number of identifiers currently tracked.
    pub fn tracked_identifiers(&self) -> usize {
        self.windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

fn prune(timestamps: &mut VecDeque<Instant>, window: Duration, now: Instant) {
    // Timestamps are pushed in order, so expired ones sit at the front
    while let Some(oldest) = timestamps.front() {
        if now.saturating_duration_since(*oldest) < window {
            break;
        }
        timestamps.pop_front();
    }
}
