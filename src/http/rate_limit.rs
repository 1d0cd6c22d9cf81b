//! Header-driven rate-limit governor
//!
//! The API reports the remaining call quota and the epoch second at which
//! the window resets on every response. When the quota drops below a
//! threshold the governor holds the next request until the reset.

use super::sleep::Sleeper;
use reqwest::header::HeaderMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Header carrying the calls left in the current window
pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Header carrying the window reset time (Unix seconds)
pub const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

/// Throttle thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Throttle when fewer calls than this remain
    pub min_remaining: u64,
    /// Lower bound on any throttle sleep
    pub min_sleep: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_remaining: 15,
            min_sleep: Duration::from_secs(30),
        }
    }
}

/// Quota snapshot taken from one response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitState {
    /// Calls left before the window is exhausted
    pub remaining: u64,
    /// Window reset, Unix seconds
    pub reset: i64,
}

impl RateLimitState {
    /// Create a snapshot
    pub fn new(remaining: u64, reset: i64) -> Self {
        Self { remaining, reset }
    }

    /// Read the snapshot from response headers
    ///
    /// Returns `None` when either header is missing or not an integer.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let remaining = header_value(headers, RATE_LIMIT_REMAINING_HEADER)?.parse().ok()?;
        let reset = header_value(headers, RATE_LIMIT_RESET_HEADER)?.parse().ok()?;
        Some(Self { remaining, reset })
    }

    /// Delay required before the next call, given the current Unix time
    pub fn throttle_delay(&self, config: &RateLimitConfig, now: i64) -> Option<Duration> {
        if self.remaining >= config.min_remaining {
            return None;
        }

        let until_reset = self.reset.saturating_sub(now);
        let until_reset = Duration::from_secs(u64::try_from(until_reset).unwrap_or(0));
        Some(until_reset.max(config.min_sleep))
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name)?.to_str().ok().map(str::trim)
}

/// Proactive throttle fed by every successful response
///
/// Only the most recent response counts: each observation replaces the
/// pending delay, and [`wait`](Self::wait) consumes it before the next call.
#[derive(Debug, Default)]
pub struct RateLimitGovernor {
    config: RateLimitConfig,
    pending: Mutex<Option<Duration>>,
    throttles: AtomicU64,
}

impl RateLimitGovernor {
    /// Create a governor with the given thresholds
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            pending: Mutex::new(None),
            throttles: AtomicU64::new(0),
        }
    }

    /// Thresholds in force
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Record the quota reported by the latest response
    pub fn observe(&self, state: Option<RateLimitState>, now: i64) -> Option<Duration> {
        let delay = match state {
            Some(state) => {
                let delay = state.throttle_delay(&self.config, now);
                if let Some(delay) = delay {
                    warn!(
                        "Remaining {} calls, next request delayed {}s until the rate limit resets",
                        state.remaining,
                        delay.as_secs()
                    );
                }
                delay
            }
            None => {
                debug!("Response carried no rate-limit headers");
                None
            }
        };

        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = delay;
        delay
    }

    /// Delay that the next call will honour, if any
    pub fn pending(&self) -> Option<Duration> {
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep off any pending throttle
    pub async fn wait(&self, sleeper: &dyn Sleeper) -> Option<Duration> {
        let delay = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(delay) = delay {
            self.throttles.fetch_add(1, Ordering::Relaxed);
            info!("Rate limit throttle, sleeping {}s", delay.as_secs());
            sleeper.sleep(delay).await;
        }
        delay
    }

    /// Number of throttle sleeps taken
    pub fn throttle_count(&self) -> u64 {
        self.throttles.load(Ordering::Relaxed)
    }
}
