//! Fixed-delay retry budget
//!
//! A failed page request is re-issued unchanged after a flat sleep. The
//! budget counts consecutive failures and resets on the first success, so
//! it bounds the stall of any single request to `max_retries * delay`.

use super::sleep::Sleeper;
use crate::error::{Error, Result};
use std::time::Duration;
use tracing::warn;

/// Default delay between attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Retry settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed before the error becomes fatal
    pub max_retries: u32,
    /// Sleep before each retry
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the default delay
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Set the retry delay
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Consecutive-failure counter for one fetch sequence
#[derive(Debug, Clone)]
pub struct RetryBudget {
    policy: RetryPolicy,
    consecutive: u32,
    total: u32,
}

impl RetryBudget {
    /// Start a fresh budget
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            consecutive: 0,
            total: 0,
        }
    }

    /// Retries used since the last success
    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    /// Retries used over the budget's lifetime
    pub fn total(&self) -> u32 {
        self.total
    }

    /// The policy in force
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Clear the consecutive counter after a successful call
    pub fn reset(&mut self) {
        self.consecutive = 0;
    }

    /// Handle a failed attempt against `url`
    ///
    /// Sleeps and returns `Ok(())` when the caller should re-issue the same
    /// request. Returns the error unchanged when it is not transient, and
    /// [`Error::RetriesExhausted`] once the budget is spent.
    pub async fn backoff(&mut self, url: &str, error: Error, sleeper: &dyn Sleeper) -> Result<()> {
        if !error.is_retryable() {
            return Err(error);
        }

        if self.consecutive >= self.policy.max_retries {
            return Err(Error::RetriesExhausted {
                url: url.to_string(),
                retries: self.consecutive,
                last: Box::new(error),
            });
        }

        warn!(
            "Request to {url} failed ({error}), sleeping {}s before retry {}/{}",
            self.policy.delay.as_secs(),
            self.consecutive + 1,
            self.policy.max_retries
        );
        sleeper.sleep(self.policy.delay).await;
        self.consecutive += 1;
        self.total += 1;
        Ok(())
    }
}
