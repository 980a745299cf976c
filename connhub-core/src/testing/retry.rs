//! Retry policy for connection tests
//!
//! Retries are sequential within one test and only happen for transient
//! failures. The delay between attempts is
//! `min(delay * multiplier^retry, max_delay)`; with the default multiplier
//! of 1.0 it is constant.

use std::time::Duration;

use super::transport::ProbeError;
use crate::models::ConnectionConfig;
use crate::models::validation::MAX_RETRY_DELAY_SECS;

/// Default backoff multiplier (constant delay)
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 1.0;

/// Decides whether a failed attempt may be retried
pub type RetryPredicate = fn(&ProbeError) -> bool;

/// Retry behavior for one connection test
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 = single attempt)
    pub max_retries: u32,
    /// Delay before the first retry
    pub delay: Duration,
    /// Multiplier applied per retry
    pub backoff_multiplier: f64,
    /// Upper bound on any single delay
    pub max_delay: Duration,
    /// Which failures are eligible for retry
    pub retryable: RetryPredicate,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: crate::models::DEFAULT_RETRY_ATTEMPTS,
            delay: Duration::from_secs(crate::models::DEFAULT_RETRY_DELAY_SECS),
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            max_delay: Duration::from_secs(MAX_RETRY_DELAY_SECS),
            retryable: ProbeError::is_transient,
        }
    }
}

impl RetryPolicy {
    /// Builds the policy described by a connection's settings
    #[must_use]
    pub fn from_config(config: &ConnectionConfig) -> Self {
        Self {
            max_retries: config.retry_attempts,
            delay: Duration::from_secs(config.retry_delay),
            ..Self::default()
        }
    }

    /// A policy that makes exactly one attempt
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Sets the number of retries
    #[must_use]
    pub const fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Sets the base delay
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the backoff multiplier
    #[must_use]
    pub const fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Sets the delay cap
    #[must_use]
    pub const fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Replaces the retryable-error predicate
    #[must_use]
    pub const fn with_predicate(mut self, retryable: RetryPredicate) -> Self {
        self.retryable = retryable;
        self
    }

    /// Delay before retry number `retry` (0-indexed)
    ///
    /// Returns `None` once `retry` reaches `max_retries`.
    #[must_use]
    pub fn delay_for_retry(&self, retry: u32) -> Option<Duration> {
        if retry >= self.max_retries {
            return None;
        }
        let factor = self.backoff_multiplier.max(1.0).powi(retry as i32);
        let delay = self.delay.mul_f64(factor);
        Some(delay.min(self.max_delay))
    }

    /// Returns whether a failure after `retries_done` retries may be retried
    #[must_use]
    pub fn should_retry(&self, retries_done: u32, error: &ProbeError) -> bool {
        retries_done < self.max_retries && (self.retryable)(error)
    }

    /// Total attempts when every attempt fails transiently
    #[must_use]
    pub const fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Progress of one test through its retry policy
#[derive(Debug, Clone)]
pub struct RetryState {
    policy: RetryPolicy,
    attempts: u32,
    last_error: Option<String>,
}

impl RetryState {
    /// Creates a fresh state for `policy`
    #[must_use]
    pub const fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            last_error: None,
        }
    }

    /// Marks the start of an attempt and returns its 1-indexed number
    pub const fn begin_attempt(&mut self) -> u32 {
        self.attempts += 1;
        self.attempts
    }

    /// Attempts started so far
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Records a failed attempt
    ///
    /// Returns the delay to wait before the next attempt, or `None` if the
    /// test should stop.
    pub fn record_failure(&mut self, error: &ProbeError) -> Option<Duration> {
        self.last_error = Some(error.to_string());
        let retries_done = self.attempts.saturating_sub(1);
        if self.policy.should_retry(retries_done, error) {
            self.policy.delay_for_retry(retries_done)
        } else {
            None
        }
    }

    /// Last recorded error message
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The policy in effect
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}
