// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Retry policy for transient request failures.
//!
//! Only `Network` and `Timeout` failures are retried, and by default only
//! for idempotent methods. POST and PATCH get a single attempt unless the
//! policy or the individual request opts in, in which case the caller accepts
//! at-least-once delivery.

use std::time::Duration;

use rand::Rng;

use super::Method;
use crate::error::ApiError;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(250);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(2);

/// Jitter strategy to apply to backoff delays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Jitter {
    /// Always wait the capped exponential delay.
    None,
    /// Wait a random delay in `[0, capped_delay]`.
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    jitter: Jitter,
    retry_unsafe_methods: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            jitter: Jitter::Full,
            retry_unsafe_methods: false,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self::default().with_max_attempts(1)
    }

    /// Total attempts per logical request, including the first. Clamped to 1.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    /// Retry POST/PATCH as well. Callers accept at-least-once delivery.
    pub fn with_retry_unsafe_methods(mut self, enabled: bool) -> Self {
        self.retry_unsafe_methods = enabled;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn retries_unsafe_methods(&self) -> bool {
        self.retry_unsafe_methods
    }

    /// Whether a failed attempt number `attempt` (1-based) should be retried.
    pub fn should_retry(
        &self,
        method: Method,
        attempt: u32,
        error: &ApiError,
        request_allows_unsafe: bool,
    ) -> bool {
        if attempt >= self.max_attempts || !error.is_transient() {
            return false;
        }
        method.is_idempotent() || self.retry_unsafe_methods || request_allows_unsafe
    }

    /// Delay before the attempt following failed attempt `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        // capped = min(base * 2^(attempt-1), max)
        let base_ms = self.base_delay.as_millis();
        let max_ms = self.max_delay.as_millis();
        let shift = attempt.saturating_sub(1).min(63);
        let multiplier = 1u128.checked_shl(shift).unwrap_or(u128::MAX);
        let capped_ms = base_ms.saturating_mul(multiplier).min(max_ms);
        let capped_ms = u64::try_from(capped_ms).unwrap_or(u64::MAX);

        let delay_ms = match self.jitter {
            Jitter::None => capped_ms,
            Jitter::Full if capped_ms == 0 => 0,
            Jitter::Full => rand::thread_rng().gen_range(0..=capped_ms),
        };
        Duration::from_millis(delay_ms)
    }
}
