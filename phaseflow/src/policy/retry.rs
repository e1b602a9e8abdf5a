//! Retry policy engine with capped exponential backoff.
//!
//! The engine is a pure function of (policy, attempt number, error class);
//! it never sleeps and holds no state. Attempt numbers are 1-based and
//! count executor calls, including the first.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

use crate::errors::{ErrorClass, ErrorCode, StepError};

/// Outcome of a retry decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    RetryAfter(Duration),
    /// Give up and report the failure.
    Stop,
}

fn default_non_retryable() -> BTreeSet<ErrorCode> {
    ErrorCode::non_retryable_defaults().into_iter().collect()
}

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Delay before the second attempt, in milliseconds.
    pub initial_delay_ms: u64,
    /// Growth factor applied per attempt.
    pub backoff_multiplier: f64,
    /// Maximum delay cap in milliseconds.
    pub max_delay_ms: u64,
    /// Maximum executor calls (including the first).
    pub max_attempts: u32,
    /// Codes that stop the loop immediately.
    #[serde(default = "default_non_retryable")]
    pub non_retryable_error_codes: BTreeSet<ErrorCode>,
}

impl RetryPolicy {
    /// Policy for quick lookups: 2s, x2.0, capped at 1 min, 3 attempts.
    #[must_use]
    pub fn short() -> Self {
        Self {
            initial_delay_ms: 2_000,
            backoff_multiplier: 2.0,
            max_delay_ms: 60_000,
            max_attempts: 3,
            non_retryable_error_codes: default_non_retryable(),
        }
    }

    /// Policy for open-ended searches: 5s, x2.0, capped at 3 min, 5 attempts.
    #[must_use]
    pub fn long() -> Self {
        Self {
            initial_delay_ms: 5_000,
            backoff_multiplier: 2.0,
            max_delay_ms: 180_000,
            max_attempts: 5,
            non_retryable_error_codes: default_non_retryable(),
        }
    }

    /// Sets the maximum attempts.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the initial delay.
    #[must_use]
    pub fn with_initial_delay_ms(mut self, delay: u64) -> Self {
        self.initial_delay_ms = delay;
        self
    }

    /// Sets the maximum delay.
    #[must_use]
    pub fn with_max_delay_ms(mut self, delay: u64) -> Self {
        self.max_delay_ms = delay;
        self
    }

    /// Sets the backoff multiplier.
    #[must_use]
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Classifies an executor error under this policy.
    #[must_use]
    pub fn classify(&self, error: &StepError) -> ErrorClass {
        if self.non_retryable_error_codes.contains(&error.code) {
            ErrorClass::NonRetryable
        } else {
            ErrorClass::Retryable
        }
    }

    /// Delay to wait after attempt `attempt` fails.
    ///
    /// `min(max_delay, initial_delay * multiplier^(attempt - 1))`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let factor = self.backoff_multiplier.powi(exponent);
        #[allow(clippy::cast_precision_loss)]
        let delay_ms = (self.initial_delay_ms as f64 * factor).min(self.max_delay_ms as f64);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let micros = (delay_ms.max(0.0) * 1000.0).round() as u64;
        Duration::from_micros(micros)
    }

    /// Decides what to do after attempt `attempt` failed with `class`.
    #[must_use]
    pub fn decide(&self, attempt: u32, class: ErrorClass) -> RetryDecision {
        if class == ErrorClass::NonRetryable || attempt >= self.max_attempts {
            return RetryDecision::Stop;
        }
        RetryDecision::RetryAfter(self.delay_for_attempt(attempt))
    }

    /// The delays actually slept between attempts, in order.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (1..self.max_attempts).map(|attempt| self.delay_for_attempt(attempt))
    }

    /// Upper bound on time spent sleeping across a full retry sequence.
    #[must_use]
    pub fn total_backoff(&self) -> Duration {
        self.delays().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_policy_values() {
        let policy = RetryPolicy::short();
        assert_eq!(policy.initial_delay_ms, 2_000);
        assert_eq!(policy.max_delay_ms, 60_000);
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.non_retryable_error_codes.len(), 4);
    }

    #[test]
    fn test_long_policy_values() {
        let policy = RetryPolicy::long();
        assert_eq!(policy.initial_delay_ms, 5_000);
        assert_eq!(policy.max_delay_ms, 180_000);
        assert_eq!(policy.max_attempts, 5);
    }

    #[test]
    fn test_short_backoff_sequence() {
        let policy = RetryPolicy::short();
        let per_attempt: Vec<_> = (1..=3).map(|a| policy.delay_for_attempt(a)).collect();
        assert_eq!(
            per_attempt,
            vec![
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8),
            ]
        );
        // Three calls means two sleeps.
        assert_eq!(policy.delays().count(), 2);
    }

    #[test]
    fn test_delay_capped_at_max() {
        let policy = RetryPolicy::short();
        assert_eq!(policy.delay_for_attempt(10), Duration::from_secs(60));

        let policy = RetryPolicy::long();
        assert_eq!(policy.delay_for_attempt(7), Duration::from_secs(180));
    }

    #[test]
    fn test_stop_at_max_attempts() {
        for policy in [RetryPolicy::short(), RetryPolicy::long()] {
            let max = policy.max_attempts;
            assert_eq!(policy.decide(max, ErrorClass::Retryable), RetryDecision::Stop);
            assert_eq!(policy.decide(max + 3, ErrorClass::Retryable), RetryDecision::Stop);
            assert!(matches!(
                policy.decide(max - 1, ErrorClass::Retryable),
                RetryDecision::RetryAfter(_)
            ));
        }
    }

    #[test]
    fn test_non_retryable_stops_on_first_attempt() {
        for policy in [RetryPolicy::short(), RetryPolicy::long()] {
            assert_eq!(policy.decide(1, ErrorClass::NonRetryable), RetryDecision::Stop);
        }
    }

    #[test]
    fn test_retry_after_uses_attempt_delay() {
        let policy = RetryPolicy::long();
        assert_eq!(
            policy.decide(2, ErrorClass::Retryable),
            RetryDecision::RetryAfter(Duration::from_secs(10))
        );
    }

    #[test]
    fn test_classify() {
        let policy = RetryPolicy::short();
        for code in ErrorCode::non_retryable_defaults() {
            let err = StepError::new(code, "x");
            assert_eq!(policy.classify(&err), ErrorClass::NonRetryable);
        }
        for err in [
            StepError::timeout("x"),
            StepError::connection("x"),
            StepError::rate_limited("x"),
            StepError::new(ErrorCode::Other("BOOM".to_string()), "x"),
        ] {
            assert_eq!(policy.classify(&err), ErrorClass::Retryable);
        }
    }

    #[test]
    fn test_builder() {
        let policy = RetryPolicy::short()
            .with_max_attempts(5)
            .with_initial_delay_ms(10)
            .with_max_delay_ms(25)
            .with_backoff_multiplier(3.0);

        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(10));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(25));
        assert_eq!(policy.total_backoff(), Duration::from_millis(85));
    }

    #[test]
    fn test_serde_defaults_non_retryable_codes() {
        let policy: RetryPolicy = serde_json::from_value(serde_json::json!({
            "initial_delay_ms": 100,
            "backoff_multiplier": 2.0,
            "max_delay_ms": 1000,
            "max_attempts": 2
        }))
        .unwrap();
        assert!(policy
            .non_retryable_error_codes
            .contains(&ErrorCode::EntityNotFound));
    }
}
