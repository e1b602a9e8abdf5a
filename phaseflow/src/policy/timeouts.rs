//! Timeout tiers indexed by step category.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{RetryDecision, RetryPolicy};
use crate::core::StepCategory;
use crate::errors::{ErrorClass, PhaseflowError};

/// Time allowances and retry policy for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeoutTier {
    /// Limit for a single executor call, in milliseconds.
    pub per_attempt_timeout_ms: u64,
    /// Limit across all attempts and backoff sleeps, in milliseconds.
    pub total_budget_ms: u64,
    /// Retry policy applied within the budget.
    pub retry: RetryPolicy,
}

impl TimeoutTier {
    /// 3 min per attempt, 10 min total.
    #[must_use]
    pub fn short() -> Self {
        Self {
            per_attempt_timeout_ms: 3 * 60 * 1000,
            total_budget_ms: 10 * 60 * 1000,
            retry: RetryPolicy::short(),
        }
    }

    /// 5 min per attempt, 20 min total.
    #[must_use]
    pub fn long() -> Self {
        Self {
            per_attempt_timeout_ms: 5 * 60 * 1000,
            total_budget_ms: 20 * 60 * 1000,
            retry: RetryPolicy::long(),
        }
    }

    /// Per-attempt timeout as a `Duration`.
    #[must_use]
    pub fn per_attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.per_attempt_timeout_ms)
    }

    /// Total budget as a `Duration`.
    #[must_use]
    pub fn total_budget(&self) -> Duration {
        Duration::from_millis(self.total_budget_ms)
    }

    fn validate(&self, label: StepCategory) -> Result<(), PhaseflowError> {
        let problem = if self.per_attempt_timeout_ms == 0 || self.total_budget_ms == 0 {
            Some("timeouts must be non-zero".to_string())
        } else if self.per_attempt_timeout_ms > self.total_budget_ms {
            Some(format!(
                "per-attempt timeout {}ms exceeds total budget {}ms",
                self.per_attempt_timeout_ms, self.total_budget_ms
            ))
        } else if self.retry.max_attempts == 0 {
            Some("max_attempts must be at least 1".to_string())
        } else if self.retry.backoff_multiplier.is_nan() || self.retry.backoff_multiplier < 1.0 {
            Some(format!(
                "backoff multiplier {} must be >= 1.0",
                self.retry.backoff_multiplier
            ))
        } else if self.retry.initial_delay_ms > self.retry.max_delay_ms {
            Some("initial delay exceeds max delay".to_string())
        } else {
            None
        };

        match problem {
            Some(msg) => Err(PhaseflowError::Config(format!("{label} tier: {msg}"))),
            None => Ok(()),
        }
    }
}

/// Read-only tier configuration. Exactly one tier per category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeoutRegistry {
    /// Tier for `StepCategory::Short`.
    #[serde(default = "TimeoutTier::short")]
    pub short: TimeoutTier,
    /// Tier for `StepCategory::Long`.
    #[serde(default = "TimeoutTier::long")]
    pub long: TimeoutTier,
}

impl Default for TimeoutRegistry {
    fn default() -> Self {
        Self {
            short: TimeoutTier::short(),
            long: TimeoutTier::long(),
        }
    }
}

impl TimeoutRegistry {
    /// Creates a registry from explicit tiers, rejecting invalid ones.
    pub fn new(short: TimeoutTier, long: TimeoutTier) -> Result<Self, PhaseflowError> {
        let registry = Self { short, long };
        registry.validate()?;
        Ok(registry)
    }

    /// Returns the tier for `category`.
    #[must_use]
    pub fn lookup(&self, category: StepCategory) -> &TimeoutTier {
        match category {
            StepCategory::Short => &self.short,
            StepCategory::Long => &self.long,
        }
    }

    /// Retry decision for `category` after attempt `attempt` failed.
    #[must_use]
    pub fn decide(&self, category: StepCategory, attempt: u32, class: ErrorClass) -> RetryDecision {
        self.lookup(category).retry.decide(attempt, class)
    }

    /// Checks every tier. Called at startup so bad config fails fast.
    pub fn validate(&self) -> Result<(), PhaseflowError> {
        for category in StepCategory::ALL {
            self.lookup(category).validate(category)?;
        }
        Ok(())
    }
}
