//! Records of degraded steps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{Phase, StepFailure};
use crate::errors::{ErrorClass, ErrorCode};
use crate::steps::{StepKey, StepName};

/// One step that ended without a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Phase the step ran in.
    pub phase: Phase,
    /// Stable step id.
    pub step_id: StepKey,
    /// Step invoked.
    pub step: StepName,
    /// Final classification.
    pub class: ErrorClass,
    /// Final error code.
    pub code: ErrorCode,
    /// Final error detail.
    pub message: String,
    /// Executor calls made.
    pub attempts: u32,
    /// When the failure was recorded.
    pub timestamp: DateTime<Utc>,
}

impl FailureRecord {
    /// Creates a record from a settled failure.
    #[must_use]
    pub fn new(phase: Phase, step_id: StepKey, step: StepName, failure: &StepFailure) -> Self {
        Self {
            phase,
            step_id,
            step,
            class: failure.class,
            code: failure.code.clone(),
            message: failure.message.clone(),
            attempts: failure.attempts,
            timestamp: Utc::now(),
        }
    }

    /// Event payload for this failure.
    #[must_use]
    pub fn to_event_data(&self) -> serde_json::Value {
        serde_json::json!({
            "phase": self.phase,
            "step_id": self.step_id,
            "step": self.step,
            "class": self.class,
            "code": self.code,
            "message": self.message,
            "attempts": self.attempts,
        })
    }
}

/// Collects failures across a run.
#[derive(Debug, Default)]
pub struct FailureCollector {
    failures: Vec<FailureRecord>,
}

impl FailureCollector {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure.
    pub fn record(&mut self, record: FailureRecord) {
        self.failures.push(record);
    }

    /// Every failure, in the order recorded.
    #[must_use]
    pub fn failures(&self) -> &[FailureRecord] {
        &self.failures
    }

    /// Failures recorded during `phase`.
    #[must_use]
    pub fn for_phase(&self, phase: Phase) -> Vec<&FailureRecord> {
        self.failures.iter().filter(|f| f.phase == phase).collect()
    }

    /// Returns true if anything failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Number of failures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Returns true if nothing failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StepError;

    #[test]
    fn test_collector_groups_by_phase() {
        let failure = StepFailure::from_error(&StepError::timeout("slow"), ErrorClass::Retryable, 5);
        let mut collector = FailureCollector::new();
        assert!(!collector.has_failures());

        collector.record(FailureRecord::new(
            Phase::Expand,
            StepKey::new(Phase::Expand, "interactions"),
            StepName::ExpandInteractions,
            &failure,
        ));
        collector.record(FailureRecord::new(
            Phase::Validate,
            StepKey::new(Phase::Validate, "synthetic-lethality"),
            StepName::ValidateSyntheticLethality,
            &failure,
        ));

        assert_eq!(collector.len(), 2);
        assert_eq!(collector.for_phase(Phase::Expand).len(), 1);
        assert!(collector.for_phase(Phase::Anchor).is_empty());

        let data = collector.failures()[0].to_event_data();
        assert_eq!(data["step_id"], "expand.interactions");
        assert_eq!(data["code"], "TIMEOUT");
        assert_eq!(data["attempts"], 5);
    }
}
