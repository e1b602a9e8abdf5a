//! Per-step attempt journal.
//!
//! The step invoker records every attempt here, keyed by run id and step id.
//! On a resumed run the invoker replays settled outcomes instead of calling
//! the executor again, and continues the attempt count of steps that were
//! in flight.
//!
//! Durability depends on the backend: [`InMemoryJournal`] lives as long as
//! the process (at-most-once across crashes), [`FileJournal`] survives
//! restarts.

mod file;
mod memory;

pub use file::FileJournal;
pub use memory::InMemoryJournal;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::StepFailure;
use crate::errors::JournalError;
use crate::steps::{StepKey, StepName};

/// Where a journaled step stands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StepState {
    /// Attempts have started but none has settled the step.
    InProgress,
    /// The step produced a record.
    Succeeded {
        /// The raw record as returned by the executor.
        value: serde_json::Value,
    },
    /// The step gave up.
    Failed {
        /// The final failure.
        failure: StepFailure,
    },
}

impl StepState {
    /// Returns true once the step can no longer change.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

/// Persisted state of one step invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Run the step belongs to.
    pub run_id: String,
    /// Stable step id within the run.
    pub step_id: StepKey,
    /// The step invoked.
    pub step: StepName,
    /// Fingerprint of the request; a mismatch means a different call.
    pub fingerprint: String,
    /// Executor calls already made.
    pub attempts: u32,
    /// Current state.
    #[serde(flatten)]
    pub state: StepState,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl StepRecord {
    /// Creates a fresh in-progress record with no attempts.
    #[must_use]
    pub fn new(
        run_id: impl Into<String>,
        step_id: StepKey,
        step: StepName,
        fingerprint: impl Into<String>,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            step_id,
            step,
            fingerprint: fingerprint.into(),
            attempts: 0,
            state: StepState::InProgress,
            updated_at: Utc::now(),
        }
    }

    /// Returns a copy with the attempt count bumped.
    #[must_use]
    pub fn with_attempt(&self, attempts: u32) -> Self {
        Self {
            attempts,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    /// Returns a copy moved to `state`.
    #[must_use]
    pub fn settled(&self, state: StepState) -> Self {
        Self {
            state,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }
}

/// Storage backend for step records.
#[async_trait]
pub trait AttemptJournal: Send + Sync {
    /// Loads the latest record for a step.
    async fn load(&self, run_id: &str, step_id: &StepKey) -> Result<Option<StepRecord>, JournalError>;

    /// Stores a record, replacing any earlier one for the same step.
    async fn save(&self, record: &StepRecord) -> Result<(), JournalError>;

    /// True if records survive a process restart.
    fn is_durable(&self) -> bool;
}
