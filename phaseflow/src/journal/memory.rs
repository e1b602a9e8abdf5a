//! Process-lifetime journal.

use async_trait::async_trait;
use dashmap::DashMap;

use super::{AttemptJournal, StepRecord};
use crate::errors::JournalError;
use crate::steps::StepKey;

/// In-memory attempt journal.
///
/// Replays within one process; lost on crash.
#[derive(Debug, Default)]
pub struct InMemoryJournal {
    records: DashMap<(String, StepKey), StepRecord>,
}

impl InMemoryJournal {
    /// Creates an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the journal is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns every record of a run, ordered by step id.
    #[must_use]
    pub fn records_for(&self, run_id: &str) -> Vec<StepRecord> {
        let mut records: Vec<_> = self
            .records
            .iter()
            .filter(|entry| entry.key().0 == run_id)
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| a.step_id.cmp(&b.step_id));
        records
    }
}

#[async_trait]
impl AttemptJournal for InMemoryJournal {
    async fn load(&self, run_id: &str, step_id: &StepKey) -> Result<Option<StepRecord>, JournalError> {
        Ok(self
            .records
            .get(&(run_id.to_string(), step_id.clone()))
            .map(|entry| entry.value().clone()))
    }

    async fn save(&self, record: &StepRecord) -> Result<(), JournalError> {
        self.records.insert(
            (record.run_id.clone(), record.step_id.clone()),
            record.clone(),
        );
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }
}
