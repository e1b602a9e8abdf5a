//! Append-only JSON Lines journal.
//!
//! Every save appends the full record as one line; the latest line for a
//! step wins on replay. A final line cut short by a crash is truncated when
//! the journal is opened. Settled records are fsynced before `save` returns.

use async_trait::async_trait;
use dashmap::DashMap;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::{AttemptJournal, StepRecord};
use crate::errors::JournalError;
use crate::steps::StepKey;

/// Journal persisted to a local file.
#[derive(Debug)]
pub struct FileJournal {
    path: PathBuf,
    file: Mutex<tokio::fs::File>,
    records: DashMap<(String, StepKey), StepRecord>,
}

impl FileJournal {
    /// Opens the journal at `path`, creating it if missing, and replays it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, JournalError> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;

        let records = DashMap::new();
        let valid_len = replay(&mut file, &records)?;
        if valid_len < file.metadata()?.len() {
            tracing::warn!(
                path = %path.display(),
                valid_len,
                "Truncating incomplete final journal line"
            );
            file.set_len(valid_len)?;
        }
        file.seek(SeekFrom::End(0))?;

        tracing::debug!(path = %path.display(), records = records.len(), "Journal opened");
        Ok(Self {
            path,
            file: Mutex::new(tokio::fs::File::from_std(file)),
            records,
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of distinct steps recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Loads every complete line into `records` and returns the byte length of
/// the valid prefix.
fn replay(
    file: &mut std::fs::File,
    records: &DashMap<(String, StepKey), StepRecord>,
) -> Result<u64, JournalError> {
    file.seek(SeekFrom::Start(0))?;
    let mut reader = BufReader::new(file);
    let mut valid_len = 0u64;
    let mut line = String::new();

    loop {
        line.clear();
        let read = reader.read_line(&mut line)?;
        if read == 0 {
            break;
        }
        if !line.ends_with('\n') {
            // Crash mid-write; drop the partial line.
            break;
        }
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            let record: StepRecord = match serde_json::from_str(trimmed) {
                Ok(record) => record,
                Err(e) if at_eof(&mut reader)? => {
                    tracing::warn!(error = %e, "Dropping unreadable final journal line");
                    break;
                }
                Err(e) => return Err(e.into()),
            };
            records.insert((record.run_id.clone(), record.step_id.clone()), record);
        }
        valid_len += read as u64;
    }

    Ok(valid_len)
}

fn at_eof<R: Read>(reader: &mut BufReader<R>) -> Result<bool, JournalError> {
    Ok(reader.fill_buf()?.is_empty())
}

#[async_trait]
impl AttemptJournal for FileJournal {
    async fn load(&self, run_id: &str, step_id: &StepKey) -> Result<Option<StepRecord>, JournalError> {
        Ok(self
            .records
            .get(&(run_id.to_string(), step_id.clone()))
            .map(|entry| entry.value().clone()))
    }

    async fn save(&self, record: &StepRecord) -> Result<(), JournalError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        if record.state.is_settled() {
            file.sync_data().await?;
        }
        drop(file);

        self.records.insert(
            (record.run_id.clone(), record.step_id.clone()),
            record.clone(),
        );
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }
}
