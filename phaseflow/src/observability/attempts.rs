//! Structured attempt logging for step invocations.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::errors::{ErrorClass, ErrorCode};
use crate::steps::StepName;

/// Simple span timing helper.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    name: String,
}

impl SpanTimer {
    /// Starts a new span timer.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Returns the span name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Finishes the span and returns the duration.
    #[must_use]
    pub fn finish(self) -> f64 {
        self.elapsed_ms()
    }
}

/// How a single executor call ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AttemptResult {
    /// A well-formed record came back.
    Succeeded,
    /// The executor reported an error (or the record failed to decode).
    Failed {
        /// Error code.
        code: ErrorCode,
        /// Classification under the step's policy.
        class: ErrorClass,
    },
    /// The per-attempt timeout fired.
    TimedOut,
}

/// One line of attempt telemetry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepAttemptLog {
    /// Run the attempt belongs to.
    pub run_id: String,
    /// Stable step id within the run.
    pub step_id: String,
    /// The step invoked.
    pub step: StepName,
    /// 1-based attempt number.
    pub attempt: u32,
    /// Wall time of the call.
    pub elapsed_ms: f64,
    /// How the call ended.
    pub outcome: AttemptResult,
}

impl StepAttemptLog {
    /// Writes the attempt to the tracing subscriber.
    pub fn log(&self) {
        match &self.outcome {
            AttemptResult::Succeeded => tracing::info!(
                run_id = %self.run_id,
                step_id = %self.step_id,
                step = %self.step,
                attempt = self.attempt,
                elapsed_ms = self.elapsed_ms,
                "Step attempt succeeded"
            ),
            AttemptResult::Failed { code, class } => tracing::warn!(
                run_id = %self.run_id,
                step_id = %self.step_id,
                step = %self.step,
                attempt = self.attempt,
                elapsed_ms = self.elapsed_ms,
                error_code = %code,
                error_class = %class,
                "Step attempt failed"
            ),
            AttemptResult::TimedOut => tracing::warn!(
                run_id = %self.run_id,
                step_id = %self.step_id,
                step = %self.step,
                attempt = self.attempt,
                elapsed_ms = self.elapsed_ms,
                "Step attempt timed out"
            ),
        }
    }

    /// Event payload for an [`EventSink`](crate::events::EventSink).
    #[must_use]
    pub fn to_event_data(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
