//! Step outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{ErrorClass, ErrorCode, StepError};

/// Why an invocation ended without a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFailure {
    /// Whether the final error was retryable.
    pub class: ErrorClass,
    /// The code of the final error.
    pub code: ErrorCode,
    /// Detail of the final error.
    pub message: String,
    /// Executor calls made across the whole invocation.
    pub attempts: u32,
}

impl StepFailure {
    /// Creates a failure from the last error seen.
    #[must_use]
    pub fn from_error(error: &StepError, class: ErrorClass, attempts: u32) -> Self {
        Self {
            class,
            code: error.code.clone(),
            message: error.message.clone(),
            attempts,
        }
    }

    /// Returns true if the failure was permanent.
    #[must_use]
    pub fn is_non_retryable(&self) -> bool {
        self.class == ErrorClass::NonRetryable
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) after {} attempt(s): {}",
            self.code, self.class, self.attempts, self.message
        )
    }
}

/// The result of one step invocation after retries have settled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum StepOutcome<T> {
    /// The executor produced a well-formed record.
    Success(T),
    /// Retries were exhausted or the error was permanent.
    Failure(StepFailure),
}

impl<T> StepOutcome<T> {
    /// Returns true on success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the record, discarding any failure.
    #[must_use]
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    /// Returns the failure, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&StepFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }

    /// Converts into a standard `Result`.
    pub fn into_result(self) -> Result<T, StepFailure> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(failure) => Err(failure),
        }
    }

    /// Maps the success value.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> StepOutcome<U> {
        match self {
            Self::Success(value) => StepOutcome::Success(f(value)),
            Self::Failure(failure) => StepOutcome::Failure(failure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure() -> StepFailure {
        StepFailure::from_error(
            &StepError::entity_not_found("no record for HGNC:0"),
            ErrorClass::NonRetryable,
            1,
        )
    }

    #[test]
    fn test_success_accessors() {
        let outcome: StepOutcome<u32> = StepOutcome::Success(7);
        assert!(outcome.is_success());
        assert!(outcome.failure().is_none());
        assert_eq!(outcome.map(|v| v * 2).ok(), Some(14));
    }

    #[test]
    fn test_failure_accessors() {
        let outcome: StepOutcome<u32> = StepOutcome::Failure(failure());
        assert!(!outcome.is_success());
        assert!(outcome.failure().unwrap().is_non_retryable());
        assert_eq!(outcome.clone().ok(), None);
        assert_eq!(outcome.into_result().unwrap_err().attempts, 1);
    }

    #[test]
    fn test_failure_display() {
        assert_eq!(
            failure().to_string(),
            "ENTITY_NOT_FOUND (non_retryable) after 1 attempt(s): no record for HGNC:0"
        );
    }

    #[test]
    fn test_outcome_serialize_shape() {
        let outcome: StepOutcome<String> = StepOutcome::Success("HGNC:11998".to_string());
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["value"], "HGNC:11998");
    }
}
