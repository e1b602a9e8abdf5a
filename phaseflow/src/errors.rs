//! Error types for the phaseflow orchestrator.
//!
//! Two layers live here: [`StepError`] is what a step executor hands back
//! for a single failed call, classified by its [`ErrorCode`], and
//! [`PhaseflowError`] is the crate-level error surfaced by the coordinator,
//! the journal and configuration loading.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::pipeline::PipelineResult;

/// The main error type for phaseflow operations.
#[derive(Debug, Error)]
pub enum PhaseflowError {
    /// Neither pipeline entity could be resolved; nothing downstream is meaningful.
    #[error("{0}")]
    AnchorFailed(#[from] AnchorFailedError),

    /// The phase state machine was asked to make an out-of-order move.
    #[error("Invalid phase transition: {from} -> {to}")]
    InvalidTransition {
        /// The phase the coordinator was in.
        from: String,
        /// The phase it attempted to enter.
        to: String,
    },

    /// An attempt journal operation failed.
    #[error("{0}")]
    Journal(#[from] JournalError),

    /// Configuration was rejected at load time.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Raised when both anchor resolutions fail.
///
/// Carries the result snapshot at the point of failure so callers can still
/// serialize what the run knew.
#[derive(Debug, Clone, Error)]
#[error("Anchor phase failed for both entities: '{entity_a}' ({reason_a}), '{entity_b}' ({reason_b})")]
pub struct AnchorFailedError {
    /// First entity as supplied by the caller.
    pub entity_a: String,
    /// Why the first entity failed to resolve.
    pub reason_a: String,
    /// Second entity as supplied by the caller.
    pub entity_b: String,
    /// Why the second entity failed to resolve.
    pub reason_b: String,
    /// The aggregated result when the run stopped.
    pub snapshot: Box<PipelineResult>,
}

/// Errors raised by attempt journal backends.
#[derive(Debug, Error)]
pub enum JournalError {
    /// IO error while reading or appending the journal.
    #[error("Journal IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A journal line could not be encoded or decoded.
    #[error("Journal encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Error codes recognized system-wide.
///
/// The first four are the non-retryable family: retrying cannot change the
/// outcome. Everything else is transient.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorCode {
    /// A raw input was passed where a normalized identifier was required.
    UnresolvedEntity,
    /// Query too short or result set too broad.
    AmbiguousQuery,
    /// Well-formed identifier with no backing record.
    EntityNotFound,
    /// Returned data did not conform to the expected record shape.
    SchemaValidation,
    /// A call exceeded its time allowance.
    Timeout,
    /// The gateway could not be reached or its session died.
    Connection,
    /// The gateway or an upstream source throttled the call.
    RateLimited,
    /// Any other code reported by the gateway.
    Other(String),
}

impl ErrorCode {
    /// Returns the wire representation of the code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::UnresolvedEntity => "UNRESOLVED_ENTITY",
            Self::AmbiguousQuery => "AMBIGUOUS_QUERY",
            Self::EntityNotFound => "ENTITY_NOT_FOUND",
            Self::SchemaValidation => "SCHEMA_VALIDATION",
            Self::Timeout => "TIMEOUT",
            Self::Connection => "CONNECTION",
            Self::RateLimited => "RATE_LIMITED",
            Self::Other(code) => code,
        }
    }

    /// Parses a wire code. Unknown codes become [`ErrorCode::Other`].
    #[must_use]
    pub fn parse(code: &str) -> Self {
        match code {
            "UNRESOLVED_ENTITY" => Self::UnresolvedEntity,
            "AMBIGUOUS_QUERY" => Self::AmbiguousQuery,
            "ENTITY_NOT_FOUND" => Self::EntityNotFound,
            "SCHEMA_VALIDATION" | "ValidationError" => Self::SchemaValidation,
            "TIMEOUT" => Self::Timeout,
            "CONNECTION" => Self::Connection,
            "RATE_LIMITED" => Self::RateLimited,
            other => Self::Other(other.to_string()),
        }
    }

    /// The codes that are never worth retrying.
    #[must_use]
    pub fn non_retryable_defaults() -> [Self; 4] {
        [
            Self::UnresolvedEntity,
            Self::AmbiguousQuery,
            Self::EntityNotFound,
            Self::SchemaValidation,
        ]
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Whether a failure is worth another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Transient; the retry policy decides whether to try again.
    Retryable,
    /// Permanent; stop immediately.
    NonRetryable,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retryable => write!(f, "retryable"),
            Self::NonRetryable => write!(f, "non_retryable"),
        }
    }
}

/// A single failed step call, as reported by an executor.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct StepError {
    /// Machine-readable code.
    pub code: ErrorCode,
    /// Human-readable detail.
    pub message: String,
}

impl StepError {
    /// Creates a new step error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Creates an unresolved-entity error.
    #[must_use]
    pub fn unresolved_entity(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnresolvedEntity, message)
    }

    /// Creates an ambiguous-query error.
    #[must_use]
    pub fn ambiguous_query(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AmbiguousQuery, message)
    }

    /// Creates an entity-not-found error.
    #[must_use]
    pub fn entity_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::EntityNotFound, message)
    }

    /// Creates a schema-validation error.
    #[must_use]
    pub fn schema_validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SchemaValidation, message)
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Timeout, message)
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Connection, message)
    }

    /// Creates a rate-limit error.
    #[must_use]
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RateLimited, message)
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("code".to_string(), serde_json::json!(self.code.as_str()));
        map.insert("message".to_string(), serde_json::json!(self.message));
        map
    }
}
