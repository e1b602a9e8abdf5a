//! Step executors: the boundary to the external tool gateway.
//!
//! The orchestrator sees an executor as an opaque, possibly slow, possibly
//! flaky call. Each call owns its own session; nothing is shared between
//! concurrent calls.

mod gateway;

pub use gateway::{GatewayConfig, GatewayExecutor};

use async_trait::async_trait;

use crate::errors::StepError;
use crate::steps::StepRequest;

/// Performs one named step and returns its raw record.
///
/// The returned value is decoded into the step's typed record by the
/// invoker; a value that does not decode is a schema-validation failure.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StepExecutor: Send + Sync {
    /// Executes a single call.
    async fn execute(&self, request: &StepRequest) -> Result<serde_json::Value, StepError>;
}
