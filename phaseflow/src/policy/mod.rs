//! Retry, timeout and orchestrator configuration.
//!
//! This module provides:
//! - The pure retry policy engine
//! - The two-tier timeout registry
//! - The injectable orchestrator configuration

mod config;
mod retry;
mod timeouts;

pub use config::{OrchestratorConfig, ValidateConfig};
pub use retry::{RetryDecision, RetryPolicy};
pub use timeouts::{TimeoutRegistry, TimeoutTier};
