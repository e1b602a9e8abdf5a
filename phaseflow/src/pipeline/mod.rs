//! Pipeline execution.
//!
//! This module provides:
//! - [`StepInvoker`]: timeouts, retries and journaling around one step call
//! - [`PhaseCoordinator`]: the five-phase state machine with fan-out/fan-in
//! - [`ResultAggregator`] and [`PipelineResult`]: the run's output document
//! - [`FailureRecord`]: what degraded and why

mod coordinator;
mod failure;
mod input;
mod invoker;
mod result;

#[cfg(test)]
mod integration_tests;

pub use coordinator::{PhaseCoordinator, PhaseCoordinatorBuilder};
pub use failure::{FailureCollector, FailureRecord};
pub use input::PipelineInput;
pub use invoker::StepInvoker;
pub use result::{PipelineResult, ResultAggregator};
