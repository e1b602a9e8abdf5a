//! Progress events.
//!
//! The coordinator and step invoker report progress through an injected
//! [`EventSink`]. Event type names are collected in [`names`] so sinks and
//! tests agree on them.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

/// Event type names emitted by the orchestrator.
pub mod names {
    /// A run began.
    pub const PIPELINE_STARTED: &str = "pipeline.started";
    /// A run reached `Done`.
    pub const PIPELINE_COMPLETED: &str = "pipeline.completed";
    /// A run hard-stopped.
    pub const PIPELINE_FAILED: &str = "pipeline.failed";
    /// A phase began.
    pub const PHASE_STARTED: &str = "phase.started";
    /// A phase finished (possibly degraded).
    pub const PHASE_COMPLETED: &str = "phase.completed";
    /// A phase step failed and its output fell back to empty/absent.
    pub const PHASE_DEGRADED: &str = "phase.degraded";
    /// Trial search used the target name because no drug was found.
    pub const TRAVERSE_FALLBACK: &str = "traverse.fallback";
    /// One executor call finished.
    pub const STEP_ATTEMPT: &str = "step.attempt";
    /// A retry was scheduled.
    pub const STEP_RETRY_SCHEDULED: &str = "step.retry_scheduled";
    /// A journaled outcome was reused without calling the executor.
    pub const STEP_REPLAYED: &str = "step.replayed";
    /// An invocation produced a record.
    pub const STEP_SUCCEEDED: &str = "step.succeeded";
    /// An invocation gave up.
    pub const STEP_FAILED: &str = "step.failed";
}
