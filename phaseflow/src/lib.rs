//! # Phaseflow
//!
//! A durable five-phase pipeline orchestrator.
//!
//! Phaseflow drives a fixed sequence of data-gathering and validation steps
//! against an external tool gateway:
//!
//! - **Phase sequencing**: `Anchor → Enrich → Expand → Traverse → Validate → Done`
//! - **Fan-out/fan-in**: concurrent calls within a phase, joined before the next
//! - **Tiered retries**: SHORT and LONG timeout tiers with capped exponential backoff
//! - **Failure isolation**: failed steps degrade to empty results instead of aborting
//! - **Durability**: per-step attempt state journaled by run id and step id
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use phaseflow::prelude::*;
//! use std::sync::Arc;
//!
//! let executor = GatewayExecutor::new(GatewayConfig::new("gateway"));
//! let coordinator = PhaseCoordinator::builder()
//!     .executor(Arc::new(executor))
//!     .event_sink(Arc::new(LoggingEventSink::default()))
//!     .build()?;
//!
//! let result = coordinator.run(&PipelineInput::default()).await?;
//! println!("{}", result.to_json()?);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod core;
pub mod errors;
pub mod events;
pub mod executor;
pub mod journal;
pub mod models;
pub mod observability;
pub mod pipeline;
pub mod policy;
pub mod steps;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{Phase, StepCategory, StepFailure, StepOutcome};
    pub use crate::errors::{
        AnchorFailedError, ErrorClass, ErrorCode, JournalError, PhaseflowError, StepError,
    };
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::executor::{GatewayConfig, GatewayExecutor, StepExecutor};
    pub use crate::journal::{AttemptJournal, FileJournal, InMemoryJournal};
    pub use crate::models::{
        Drug, GeneResolution, Interaction, ProteinContext, Trial, ValidationEvidence,
    };
    pub use crate::pipeline::{
        FailureRecord, PhaseCoordinator, PipelineInput, PipelineResult, StepInvoker,
    };
    pub use crate::policy::{
        OrchestratorConfig, RetryDecision, RetryPolicy, TimeoutRegistry, TimeoutTier,
    };
    pub use crate::steps::{StepKey, StepName, StepRequest};
    pub use crate::utils::{Curie, RunId};
}
