//! Core types shared by every layer of the orchestrator.

mod category;
mod outcome;
mod phase;

pub use category::StepCategory;
pub use outcome::{StepFailure, StepOutcome};
pub use phase::{Phase, PhaseTracker};
