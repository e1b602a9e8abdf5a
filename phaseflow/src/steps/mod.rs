//! The catalogue of steps the orchestrator can invoke.
//!
//! Each step has a fixed wire name and category. Requests carry typed
//! arguments and know which of them must already be CURIEs.

mod claims;
mod request;

pub use claims::{gene_claim, mechanism_claim};
pub use request::{StepKey, StepName, StepRequest};
