//! Observability utilities.

mod attempts;

pub use attempts::{AttemptResult, SpanTimer, StepAttemptLog};
