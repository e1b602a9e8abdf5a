//! Testing utilities for phaseflow runs.
//!
//! This module provides:
//! - A scripted step executor that records calls
//! - Fixtures for the TP53 / TYMS example
//! - Assertions over calls, failures and events

mod assertions;
pub mod fixtures;
mod mocks;

pub use assertions::{
    assert_degraded, assert_events_in_order, assert_stable_schema, assert_step_calls,
};
pub use mocks::{ScriptedExecutor, ScriptedReply};
