//! Test assertions for pipeline runs.

use crate::events::CollectingEventSink;
use crate::pipeline::{FailureRecord, PipelineResult};
use crate::steps::StepName;

use super::mocks::ScriptedExecutor;

/// Asserts that `step` was called exactly `times` times.
pub fn assert_step_calls(executor: &ScriptedExecutor, step: StepName, times: usize) {
    let calls = executor.calls_for(step);
    assert_eq!(
        calls.len(),
        times,
        "Expected {times} call(s) to {step}, got {}: {calls:?}",
        calls.len()
    );
}

/// Asserts that `step_id` is among the recorded failures.
pub fn assert_degraded(failures: &[FailureRecord], step_id: &str) {
    assert!(
        failures.iter().any(|f| f.step_id.as_str() == step_id),
        "Expected '{step_id}' to have degraded. Failures: {:?}",
        failures.iter().map(|f| f.step_id.as_str()).collect::<Vec<_>>()
    );
}

/// Asserts that `expected` event types appear in order (other events may
/// be interleaved).
pub fn assert_events_in_order(sink: &CollectingEventSink, expected: &[&str]) {
    let seen = sink.event_types();
    let mut remaining = expected.iter().peekable();
    for event in &seen {
        if remaining.peek().is_some_and(|next| **next == event.as_str()) {
            remaining.next();
        }
    }
    assert!(
        remaining.peek().is_none(),
        "Expected events {expected:?} in order, missing from {:?}. Seen: {seen:?}",
        remaining.collect::<Vec<_>>()
    );
}

/// Asserts that the serialized result carries every key, with absent
/// values as `null` or `[]`.
pub fn assert_stable_schema(result: &PipelineResult) {
    let value = serde_json::to_value(result).unwrap_or_default();
    let object = value.as_object();
    for key in ["entity_a", "entity_b", "protein_a", "protein_b"] {
        assert!(
            object.is_some_and(|o| o.get(key).is_some_and(|v| v.is_null() || v.is_object())),
            "Expected '{key}' to be null or an object"
        );
    }
    for key in ["interactions", "drugs", "trials", "validations"] {
        assert!(
            object.is_some_and(|o| o.get(key).is_some_and(serde_json::Value::is_array)),
            "Expected '{key}' to be a list"
        );
    }
}
