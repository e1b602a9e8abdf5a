//! Pipeline scenarios driven through the public API.

use phaseflow::prelude::*;
use phaseflow::testing::{assert_stable_schema, assert_step_calls, fixtures, ScriptedExecutor, ScriptedReply};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn build(executor: Arc<ScriptedExecutor>) -> PhaseCoordinator {
    PhaseCoordinator::builder()
        .executor(executor)
        .event_sink(Arc::new(LoggingEventSink::debug()))
        .build()
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn expand_exhausting_retries_still_reaches_done() {
    let executor = Arc::new(fixtures::happy_executor().on(
        StepName::ExpandInteractions,
        ScriptedReply::err(StepError::rate_limited("429 from upstream")),
    ));
    let coordinator = build(executor.clone());
    let input = PipelineInput::new("TP53", "TYMS", "thymidylate synthase", "cancer");

    let result = coordinator.run(&input).await.unwrap();

    assert!(result.interactions.is_empty());
    assert_eq!(coordinator.current_phase(), Some(Phase::Done));
    assert_step_calls(&executor, StepName::FindDrugs, 1);
    assert_step_calls(&executor, StepName::SearchTrials, 1);
    assert_step_calls(&executor, StepName::ValidateSyntheticLethality, 1);

    let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
    assert_eq!(json["interactions"], serde_json::json!([]));
}

#[tokio::test(start_paused = true)]
async fn both_anchors_not_found_is_fatal() {
    let executor = Arc::new(ScriptedExecutor::new().on(
        StepName::ResolveEntity,
        ScriptedReply::err(StepError::entity_not_found("no HGNC record")),
    ));
    let coordinator = build(executor.clone());

    let err = coordinator.run(&fixtures::input()).await.unwrap_err();

    assert!(matches!(err, PhaseflowError::AnchorFailed(_)));
    assert_step_calls(&executor, StepName::EnrichProtein, 0);
    assert_eq!(executor.call_count(), 2);
    assert!(coordinator
        .failures()
        .iter()
        .all(|f| f.class == ErrorClass::NonRetryable && f.attempts == 1));
}

#[test]
fn populated_result_round_trips() {
    let result = fixtures::full_result();
    let json = result.to_json().unwrap();
    let back = PipelineResult::from_json(&json).unwrap();

    assert_eq!(back, result);
    assert_eq!(
        serde_json::to_value(&back).unwrap(),
        serde_json::to_value(&result).unwrap()
    );
}

#[tokio::test(start_paused = true)]
async fn maximally_degraded_run_keeps_schema() {
    let executor = Arc::new(ScriptedExecutor::new().on_request(
        StepRequest::ResolveEntity {
            symbol: "TYMS".to_string(),
        },
        ScriptedReply::ok(fixtures::tyms_resolution()),
    ));
    let coordinator = build(executor);

    let result = coordinator.run(&fixtures::input()).await.unwrap();

    assert!(result.entity_a.is_none());
    assert!(result.validations.is_empty());
    assert_stable_schema(&result);
}
