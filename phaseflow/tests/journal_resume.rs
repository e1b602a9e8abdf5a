//! Resuming a run from a file journal.

use phaseflow::prelude::*;
use phaseflow::testing::{assert_step_calls, fixtures, ScriptedReply};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn interrupted_run_resumes_without_repeating_settled_steps() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.jsonl");
    let run_id = RunId::new();

    {
        let executor = Arc::new(
            fixtures::happy_executor().on(StepName::ValidateSyntheticLethality, ScriptedReply::hang()),
        );
        let coordinator = PhaseCoordinator::builder()
            .executor(executor.clone())
            .journal(Arc::new(FileJournal::open(&path).unwrap()))
            .run_id(run_id)
            .build()
            .unwrap();

        let interrupted =
            tokio::time::timeout(Duration::from_secs(60), coordinator.run(&fixtures::input())).await;
        assert!(interrupted.is_err());
        assert_eq!(coordinator.current_phase(), Some(Phase::Validate));
        assert_step_calls(&executor, StepName::ValidateSyntheticLethality, 1);
    }

    let executor = Arc::new(fixtures::happy_executor());
    let events = Arc::new(CollectingEventSink::new());
    let coordinator = PhaseCoordinator::builder()
        .executor(executor.clone())
        .journal(Arc::new(FileJournal::open(&path).unwrap()))
        .event_sink(events.clone())
        .run_id(run_id)
        .build()
        .unwrap();

    let result = coordinator.run(&fixtures::input()).await.unwrap();

    assert_eq!(executor.calls(), vec![StepRequest::ValidateSyntheticLethality {
        entity_a: "TP53".to_string(),
        entity_b: "TYMS".to_string(),
    }]);
    assert_eq!(result.drugs, fixtures::drugs());
    assert_eq!(result.validations.len(), 6);
    // 2 anchors, 2 enrich, expand, drugs, trials, 5 settled validations
    assert_eq!(events.events_of_type("step.replayed").len(), 12);
}

#[tokio::test(start_paused = true)]
async fn new_run_id_does_not_replay() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.jsonl");

    for _ in 0..2 {
        let executor = Arc::new(fixtures::happy_executor());
        let coordinator = PhaseCoordinator::builder()
            .executor(executor.clone())
            .journal(Arc::new(FileJournal::open(&path).unwrap()))
            .build()
            .unwrap();
        coordinator.run(&fixtures::input()).await.unwrap();
        assert_step_calls(&executor, StepName::ResolveEntity, 2);
    }
}
