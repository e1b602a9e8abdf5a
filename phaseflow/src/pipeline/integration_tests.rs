//! End-to-end coordinator tests against a scripted executor.

#[cfg(test)]
mod tests {
    use crate::core::Phase;
    use crate::errors::{ErrorClass, ErrorCode, PhaseflowError, StepError};
    use crate::events::{names, CollectingEventSink};
    use crate::models::CrossReferences;
    use crate::pipeline::{PhaseCoordinator, PipelineInput};
    use crate::policy::OrchestratorConfig;
    use crate::steps::{StepName, StepRequest};
    use crate::testing::{
        assert_degraded, assert_events_in_order, assert_stable_schema, assert_step_calls,
        fixtures, ScriptedExecutor, ScriptedReply,
    };
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn coordinator(executor: &Arc<ScriptedExecutor>) -> PhaseCoordinator {
        PhaseCoordinator::builder()
            .executor(executor.clone())
            .build()
            .unwrap()
    }

    fn resolve(symbol: &str) -> StepRequest {
        StepRequest::ResolveEntity {
            symbol: symbol.to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_happy_path_populates_everything() {
        let executor = Arc::new(fixtures::happy_executor());
        let coordinator = coordinator(&executor);

        let result = coordinator.run(&fixtures::input()).await.unwrap();

        assert_eq!(result.entity_a, Some(fixtures::tp53_resolution()));
        assert_eq!(result.entity_b, Some(fixtures::tyms_resolution()));
        assert_eq!(result.protein_a, Some(fixtures::tp53_protein()));
        assert_eq!(result.protein_b, Some(fixtures::tyms_protein()));
        assert_eq!(result.interactions, fixtures::interactions());
        assert_eq!(result.drugs, fixtures::drugs());
        assert_eq!(result.trials, fixtures::trials());
        // two genes, two mechanisms, one trial, one synthetic-lethality claim
        assert_eq!(result.validations.len(), 6);

        assert_eq!(coordinator.current_phase(), Some(Phase::Done));
        assert!(coordinator.failures().is_empty());
        assert_stable_schema(&result);
    }

    #[tokio::test(start_paused = true)]
    async fn test_downstream_arguments_are_derived_from_upstream() {
        let executor = Arc::new(fixtures::happy_executor());
        coordinator(&executor).run(&fixtures::input()).await.unwrap();

        assert_eq!(
            executor.calls_for(StepName::SearchTrials),
            vec![StepRequest::SearchTrials {
                drug_name: "FLUOROURACIL".to_string(),
                condition: "cancer".to_string(),
            }]
        );
        assert_eq!(
            executor.calls_for(StepName::ValidateTrial),
            vec![StepRequest::ValidateTrial {
                trial_id: "NCT:00461032".to_string(),
            }]
        );
        assert_eq!(
            executor.calls_for(StepName::ExpandInteractions),
            vec![StepRequest::ExpandInteractions {
                symbol: "TYMS".to_string(),
            }]
        );

        let gene_claims: Vec<_> = executor
            .calls_for(StepName::ValidateGene)
            .into_iter()
            .map(|call| match call {
                StepRequest::ValidateGene { claim } => claim,
                other => panic!("unexpected call {other:?}"),
            })
            .collect();
        assert!(gene_claims.contains(&"TP53: HGNC=HGNC:11998, Entrez=7157".to_string()));
        assert!(gene_claims.contains(&"TYMS: HGNC=HGNC:12441, Entrez=7298".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mechanism_validations_are_capped() {
        let executor = Arc::new(fixtures::happy_executor());
        coordinator(&executor).run(&fixtures::input()).await.unwrap();
        assert_step_calls(&executor, StepName::ValidateMechanism, 2);

        let executor = Arc::new(fixtures::happy_executor());
        PhaseCoordinator::builder()
            .executor(executor.clone())
            .config(OrchestratorConfig::new().with_max_mechanism_validations(1))
            .build()
            .unwrap()
            .run(&fixtures::input())
            .await
            .unwrap();
        assert_step_calls(&executor, StepName::ValidateMechanism, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expand_failure_degrades_to_empty_list() {
        let executor = Arc::new(fixtures::happy_executor().on(
            StepName::ExpandInteractions,
            ScriptedReply::err(StepError::connection("gateway reset")),
        ));
        let coordinator = coordinator(&executor);

        let result = coordinator.run(&fixtures::input()).await.unwrap();

        assert!(result.interactions.is_empty());
        assert_eq!(result.drugs, fixtures::drugs());
        assert_eq!(result.validations.len(), 6);
        assert_eq!(coordinator.current_phase(), Some(Phase::Done));

        assert_step_calls(&executor, StepName::ExpandInteractions, 5);
        let failures = coordinator.failures();
        assert_degraded(&failures, "expand.interactions");
        assert_eq!(failures[0].class, ErrorClass::Retryable);
        assert_eq!(failures[0].attempts, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_both_anchors_failing_stops_before_enrich() {
        let executor = Arc::new(
            ScriptedExecutor::new()
                .on(
                    StepName::ResolveEntity,
                    ScriptedReply::err(StepError::entity_not_found("unknown symbol")),
                )
                .on(StepName::EnrichProtein, ScriptedReply::ok(fixtures::tp53_protein())),
        );
        let coordinator = coordinator(&executor);

        let err = coordinator.run(&fixtures::input()).await.unwrap_err();

        match err {
            PhaseflowError::AnchorFailed(failure) => {
                assert_eq!(failure.entity_a, "TP53");
                assert_eq!(failure.entity_b, "TYMS");
                assert!(failure.reason_a.contains("ENTITY_NOT_FOUND"));
                assert!(!failure.snapshot.has_anchor());
            }
            other => panic!("expected anchor failure, got {other}"),
        }
        assert_step_calls(&executor, StepName::ResolveEntity, 2);
        assert_eq!(executor.call_count(), 2);
        assert_eq!(coordinator.current_phase(), Some(Phase::Anchor));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_anchor_failure_continues() {
        let executor = Arc::new(fixtures::happy_executor().on_request(
            resolve("TP53"),
            ScriptedReply::err(StepError::ambiguous_query("too many matches")),
        ));
        let coordinator = coordinator(&executor);

        let result = coordinator.run(&fixtures::input()).await.unwrap();

        assert!(result.entity_a.is_none());
        assert!(result.protein_a.is_none());
        assert_eq!(result.protein_b, Some(fixtures::tyms_protein()));
        assert_step_calls(&executor, StepName::EnrichProtein, 1);
        assert_step_calls(&executor, StepName::ValidateGene, 1);
        assert_step_calls(&executor, StepName::ValidateSyntheticLethality, 1);
        assert_degraded(&coordinator.failures(), "anchor.entity-a");
    }

    #[tokio::test(start_paused = true)]
    async fn test_enrich_skips_entity_without_crossref() {
        let mut tyms = fixtures::tyms_resolution();
        tyms.crossrefs = CrossReferences::default();
        let executor = Arc::new(
            fixtures::happy_executor().on_request(resolve("TYMS"), ScriptedReply::ok(tyms)),
        );
        let coordinator = coordinator(&executor);

        let result = coordinator.run(&fixtures::input()).await.unwrap();

        assert!(result.entity_b.is_some());
        assert!(result.protein_b.is_none());
        assert_eq!(
            executor.calls_for(StepName::EnrichProtein),
            vec![StepRequest::EnrichProtein {
                id: "UniProtKB:P04637".to_string(),
            }]
        );
        assert!(coordinator.failures().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_flat_gateway_resolution_is_enriched() {
        let flat_tp53 = serde_json::json!({
            "hgnc_id": "HGNC:11998",
            "symbol": "TP53",
            "name": "tumor protein p53",
            "entrez_id": "7157",
            "uniprot_id": "P04637",
            "ensembl_id": null
        });
        let flat_tyms = serde_json::json!({
            "hgnc_id": "HGNC:12441",
            "symbol": "TYMS",
            "name": "thymidylate synthetase",
            "entrez_id": "7298",
            "uniprot_id": "P04818"
        });
        let executor = Arc::new(
            fixtures::happy_executor()
                .on_request(resolve("TP53"), ScriptedReply::ok(flat_tp53))
                .on_request(resolve("TYMS"), ScriptedReply::ok(flat_tyms)),
        );

        let result = coordinator(&executor).run(&fixtures::input()).await.unwrap();

        let enriched = executor.calls_for(StepName::EnrichProtein);
        assert_eq!(enriched.len(), 2);
        for id in ["UniProtKB:P04637", "UniProtKB:P04818"] {
            assert!(enriched.contains(&StepRequest::EnrichProtein { id: id.to_string() }));
        }
        assert_eq!(result.protein_a, Some(fixtures::tp53_protein()));
        assert_eq!(result.protein_b, Some(fixtures::tyms_protein()));
        assert_eq!(
            result.entity_a.and_then(|gene| gene.crossrefs.entrez),
            Some("7157".to_string())
        );

        let gene_claims: Vec<_> = executor
            .calls_for(StepName::ValidateGene)
            .into_iter()
            .map(|call| match call {
                StepRequest::ValidateGene { claim } => claim,
                other => panic!("unexpected call {other:?}"),
            })
            .collect();
        assert!(gene_claims.contains(&"TP53: HGNC=HGNC:11998, Entrez=7157".to_string()));
        assert!(gene_claims.contains(&"TYMS: HGNC=HGNC:12441, Entrez=7298".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrapped_interaction_reply_is_accepted() {
        let executor = Arc::new(fixtures::happy_executor().on(
            StepName::ExpandInteractions,
            ScriptedReply::ok(serde_json::json!({ "interactions": fixtures::interactions() })),
        ));
        let coordinator = coordinator(&executor);

        let result = coordinator.run(&fixtures::input()).await.unwrap();

        assert_eq!(result.interactions, fixtures::interactions());
        assert!(coordinator.failures().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_trials_fall_back_to_target_name() {
        let executor = Arc::new(
            fixtures::happy_executor().on(StepName::FindDrugs, ScriptedReply::ok(Vec::<u8>::new())),
        );
        let events = Arc::new(CollectingEventSink::new());
        let coordinator = PhaseCoordinator::builder()
            .executor(executor.clone())
            .event_sink(events.clone())
            .build()
            .unwrap();

        let result = coordinator.run(&fixtures::input()).await.unwrap();

        assert!(result.drugs.is_empty());
        assert_eq!(
            executor.calls_for(StepName::SearchTrials),
            vec![StepRequest::SearchTrials {
                drug_name: "thymidylate synthase".to_string(),
                condition: "cancer".to_string(),
            }]
        );
        assert_step_calls(&executor, StepName::ValidateMechanism, 0);
        assert_eq!(events.events_of_type(names::TRAVERSE_FALLBACK).len(), 1);
        assert!(coordinator.failures().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_synthetic_validation_always_issued() {
        let executor = Arc::new(
            ScriptedExecutor::new()
                .on_request(resolve("TP53"), ScriptedReply::ok(fixtures::tp53_resolution()))
                .on(
                    StepName::ValidateSyntheticLethality,
                    ScriptedReply::err(StepError::entity_not_found("no evidence")),
                ),
        );
        let coordinator = coordinator(&executor);

        let result = coordinator.run(&fixtures::input()).await.unwrap();

        assert_step_calls(&executor, StepName::ValidateSyntheticLethality, 1);
        assert_eq!(coordinator.current_phase(), Some(Phase::Done));
        assert!(result.interactions.is_empty());
        assert!(result.drugs.is_empty());
        assert!(result.trials.is_empty());
        // The TP53 gene check is unscripted and fails too; neither shows up.
        assert!(result.validations.is_empty());
        assert_degraded(&coordinator.failures(), "validate.synthetic-lethality");
        assert_stable_schema(&result);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unnormalizable_trial_id_is_rejected_without_call() {
        let mut trials = fixtures::trials();
        trials[0].id = "local trial 7".to_string();
        let executor = Arc::new(
            fixtures::happy_executor().on(StepName::SearchTrials, ScriptedReply::ok(trials)),
        );
        let coordinator = coordinator(&executor);

        let result = coordinator.run(&fixtures::input()).await.unwrap();

        assert_step_calls(&executor, StepName::ValidateTrial, 0);
        assert_eq!(result.validations.len(), 5);
        let failure = coordinator
            .failures()
            .into_iter()
            .find(|f| f.step == StepName::ValidateTrial)
            .unwrap();
        assert_eq!(failure.code, ErrorCode::UnresolvedEntity);
        assert_eq!(failure.attempts, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_phase_events_in_order() {
        let executor = Arc::new(fixtures::happy_executor().on(
            StepName::ExpandInteractions,
            ScriptedReply::err(StepError::schema_validation("bad record")),
        ));
        let events = Arc::new(CollectingEventSink::new());
        PhaseCoordinator::builder()
            .executor(executor)
            .event_sink(events.clone())
            .build()
            .unwrap()
            .run(&fixtures::input())
            .await
            .unwrap();

        assert_events_in_order(
            &events,
            &[
                names::PHASE_STARTED,
                names::PIPELINE_STARTED,
                names::PHASE_COMPLETED,
                names::PHASE_STARTED,
                names::PHASE_COMPLETED,
                names::PHASE_STARTED,
                names::STEP_FAILED,
                names::PHASE_DEGRADED,
                names::PHASE_COMPLETED,
                names::PHASE_STARTED,
                names::PHASE_COMPLETED,
                names::PHASE_STARTED,
                names::PHASE_COMPLETED,
                names::PIPELINE_COMPLETED,
            ],
        );
        assert_eq!(events.events_of_type(names::PHASE_DEGRADED).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_coordinator_runs_once() {
        let executor = Arc::new(fixtures::happy_executor());
        let coordinator = coordinator(&executor);
        coordinator.run(&fixtures::input()).await.unwrap();

        let err = coordinator
            .run(&PipelineInput::new("BRCA1", "PARP1", "poly ADP-ribose polymerase", "cancer"))
            .await
            .unwrap_err();
        assert!(matches!(err, PhaseflowError::InvalidTransition { .. }));
    }

    #[test]
    fn test_builder_requires_executor() {
        let err = PhaseCoordinator::builder().build().unwrap_err();
        assert!(matches!(err, PhaseflowError::Config(_)));
    }
}
