//! Phase coordinator: sequences the five phases and merges their outputs.
//!
//! Phases run strictly one after another. Inside a phase the coordinator
//! fans calls out, waits for every one of them to settle, then merges the
//! tagged outcomes into the [`ResultAggregator`]. A failed step never
//! escapes its phase; the only hard stop is when neither entity resolves.

use futures::future::join_all;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::failure::{FailureCollector, FailureRecord};
use super::input::PipelineInput;
use super::invoker::StepInvoker;
use super::result::{PipelineResult, ResultAggregator};
use crate::core::{Phase, PhaseTracker, StepOutcome};
use crate::errors::{AnchorFailedError, PhaseflowError};
use crate::events::{names, EventSink, NoOpEventSink};
use crate::executor::StepExecutor;
use crate::journal::{AttemptJournal, InMemoryJournal};
use crate::models::{
    Drug, GeneResolution, InteractionReply, ProteinContext, Trial, ValidationEvidence,
};
use crate::policy::OrchestratorConfig;
use crate::steps::{gene_claim, mechanism_claim, StepKey, StepRequest};
use crate::utils::RunId;

/// Which of the two pipeline entities a call is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    A,
    B,
}

impl Side {
    fn entity_slot(self) -> &'static str {
        match self {
            Self::A => "entity-a",
            Self::B => "entity-b",
        }
    }

    fn protein_slot(self) -> &'static str {
        match self {
            Self::A => "protein-a",
            Self::B => "protein-b",
        }
    }

    fn gene_slot(self) -> &'static str {
        match self {
            Self::A => "gene-a",
            Self::B => "gene-b",
        }
    }
}

/// Builder for [`PhaseCoordinator`].
#[derive(Default)]
pub struct PhaseCoordinatorBuilder {
    executor: Option<Arc<dyn StepExecutor>>,
    config: OrchestratorConfig,
    journal: Option<Arc<dyn AttemptJournal>>,
    events: Option<Arc<dyn EventSink>>,
    run_id: Option<RunId>,
}

impl PhaseCoordinatorBuilder {
    /// Sets the step executor. Required.
    #[must_use]
    pub fn executor(mut self, executor: Arc<dyn StepExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the attempt journal. Defaults to an in-memory journal.
    #[must_use]
    pub fn journal(mut self, journal: Arc<dyn AttemptJournal>) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Sets the event sink. Defaults to a no-op sink.
    #[must_use]
    pub fn event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    /// Reuses an existing run id, resuming that run from the journal.
    #[must_use]
    pub fn run_id(mut self, run_id: RunId) -> Self {
        self.run_id = Some(run_id);
        self
    }

    /// Validates the configuration and builds the coordinator.
    pub fn build(self) -> Result<PhaseCoordinator, PhaseflowError> {
        let executor = self
            .executor
            .ok_or_else(|| PhaseflowError::Config("a step executor is required".to_string()))?;
        self.config.validate()?;

        let journal = self
            .journal
            .unwrap_or_else(|| Arc::new(InMemoryJournal::new()));
        let events = self.events.unwrap_or_else(|| Arc::new(NoOpEventSink));
        let run_id = self.run_id.unwrap_or_default();

        if !journal.is_durable() {
            debug!(run_id = %run_id, "Attempt journal is in-memory; a crash loses retry state");
        }

        Ok(PhaseCoordinator {
            invoker: StepInvoker::new(
                executor,
                self.config.timeouts.clone(),
                journal,
                events.clone(),
                run_id,
            ),
            config: self.config,
            events,
            run_id,
            aggregator: ResultAggregator::new(),
            tracker: Mutex::new(PhaseTracker::new()),
            failures: Mutex::new(FailureCollector::new()),
        })
    }
}

/// Drives one pipeline run.
pub struct PhaseCoordinator {
    invoker: StepInvoker,
    config: OrchestratorConfig,
    events: Arc<dyn EventSink>,
    run_id: RunId,
    aggregator: ResultAggregator,
    tracker: Mutex<PhaseTracker>,
    failures: Mutex<FailureCollector>,
}

impl PhaseCoordinator {
    /// Starts building a coordinator.
    #[must_use]
    pub fn builder() -> PhaseCoordinatorBuilder {
        PhaseCoordinatorBuilder::default()
    }

    /// The run id journal records are stored under.
    #[must_use]
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// The in-flight result. Safe to call while [`run`](Self::run) is executing.
    #[must_use]
    pub fn snapshot(&self) -> PipelineResult {
        self.aggregator.snapshot()
    }

    /// The phase the run is in, or `None` before it starts.
    #[must_use]
    pub fn current_phase(&self) -> Option<Phase> {
        self.tracker.lock().current()
    }

    /// Steps that degraded so far.
    #[must_use]
    pub fn failures(&self) -> Vec<FailureRecord> {
        self.failures.lock().failures().to_vec()
    }

    /// Runs every phase and returns the final result.
    ///
    /// A coordinator runs once; calling this again is an invalid transition.
    pub async fn run(&self, input: &PipelineInput) -> Result<PipelineResult, PhaseflowError> {
        info!(
            run_id = %self.run_id,
            entity_a = %input.entity_a,
            entity_b = %input.entity_b,
            "Pipeline started"
        );
        self.enter(Phase::Anchor).await?;
        self.events
            .emit(
                names::PIPELINE_STARTED,
                Some(serde_json::json!({
                    "run_id": self.run_id.to_string(),
                    "input": input,
                })),
            )
            .await;

        self.anchor(input).await?;
        self.finish(Phase::Anchor).await;

        self.enter(Phase::Enrich).await?;
        self.enrich().await;
        self.finish(Phase::Enrich).await;

        self.enter(Phase::Expand).await?;
        self.expand(input).await;
        self.finish(Phase::Expand).await;

        self.enter(Phase::Traverse).await?;
        self.traverse(input).await;
        self.finish(Phase::Traverse).await;

        self.enter(Phase::Validate).await?;
        self.validate(input).await;
        self.finish(Phase::Validate).await;

        self.tracker.lock().advance(Phase::Done)?;
        let result = self.aggregator.snapshot();
        let failures = self.failures.lock().len();
        info!(
            run_id = %self.run_id,
            failures,
            validations = result.validations.len(),
            "Pipeline completed"
        );
        self.events
            .emit(
                names::PIPELINE_COMPLETED,
                Some(serde_json::json!({
                    "run_id": self.run_id.to_string(),
                    "failures": failures,
                })),
            )
            .await;
        Ok(result)
    }

    async fn anchor(&self, input: &PipelineInput) -> Result<(), PhaseflowError> {
        let resolve = move |side: Side, symbol: &str| {
            let key = StepKey::new(Phase::Anchor, side.entity_slot());
            let request = StepRequest::ResolveEntity {
                symbol: symbol.to_string(),
            };
            async move {
                let outcome = self.invoker.invoke::<GeneResolution>(&key, &request).await;
                (key, request, outcome)
            }
        };

        let (a, b) = tokio::join!(
            resolve(Side::A, &input.entity_a),
            resolve(Side::B, &input.entity_b)
        );

        let reason_a = a.2.failure().map(ToString::to_string);
        let reason_b = b.2.failure().map(ToString::to_string);
        let entity_a = self.absorb(Phase::Anchor, a);
        let entity_b = self.absorb(Phase::Anchor, b);

        if let (Some(reason_a), Some(reason_b)) = (reason_a, reason_b) {
            let failure = AnchorFailedError {
                entity_a: input.entity_a.clone(),
                reason_a,
                entity_b: input.entity_b.clone(),
                reason_b,
                snapshot: Box::new(self.aggregator.snapshot()),
            };
            error!(run_id = %self.run_id, "{failure}");
            self.events
                .emit(
                    names::PIPELINE_FAILED,
                    Some(serde_json::json!({
                        "run_id": self.run_id.to_string(),
                        "phase": Phase::Anchor,
                        "error": failure.to_string(),
                    })),
                )
                .await;
            return Err(failure.into());
        }

        self.aggregator.set_entities(entity_a, entity_b);
        Ok(())
    }

    async fn enrich(&self) {
        let snapshot = self.aggregator.snapshot();
        let targets = [(Side::A, snapshot.entity_a), (Side::B, snapshot.entity_b)]
            .into_iter()
            .filter_map(|(side, gene)| {
                let curie = gene.as_ref().and_then(GeneResolution::protein_curie);
                if curie.is_none() {
                    debug!(slot = side.protein_slot(), "No protein cross-reference; skipping enrichment");
                }
                curie.map(|curie| (side, curie))
            });

        let calls = targets.map(|(side, curie)| async move {
            let key = StepKey::new(Phase::Enrich, side.protein_slot());
            let request = StepRequest::EnrichProtein {
                id: curie.to_string(),
            };
            let outcome = self.invoker.invoke::<ProteinContext>(&key, &request).await;
            (side, (key, request, outcome))
        });

        let (mut protein_a, mut protein_b) = (None, None);
        for (side, settled) in join_all(calls).await {
            let context = self.absorb(Phase::Enrich, settled);
            match side {
                Side::A => protein_a = context,
                Side::B => protein_b = context,
            }
        }
        self.aggregator.set_proteins(protein_a, protein_b);
    }

    async fn expand(&self, input: &PipelineInput) {
        let interactions = self
            .call::<InteractionReply>(
                Phase::Expand,
                StepKey::new(Phase::Expand, "interactions"),
                StepRequest::ExpandInteractions {
                    symbol: input.entity_b.clone(),
                },
            )
            .await
            .map(InteractionReply::into_vec)
            .unwrap_or_default();
        self.aggregator.set_interactions(interactions);
    }

    async fn traverse(&self, input: &PipelineInput) {
        let drugs: Vec<Drug> = self
            .call(
                Phase::Traverse,
                StepKey::new(Phase::Traverse, "drugs"),
                StepRequest::FindDrugs {
                    target_name: input.target_name.clone(),
                },
            )
            .await
            .unwrap_or_default();

        let drug_name = if let Some(first) = drugs.first() {
            first.name.clone()
        } else {
            warn!(
                run_id = %self.run_id,
                target_name = %input.target_name,
                "No drugs found; searching trials by target name"
            );
            self.events
                .emit(
                    names::TRAVERSE_FALLBACK,
                    Some(serde_json::json!({
                        "run_id": self.run_id.to_string(),
                        "query": input.target_name,
                    })),
                )
                .await;
            input.target_name.clone()
        };
        self.aggregator.set_drugs(drugs);

        let trials: Vec<Trial> = self
            .call(
                Phase::Traverse,
                StepKey::new(Phase::Traverse, "trials"),
                StepRequest::SearchTrials {
                    drug_name,
                    condition: input.condition.clone(),
                },
            )
            .await
            .unwrap_or_default();
        self.aggregator.set_trials(trials);
    }

    async fn validate(&self, input: &PipelineInput) {
        let snapshot = self.aggregator.snapshot();
        let mut requests = Vec::new();

        for (side, symbol, gene) in [
            (Side::A, &input.entity_a, &snapshot.entity_a),
            (Side::B, &input.entity_b, &snapshot.entity_b),
        ] {
            if let Some(gene) = gene {
                requests.push((
                    StepKey::new(Phase::Validate, side.gene_slot()),
                    StepRequest::ValidateGene {
                        claim: gene_claim(symbol, gene),
                    },
                ));
            }
        }

        for (index, drug) in snapshot
            .drugs
            .iter()
            .take(self.config.validate.max_mechanism_validations)
            .enumerate()
        {
            requests.push((
                StepKey::new(Phase::Validate, format!("mechanism-{}", index + 1)),
                StepRequest::ValidateMechanism {
                    claim: mechanism_claim(drug),
                },
            ));
        }

        if let Some(trial) = snapshot.trials.first() {
            let trial_id = trial
                .curie()
                .map_or_else(|| trial.id.clone(), |curie| curie.to_string());
            requests.push((
                StepKey::new(Phase::Validate, "trial"),
                StepRequest::ValidateTrial { trial_id },
            ));
        }

        requests.push((
            StepKey::new(Phase::Validate, "synthetic-lethality"),
            StepRequest::ValidateSyntheticLethality {
                entity_a: input.entity_a.clone(),
                entity_b: input.entity_b.clone(),
            },
        ));

        debug!(run_id = %self.run_id, calls = requests.len(), "Issuing validations");
        let calls = requests.into_iter().map(|(key, request)| async move {
            let outcome = self
                .invoker
                .invoke::<ValidationEvidence>(&key, &request)
                .await;
            (key, request, outcome)
        });

        let validations = join_all(calls)
            .await
            .into_iter()
            .filter_map(|settled| self.absorb(Phase::Validate, settled))
            .collect();
        self.aggregator.set_validations(validations);
    }

    /// Invokes a single step and absorbs its failure.
    async fn call<T>(&self, phase: Phase, key: StepKey, request: StepRequest) -> Option<T>
    where
        T: serde::de::DeserializeOwned + Send,
    {
        let outcome = self.invoker.invoke::<T>(&key, &request).await;
        self.absorb(phase, (key, request, outcome))
    }

    /// Records a failed outcome and returns the record of a successful one.
    fn absorb<T>(&self, phase: Phase, settled: (StepKey, StepRequest, StepOutcome<T>)) -> Option<T> {
        let (key, request, outcome) = settled;
        match outcome {
            StepOutcome::Success(value) => Some(value),
            StepOutcome::Failure(failure) => {
                self.failures
                    .lock()
                    .record(FailureRecord::new(phase, key, request.name(), &failure));
                None
            }
        }
    }

    async fn enter(&self, phase: Phase) -> Result<(), PhaseflowError> {
        self.tracker.lock().advance(phase)?;
        info!(run_id = %self.run_id, phase = %phase, "Phase started");
        self.events
            .emit(
                names::PHASE_STARTED,
                Some(serde_json::json!({
                    "run_id": self.run_id.to_string(),
                    "phase": phase,
                })),
            )
            .await;
        Ok(())
    }

    async fn finish(&self, phase: Phase) {
        let degraded: Vec<serde_json::Value> = self
            .failures
            .lock()
            .for_phase(phase)
            .into_iter()
            .map(FailureRecord::to_event_data)
            .collect();

        if !degraded.is_empty() {
            warn!(
                run_id = %self.run_id,
                phase = %phase,
                failed_steps = degraded.len(),
                "Phase degraded"
            );
            self.events
                .emit(
                    names::PHASE_DEGRADED,
                    Some(serde_json::json!({
                        "run_id": self.run_id.to_string(),
                        "phase": phase,
                        "failures": degraded,
                    })),
                )
                .await;
        }

        info!(run_id = %self.run_id, phase = %phase, "Phase completed");
        self.events
            .emit(
                names::PHASE_COMPLETED,
                Some(serde_json::json!({
                    "run_id": self.run_id.to_string(),
                    "phase": phase,
                    "degraded": !degraded.is_empty(),
                })),
            )
            .await;
    }
}

impl std::fmt::Debug for PhaseCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseCoordinator")
            .field("run_id", &self.run_id)
            .field("phase", &self.current_phase())
            .field("invoker", &self.invoker)
            .finish_non_exhaustive()
    }
}
