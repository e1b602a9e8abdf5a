//! Step invoker: one step call with timeouts, retries and journaling.

use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::{StepFailure, StepOutcome};
use crate::errors::{ErrorClass, StepError};
use crate::events::{names, EventSink};
use crate::executor::StepExecutor;
use crate::journal::{AttemptJournal, StepRecord, StepState};
use crate::observability::{AttemptResult, SpanTimer, StepAttemptLog};
use crate::policy::{RetryDecision, TimeoutRegistry, TimeoutTier};
use crate::steps::{StepKey, StepName, StepRequest};
use crate::utils::{fingerprint, RunId};

/// What the journal already knows about a step.
enum Loaded {
    Succeeded(serde_json::Value),
    Failed(StepFailure),
    Pending(StepRecord),
}

/// Wraps executor calls with the tier's timeouts and retry policy.
///
/// Every attempt is journaled before the call is made, so a resumed run
/// continues the attempt count instead of starting over.
pub struct StepInvoker {
    executor: Arc<dyn StepExecutor>,
    timeouts: TimeoutRegistry,
    journal: Arc<dyn AttemptJournal>,
    events: Arc<dyn EventSink>,
    run_id: RunId,
}

impl StepInvoker {
    /// Creates an invoker.
    #[must_use]
    pub fn new(
        executor: Arc<dyn StepExecutor>,
        timeouts: TimeoutRegistry,
        journal: Arc<dyn AttemptJournal>,
        events: Arc<dyn EventSink>,
        run_id: RunId,
    ) -> Self {
        Self {
            executor,
            timeouts,
            journal,
            events,
            run_id,
        }
    }

    /// The run this invoker journals under.
    #[must_use]
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Invokes `request` until it succeeds, the policy stops it, or the
    /// tier's total budget runs out.
    ///
    /// The returned record is decoded into `T`; a record that does not decode
    /// is a schema-validation failure for that attempt.
    pub async fn invoke<T>(&self, key: &StepKey, request: &StepRequest) -> StepOutcome<T>
    where
        T: DeserializeOwned + Send,
    {
        let step = request.name();

        if let Err(error) = request.validate() {
            let failure = StepFailure::from_error(&error, ErrorClass::NonRetryable, 0);
            self.report_failure(key, step, &failure).await;
            return StepOutcome::Failure(failure);
        }

        let tier = self.timeouts.lookup(request.category());
        let mut record = match self.load(key, step, &fingerprint(request)).await {
            Loaded::Succeeded(value) => return self.replay_success(key, step, value).await,
            Loaded::Failed(failure) => {
                self.emit_replayed(key, step, "failure").await;
                return StepOutcome::Failure(failure);
            }
            Loaded::Pending(record) => record,
        };

        if record.attempts >= tier.retry.max_attempts {
            let error = StepError::connection(format!(
                "all {} attempts were spent by an interrupted run",
                record.attempts
            ));
            let class = tier.retry.classify(&error);
            let failure = StepFailure::from_error(&error, class, record.attempts);
            return self.settle_failure(key, step, &record, failure).await;
        }

        let attempts = tokio::time::timeout(
            tier.total_budget(),
            self.attempt_loop::<T>(key, request, tier, &mut record),
        )
        .await;

        match attempts {
            Ok(Ok((value, raw))) => {
                self.save(&record.settled(StepState::Succeeded { value: raw }))
                    .await;
                self.events
                    .emit(
                        names::STEP_SUCCEEDED,
                        Some(serde_json::json!({
                            "run_id": self.run_id.to_string(),
                            "step_id": key,
                            "step": step,
                            "attempts": record.attempts,
                        })),
                    )
                    .await;
                StepOutcome::Success(value)
            }
            Ok(Err(failure)) => self.settle_failure(key, step, &record, failure).await,
            Err(_) => {
                let error = StepError::timeout(format!(
                    "total budget of {}ms exhausted",
                    tier.total_budget_ms
                ));
                let class = tier.retry.classify(&error);
                let failure = StepFailure::from_error(&error, class, record.attempts);
                self.settle_failure(key, step, &record, failure).await
            }
        }
    }

    async fn attempt_loop<T: DeserializeOwned + Send>(
        &self,
        key: &StepKey,
        request: &StepRequest,
        tier: &TimeoutTier,
        record: &mut StepRecord,
    ) -> Result<(T, serde_json::Value), StepFailure> {
        let step = request.name();
        let policy = &tier.retry;

        loop {
            let attempt = record.attempts + 1;
            *record = record.with_attempt(attempt);
            self.save(record).await;

            let timer = SpanTimer::start(step.as_str());
            let called =
                tokio::time::timeout(tier.per_attempt_timeout(), self.executor.execute(request))
                    .await;
            let elapsed_ms = timer.finish();

            let (error, timed_out) = match called {
                Ok(Ok(raw)) => match serde_json::from_value::<T>(raw.clone()) {
                    Ok(value) => {
                        self.log_attempt(key, step, attempt, elapsed_ms, AttemptResult::Succeeded)
                            .await;
                        return Ok((value, raw));
                    }
                    Err(e) => (
                        StepError::schema_validation(format!("{step} returned a malformed record: {e}")),
                        false,
                    ),
                },
                Ok(Err(error)) => (error, false),
                Err(_) => (
                    StepError::timeout(format!(
                        "attempt exceeded {}ms",
                        tier.per_attempt_timeout_ms
                    )),
                    true,
                ),
            };

            let class = policy.classify(&error);
            let result = if timed_out {
                AttemptResult::TimedOut
            } else {
                AttemptResult::Failed {
                    code: error.code.clone(),
                    class,
                }
            };
            self.log_attempt(key, step, attempt, elapsed_ms, result).await;

            match policy.decide(attempt, class) {
                RetryDecision::Stop => return Err(StepFailure::from_error(&error, class, attempt)),
                RetryDecision::RetryAfter(delay) => {
                    let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
                    debug!(step_id = %key, attempt, delay_ms, "Retrying step");
                    self.events
                        .emit(
                            names::STEP_RETRY_SCHEDULED,
                            Some(serde_json::json!({
                                "run_id": self.run_id.to_string(),
                                "step_id": key,
                                "step": step,
                                "attempt": attempt,
                                "delay_ms": delay_ms,
                                "error": error.to_dict(),
                            })),
                        )
                        .await;
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn load(&self, key: &StepKey, step: StepName, fingerprint: &str) -> Loaded {
        let run_id = self.run_id.to_string();
        let fresh = || StepRecord::new(run_id.clone(), key.clone(), step, fingerprint);

        match self.journal.load(&run_id, key).await {
            Ok(Some(record)) if record.fingerprint == fingerprint && record.step == step => {
                match record.state {
                    StepState::Succeeded { value } => Loaded::Succeeded(value),
                    StepState::Failed { failure } => Loaded::Failed(failure),
                    StepState::InProgress => {
                        info!(
                            step_id = %key,
                            attempts = record.attempts,
                            "Resuming interrupted step"
                        );
                        Loaded::Pending(record)
                    }
                }
            }
            Ok(Some(_)) => {
                warn!(step_id = %key, "Discarding journal record for a different request");
                Loaded::Pending(fresh())
            }
            Ok(None) => Loaded::Pending(fresh()),
            Err(e) => {
                warn!(step_id = %key, error = %e, "Journal lookup failed; running step without replay");
                Loaded::Pending(fresh())
            }
        }
    }

    async fn save(&self, record: &StepRecord) {
        if let Err(e) = self.journal.save(record).await {
            warn!(step_id = %record.step_id, error = %e, "Failed to journal step state");
        }
    }

    async fn replay_success<T: DeserializeOwned + Send>(
        &self,
        key: &StepKey,
        step: StepName,
        value: serde_json::Value,
    ) -> StepOutcome<T> {
        match serde_json::from_value(value) {
            Ok(value) => {
                self.emit_replayed(key, step, "success").await;
                StepOutcome::Success(value)
            }
            Err(e) => {
                let error = StepError::schema_validation(format!("journaled record no longer decodes: {e}"));
                let failure = StepFailure::from_error(&error, ErrorClass::NonRetryable, 0);
                self.report_failure(key, step, &failure).await;
                StepOutcome::Failure(failure)
            }
        }
    }

    async fn settle_failure<T>(
        &self,
        key: &StepKey,
        step: StepName,
        record: &StepRecord,
        failure: StepFailure,
    ) -> StepOutcome<T> {
        self.save(&record.settled(StepState::Failed {
            failure: failure.clone(),
        }))
        .await;
        self.report_failure(key, step, &failure).await;
        StepOutcome::Failure(failure)
    }

    async fn report_failure(&self, key: &StepKey, step: StepName, failure: &StepFailure) {
        warn!(
            run_id = %self.run_id,
            step_id = %key,
            step = %step,
            error_code = %failure.code,
            error_class = %failure.class,
            attempts = failure.attempts,
            "Step failed: {}",
            failure.message
        );
        self.events
            .emit(
                names::STEP_FAILED,
                Some(serde_json::json!({
                    "run_id": self.run_id.to_string(),
                    "step_id": key,
                    "step": step,
                    "failure": failure,
                })),
            )
            .await;
    }

    async fn emit_replayed(&self, key: &StepKey, step: StepName, outcome: &str) {
        info!(step_id = %key, step = %step, outcome, "Replaying journaled step");
        self.events
            .emit(
                names::STEP_REPLAYED,
                Some(serde_json::json!({
                    "run_id": self.run_id.to_string(),
                    "step_id": key,
                    "step": step,
                    "outcome": outcome,
                })),
            )
            .await;
    }

    async fn log_attempt(
        &self,
        key: &StepKey,
        step: StepName,
        attempt: u32,
        elapsed_ms: f64,
        outcome: AttemptResult,
    ) {
        let entry = StepAttemptLog {
            run_id: self.run_id.to_string(),
            step_id: key.to_string(),
            step,
            attempt,
            elapsed_ms,
            outcome,
        };
        entry.log();
        self.events
            .emit(names::STEP_ATTEMPT, Some(entry.to_event_data()))
            .await;
    }
}

impl std::fmt::Debug for StepInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepInvoker")
            .field("run_id", &self.run_id)
            .field("timeouts", &self.timeouts)
            .field("durable", &self.journal.is_durable())
            .finish_non_exhaustive()
    }
}
