//! Scripted executor for exercising the orchestrator without a gateway.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;

use crate::errors::StepError;
use crate::executor::StepExecutor;
use crate::steps::{StepName, StepRequest};

/// What a scripted call does.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Return this record.
    Ok(serde_json::Value),
    /// Fail with this error.
    Err(StepError),
    /// Never return; only a timeout ends the call.
    Hang,
}

impl ScriptedReply {
    /// Succeeds with `value` serialized to JSON.
    pub fn ok(value: impl Serialize) -> Self {
        Self::Ok(serde_json::to_value(value).unwrap_or(serde_json::Value::Null))
    }

    /// Fails with `error`.
    pub fn err(error: StepError) -> Self {
        Self::Err(error)
    }

    /// Hangs forever.
    pub fn hang() -> Self {
        Self::Hang
    }
}

#[derive(Debug)]
enum Matcher {
    Step(StepName),
    Request(StepRequest),
}

#[derive(Debug)]
struct Rule {
    matcher: Matcher,
    queued: VecDeque<ScriptedReply>,
    fallback: ScriptedReply,
}

/// An executor that answers from a script and records every call.
///
/// Rules registered for an exact request win over rules for a step name;
/// among rules of the same kind, the latest registration wins. Calls with no
/// matching rule fail with `ENTITY_NOT_FOUND`.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<StepRequest>>,
    delay: Option<Duration>,
}

impl ScriptedExecutor {
    /// Creates an executor with no rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers every call to `step` with `reply`.
    #[must_use]
    pub fn on(self, step: StepName, reply: ScriptedReply) -> Self {
        self.push(Matcher::Step(step), Vec::new(), reply)
    }

    /// Answers calls equal to `request` with `reply`.
    #[must_use]
    pub fn on_request(self, request: StepRequest, reply: ScriptedReply) -> Self {
        self.push(Matcher::Request(request), Vec::new(), reply)
    }

    /// Answers calls to `step` with `replies` in order; the last one repeats.
    #[must_use]
    pub fn on_sequence(self, step: StepName, mut replies: Vec<ScriptedReply>) -> Self {
        let fallback = replies
            .pop()
            .unwrap_or_else(|| ScriptedReply::err(StepError::entity_not_found("empty script")));
        self.push(Matcher::Step(step), replies, fallback)
    }

    /// Delays every call by `delay` before answering.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn push(self, matcher: Matcher, queued: Vec<ScriptedReply>, fallback: ScriptedReply) -> Self {
        self.rules.lock().push(Rule {
            matcher,
            queued: queued.into(),
            fallback,
        });
        self
    }

    /// Every call received, in arrival order.
    #[must_use]
    pub fn calls(&self) -> Vec<StepRequest> {
        self.calls.lock().clone()
    }

    /// Total calls received.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Calls received for `step`.
    #[must_use]
    pub fn calls_for(&self, step: StepName) -> Vec<StepRequest> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.name() == step)
            .cloned()
            .collect()
    }

    fn next_reply(&self, request: &StepRequest) -> Option<ScriptedReply> {
        let mut rules = self.rules.lock();
        let by_request = rules
            .iter()
            .rposition(|rule| matches!(&rule.matcher, Matcher::Request(r) if r == request));
        let index = by_request.or_else(|| {
            rules
                .iter()
                .rposition(|rule| matches!(rule.matcher, Matcher::Step(s) if s == request.name()))
        })?;

        let rule = &mut rules[index];
        Some(rule.queued.pop_front().unwrap_or_else(|| rule.fallback.clone()))
    }
}

#[async_trait]
impl StepExecutor for ScriptedExecutor {
    async fn execute(&self, request: &StepRequest) -> Result<serde_json::Value, StepError> {
        self.calls.lock().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.next_reply(request) {
            Some(ScriptedReply::Ok(value)) => Ok(value),
            Some(ScriptedReply::Err(error)) => Err(error),
            Some(ScriptedReply::Hang) => std::future::pending().await,
            None => Err(StepError::entity_not_found(format!(
                "no scripted reply for {}",
                request.name()
            ))),
        }
    }
}
