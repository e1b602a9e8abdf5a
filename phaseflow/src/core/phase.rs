//! The five-phase state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::PhaseflowError;

/// A position in the pipeline.
///
/// Phases run strictly in declaration order; `Done` is terminal and is
/// reached even when intermediate phases degraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Resolve both entities to canonical identifiers.
    Anchor,
    /// Fetch protein context for resolved entities.
    Enrich,
    /// Expand the interaction network around the second entity.
    Expand,
    /// Find drugs for the target, then trials for the first drug.
    Traverse,
    /// Verify the claims gathered so far.
    Validate,
    /// Terminal.
    Done,
}

impl Phase {
    /// Returns the phase that follows this one, or `None` for `Done`.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Anchor => Some(Self::Enrich),
            Self::Enrich => Some(Self::Expand),
            Self::Expand => Some(Self::Traverse),
            Self::Traverse => Some(Self::Validate),
            Self::Validate => Some(Self::Done),
            Self::Done => None,
        }
    }

    /// Returns true for the terminal phase.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done)
    }

    /// The short name used in step ids and events.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anchor => "anchor",
            Self::Enrich => "enrich",
            Self::Expand => "expand",
            Self::Traverse => "traverse",
            Self::Validate => "validate",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks the coordinator's position and rejects out-of-order moves.
#[derive(Debug, Clone)]
pub struct PhaseTracker {
    current: Option<Phase>,
}

impl PhaseTracker {
    /// Creates a tracker that has not entered any phase yet.
    #[must_use]
    pub fn new() -> Self {
        Self { current: None }
    }

    /// The phase currently running, if any.
    #[must_use]
    pub fn current(&self) -> Option<Phase> {
        self.current
    }

    /// Enters `to`, which must be the successor of the current phase
    /// (or `Anchor` from the initial state).
    pub fn advance(&mut self, to: Phase) -> Result<(), PhaseflowError> {
        let expected = match self.current {
            None => Some(Phase::Anchor),
            Some(phase) => phase.next(),
        };

        if expected == Some(to) {
            self.current = Some(to);
            Ok(())
        } else {
            Err(PhaseflowError::InvalidTransition {
                from: self
                    .current
                    .map_or_else(|| "start".to_string(), |p| p.to_string()),
                to: to.to_string(),
            })
        }
    }
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}
