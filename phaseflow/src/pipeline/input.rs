//! Pipeline input.

use serde::{Deserialize, Serialize};

/// The four strings a run starts from. Fixed for the lifetime of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineInput {
    /// First gene symbol.
    pub entity_a: String,
    /// Second gene symbol; also the seed for interaction expansion.
    pub entity_b: String,
    /// Drug target name used by the traverse phase.
    pub target_name: String,
    /// Disease condition used for trial search.
    pub condition: String,
}

impl PipelineInput {
    /// Creates an input from its four parts.
    #[must_use]
    pub fn new(
        entity_a: impl Into<String>,
        entity_b: impl Into<String>,
        target_name: impl Into<String>,
        condition: impl Into<String>,
    ) -> Self {
        Self {
            entity_a: entity_a.into(),
            entity_b: entity_b.into(),
            target_name: target_name.into(),
            condition: condition.into(),
        }
    }
}

impl Default for PipelineInput {
    fn default() -> Self {
        Self::new("TP53", "TYMS", "thymidylate synthase", "cancer")
    }
}
