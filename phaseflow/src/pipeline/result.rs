//! The aggregated pipeline result.
//!
//! [`PipelineResult`] is the output document. Every field is always
//! present when serialized: absent resolutions are `null`, failed list
//! phases are `[]`. [`ResultAggregator`] is the single-writer store the
//! coordinator fills between fan-in barriers.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::errors::PhaseflowError;
use crate::models::{Drug, GeneResolution, Interaction, ProteinContext, Trial, ValidationEvidence};

/// Everything a run learned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineResult {
    /// Resolution of the first entity.
    pub entity_a: Option<GeneResolution>,
    /// Resolution of the second entity.
    pub entity_b: Option<GeneResolution>,
    /// Protein context of the first entity.
    pub protein_a: Option<ProteinContext>,
    /// Protein context of the second entity.
    pub protein_b: Option<ProteinContext>,
    /// Interaction partners of the second entity.
    pub interactions: Vec<Interaction>,
    /// Drugs acting on the target.
    pub drugs: Vec<Drug>,
    /// Trials for the first drug (or the target).
    pub trials: Vec<Trial>,
    /// Claims that were checked successfully.
    pub validations: Vec<ValidationEvidence>,
}

impl PipelineResult {
    /// Creates an empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if at least one entity resolved.
    #[must_use]
    pub fn has_anchor(&self) -> bool {
        self.entity_a.is_some() || self.entity_b.is_some()
    }

    /// Serializes to a pretty JSON document.
    pub fn to_json(&self) -> Result<String, PhaseflowError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a document produced by [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> Result<Self, PhaseflowError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Thread-safe holder for the in-flight result.
///
/// Setters replace whole fields so readers never observe a half-written
/// record.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    inner: RwLock<PipelineResult>,
}

impl ResultAggregator {
    /// Creates an aggregator holding an empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the anchor resolutions.
    pub fn set_entities(&self, a: Option<GeneResolution>, b: Option<GeneResolution>) {
        let mut inner = self.inner.write();
        inner.entity_a = a;
        inner.entity_b = b;
    }

    /// Records the protein contexts.
    pub fn set_proteins(&self, a: Option<ProteinContext>, b: Option<ProteinContext>) {
        let mut inner = self.inner.write();
        inner.protein_a = a;
        inner.protein_b = b;
    }

    /// Records the interaction list.
    pub fn set_interactions(&self, interactions: Vec<Interaction>) {
        self.inner.write().interactions = interactions;
    }

    /// Records the drug list.
    pub fn set_drugs(&self, drugs: Vec<Drug>) {
        self.inner.write().drugs = drugs;
    }

    /// Records the trial list.
    pub fn set_trials(&self, trials: Vec<Trial>) {
        self.inner.write().trials = trials;
    }

    /// Records the surviving validations.
    pub fn set_validations(&self, validations: Vec<ValidationEvidence>) {
        self.inner.write().validations = validations;
    }

    /// Returns a copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> PipelineResult {
        self.inner.read().clone()
    }
}
