//! Step names, typed requests and stable step ids.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{Phase, StepCategory};
use crate::errors::StepError;
use crate::utils::Curie;

/// Every operation the gateway exposes to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepName {
    /// Symbol to canonical gene record.
    ResolveEntity,
    /// Protein identifier to functional context.
    EnrichProtein,
    /// Symbol to interaction partners.
    ExpandInteractions,
    /// Target name to drug candidates.
    FindDrugs,
    /// Drug name and condition to clinical trials.
    SearchTrials,
    /// Gene identifier claim check.
    ValidateGene,
    /// Drug mechanism claim check.
    ValidateMechanism,
    /// Trial existence check.
    ValidateTrial,
    /// Synthetic-lethal relationship check.
    ValidateSyntheticLethality,
}

impl StepName {
    /// The category that selects this step's timeout tier.
    #[must_use]
    pub fn category(self) -> StepCategory {
        match self {
            Self::ExpandInteractions | Self::FindDrugs | Self::SearchTrials => StepCategory::Long,
            Self::ResolveEntity
            | Self::EnrichProtein
            | Self::ValidateGene
            | Self::ValidateMechanism
            | Self::ValidateTrial
            | Self::ValidateSyntheticLethality => StepCategory::Short,
        }
    }

    /// The wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ResolveEntity => "resolve-entity",
            Self::EnrichProtein => "enrich-protein",
            Self::ExpandInteractions => "expand-interactions",
            Self::FindDrugs => "find-drugs",
            Self::SearchTrials => "search-trials",
            Self::ValidateGene => "validate-gene",
            Self::ValidateMechanism => "validate-mechanism",
            Self::ValidateTrial => "validate-trial",
            Self::ValidateSyntheticLethality => "validate-synthetic-lethality",
        }
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A step call with its arguments.
///
/// Serializes as `{"step": "<wire name>", "args": {...}}`, which is also the
/// document written to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", content = "args", rename_all = "kebab-case")]
pub enum StepRequest {
    /// Resolve a raw symbol.
    ResolveEntity {
        /// Symbol as supplied by the caller.
        symbol: String,
    },
    /// Enrich a protein; `id` must be a CURIE.
    EnrichProtein {
        /// Protein identifier.
        id: String,
    },
    /// Expand interactions around a symbol.
    ExpandInteractions {
        /// Gene symbol.
        symbol: String,
    },
    /// Find drugs for a target.
    FindDrugs {
        /// Human-readable target name.
        target_name: String,
    },
    /// Search trials for a drug in a condition.
    SearchTrials {
        /// Drug name (or the target name when degraded).
        drug_name: String,
        /// Disease condition.
        condition: String,
    },
    /// Validate a gene claim.
    ValidateGene {
        /// Claim text.
        claim: String,
    },
    /// Validate a drug mechanism claim.
    ValidateMechanism {
        /// Claim text.
        claim: String,
    },
    /// Validate that a trial exists; `trial_id` must be a CURIE.
    ValidateTrial {
        /// Trial identifier.
        trial_id: String,
    },
    /// Validate a synthetic-lethal relationship between two entities.
    ValidateSyntheticLethality {
        /// First entity symbol.
        entity_a: String,
        /// Second entity symbol.
        entity_b: String,
    },
}

impl StepRequest {
    /// The step this request invokes.
    #[must_use]
    pub fn name(&self) -> StepName {
        match self {
            Self::ResolveEntity { .. } => StepName::ResolveEntity,
            Self::EnrichProtein { .. } => StepName::EnrichProtein,
            Self::ExpandInteractions { .. } => StepName::ExpandInteractions,
            Self::FindDrugs { .. } => StepName::FindDrugs,
            Self::SearchTrials { .. } => StepName::SearchTrials,
            Self::ValidateGene { .. } => StepName::ValidateGene,
            Self::ValidateMechanism { .. } => StepName::ValidateMechanism,
            Self::ValidateTrial { .. } => StepName::ValidateTrial,
            Self::ValidateSyntheticLethality { .. } => StepName::ValidateSyntheticLethality,
        }
    }

    /// Shortcut for `self.name().category()`.
    #[must_use]
    pub fn category(&self) -> StepCategory {
        self.name().category()
    }

    /// Checks arguments that strict lookups require to be CURIEs.
    ///
    /// A failure here is an invalid-input condition, never transient.
    pub fn validate(&self) -> Result<(), StepError> {
        let strict = match self {
            Self::EnrichProtein { id } => Some(id),
            Self::ValidateTrial { trial_id } => Some(trial_id),
            _ => None,
        };

        match strict {
            Some(raw) if !Curie::is_curie(raw) => Err(StepError::unresolved_entity(format!(
                "{} requires a NAMESPACE:VALUE identifier, got '{raw}'",
                self.name()
            ))),
            _ => Ok(()),
        }
    }
}

/// Stable identity of one step invocation within a run.
///
/// Keys are derived from what the call means (`validate.mechanism-1`), not
/// from its position in a fan-out, so journal records survive reordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepKey(String);

impl StepKey {
    /// Builds a key from a phase and a slot name.
    #[must_use]
    pub fn new(phase: Phase, slot: impl fmt::Display) -> Self {
        Self(format!("{phase}.{slot}"))
    }

    /// The key as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
