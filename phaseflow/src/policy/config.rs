//! Orchestrator configuration passed into the coordinator at construction.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::TimeoutRegistry;
use crate::errors::PhaseflowError;

fn default_max_mechanism_validations() -> usize {
    2
}

/// Settings for the Validate phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateConfig {
    /// How many discovered drugs get a mechanism validation.
    #[serde(default = "default_max_mechanism_validations")]
    pub max_mechanism_validations: usize,
}

impl Default for ValidateConfig {
    fn default() -> Self {
        Self {
            max_mechanism_validations: default_max_mechanism_validations(),
        }
    }
}

/// Everything the coordinator needs besides its collaborators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Timeout tiers and retry policies.
    #[serde(default)]
    pub timeouts: TimeoutRegistry,
    /// Validate phase settings.
    #[serde(default)]
    pub validate: ValidateConfig,
}

impl OrchestratorConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the timeout registry.
    #[must_use]
    pub fn with_timeouts(mut self, timeouts: TimeoutRegistry) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Sets the mechanism validation cap.
    #[must_use]
    pub fn with_max_mechanism_validations(mut self, cap: usize) -> Self {
        self.validate.max_mechanism_validations = cap;
        self
    }

    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, PhaseflowError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PhaseflowError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Checks the configuration.
    pub fn validate(&self) -> Result<(), PhaseflowError> {
        self.timeouts.validate()
    }
}
