//! Step categories.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How long a step is expected to take, which selects its timeout tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepCategory {
    /// Lookups and validations that should finish quickly.
    Short,
    /// Open-ended search operations.
    Long,
}

impl StepCategory {
    /// All categories, in registry order.
    pub const ALL: [Self; 2] = [Self::Short, Self::Long];
}

impl fmt::Display for StepCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Short => write!(f, "short"),
            Self::Long => write!(f, "long"),
        }
    }
}
