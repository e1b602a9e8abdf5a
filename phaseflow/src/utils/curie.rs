//! Compact identifiers of the form `NAMESPACE:VALUE`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

fn curie_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^([A-Za-z][A-Za-z0-9_.-]*):([^\s:][^\s]*)$").ok())
        .as_ref()
}

/// Error returned when a string is not a CURIE.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{raw}' is not a NAMESPACE:VALUE identifier")]
pub struct CurieError {
    /// The rejected input.
    pub raw: String,
}

/// A compact URI such as `HGNC:11998` or `CHEMBL:185`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Curie {
    namespace: String,
    value: String,
}

impl Curie {
    /// Parses a CURIE, rejecting anything without a namespace.
    pub fn parse(raw: &str) -> Result<Self, CurieError> {
        let caps = curie_pattern()
            .and_then(|pattern| pattern.captures(raw.trim()))
            .ok_or_else(|| CurieError { raw: raw.to_string() })?;

        Ok(Self {
            namespace: caps[1].to_string(),
            value: caps[2].to_string(),
        })
    }

    /// Returns true if `raw` is already a well-formed CURIE.
    #[must_use]
    pub fn is_curie(raw: &str) -> bool {
        curie_pattern().is_some_and(|pattern| pattern.is_match(raw.trim()))
    }

    /// Parses `raw`, or qualifies a bare accession with `namespace`.
    ///
    /// Upstream sources often return bare accessions (`P04637`); strict
    /// lookups need them qualified (`UniProtKB:P04637`).
    #[must_use]
    pub fn qualify(raw: &str, namespace: &str) -> Option<Self> {
        if let Ok(curie) = Self::parse(raw) {
            return Some(curie);
        }
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.contains(char::is_whitespace) || trimmed.contains(':') {
            return None;
        }
        let value = trimmed.strip_prefix(namespace).filter(|rest| {
            !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit())
        });
        Some(Self {
            namespace: namespace.to_string(),
            value: value.unwrap_or(trimmed).to_string(),
        })
    }

    /// The namespace half.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The local identifier half.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Curie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.value)
    }
}

impl FromStr for Curie {
    type Err = CurieError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Curie {
    type Error = CurieError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Curie> for String {
    fn from(curie: Curie) -> Self {
        curie.to_string()
    }
}
