//! Claim text handed to the validation steps.

use crate::models::{Drug, GeneResolution};

/// `"<symbol>: HGNC=<id>, Entrez=<entrez|N/A>"`.
#[must_use]
pub fn gene_claim(symbol: &str, resolution: &GeneResolution) -> String {
    format!(
        "{symbol}: HGNC={}, Entrez={}",
        resolution.id,
        resolution.crossrefs.entrez.as_deref().unwrap_or("N/A")
    )
}

/// `"<id> - <name>, target=<target>, mechanism=<mechanism>"`.
#[must_use]
pub fn mechanism_claim(drug: &Drug) -> String {
    format!(
        "{} - {}, target={}, mechanism={}",
        drug.id, drug.name, drug.target, drug.mechanism
    )
}
