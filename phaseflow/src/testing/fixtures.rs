//! Canned records for the TP53 / TYMS example run.

use crate::models::{
    CrossReferences, Drug, GeneResolution, Interaction, ProteinContext, Trial, ValidationEvidence,
};
use crate::pipeline::{PipelineInput, PipelineResult};
use crate::steps::{StepName, StepRequest};

use super::mocks::{ScriptedExecutor, ScriptedReply};

/// The default example input.
#[must_use]
pub fn input() -> PipelineInput {
    PipelineInput::default()
}

/// TP53 resolution with a bare UniProt accession.
#[must_use]
pub fn tp53_resolution() -> GeneResolution {
    GeneResolution {
        id: "HGNC:11998".to_string(),
        symbol: "TP53".to_string(),
        name: "tumor protein p53".to_string(),
        crossrefs: CrossReferences {
            entrez: Some("7157".to_string()),
            uniprot: Some("P04637".to_string()),
            ensembl: Some("ENSG00000141510".to_string()),
        },
    }
}

/// TYMS resolution.
#[must_use]
pub fn tyms_resolution() -> GeneResolution {
    GeneResolution {
        id: "HGNC:12441".to_string(),
        symbol: "TYMS".to_string(),
        name: "thymidylate synthetase".to_string(),
        crossrefs: CrossReferences {
            entrez: Some("7298".to_string()),
            uniprot: Some("P04818".to_string()),
            ensembl: Some("ENSG00000176890".to_string()),
        },
    }
}

/// Protein context for TP53.
#[must_use]
pub fn tp53_protein() -> ProteinContext {
    ProteinContext {
        id: "UniProtKB:P04637".to_string(),
        summary: "Acts as a tumor suppressor in many tumor types.".to_string(),
        keywords: vec!["Apoptosis".to_string(), "Tumor suppressor".to_string()],
    }
}

/// Protein context for TYMS.
#[must_use]
pub fn tyms_protein() -> ProteinContext {
    ProteinContext {
        id: "UniProtKB:P04818".to_string(),
        summary: "Catalyzes the reductive methylation of dUMP to dTMP.".to_string(),
        keywords: vec!["Nucleotide biosynthesis".to_string()],
    }
}

/// Interaction partners of TYMS.
#[must_use]
pub fn interactions() -> Vec<Interaction> {
    vec![
        Interaction {
            partner: "DHFR".to_string(),
            interaction_type: "physical".to_string(),
            source: "STRING".to_string(),
            score: Some(0.999),
            pubmed_id: None,
        },
        Interaction {
            partner: "TP53".to_string(),
            interaction_type: "negative_genetic".to_string(),
            source: "BioGRID".to_string(),
            score: None,
            pubmed_id: Some("19786980".to_string()),
        },
    ]
}

fn drug(id: &str, name: &str) -> Drug {
    Drug {
        id: id.to_string(),
        name: name.to_string(),
        target: "Thymidylate synthase".to_string(),
        mechanism: "INHIBITOR".to_string(),
        max_phase: 4,
    }
}

/// Three approved thymidylate synthase inhibitors.
#[must_use]
pub fn drugs() -> Vec<Drug> {
    vec![
        drug("CHEMBL:185", "FLUOROURACIL"),
        drug("CHEMBL:225072", "PEMETREXED"),
        drug("CHEMBL:225071", "RALTITREXED"),
    ]
}

/// Trials; the first id is in registry form, not CURIE form.
#[must_use]
pub fn trials() -> Vec<Trial> {
    vec![Trial {
        id: "NCT00461032".to_string(),
        title: "Fluorouracil in advanced colorectal cancer".to_string(),
        phase: "PHASE2".to_string(),
        status: "COMPLETED".to_string(),
        conditions: vec!["Colorectal Cancer".to_string()],
        interventions: vec!["Drug: Fluorouracil".to_string()],
    }]
}

/// Verified evidence for `claim`.
#[must_use]
pub fn evidence(claim: &str) -> ValidationEvidence {
    ValidationEvidence {
        claim: claim.to_string(),
        verified: true,
        source: "HGNC".to_string(),
        details: "Record matches".to_string(),
        pubmed_ids: vec!["19786980".to_string()],
    }
}

/// A result with every field populated.
#[must_use]
pub fn full_result() -> PipelineResult {
    PipelineResult {
        entity_a: Some(tp53_resolution()),
        entity_b: Some(tyms_resolution()),
        protein_a: Some(tp53_protein()),
        protein_b: Some(tyms_protein()),
        interactions: interactions(),
        drugs: drugs(),
        trials: trials(),
        validations: vec![evidence("TP53: HGNC=HGNC:11998, Entrez=7157")],
    }
}

fn resolve(symbol: &str) -> StepRequest {
    StepRequest::ResolveEntity {
        symbol: symbol.to_string(),
    }
}

fn enrich(id: &str) -> StepRequest {
    StepRequest::EnrichProtein { id: id.to_string() }
}

/// An executor where every step of the default input succeeds.
///
/// Later rules registered on the returned executor override these.
#[must_use]
pub fn happy_executor() -> ScriptedExecutor {
    ScriptedExecutor::new()
        .on_request(resolve("TP53"), ScriptedReply::ok(tp53_resolution()))
        .on_request(resolve("TYMS"), ScriptedReply::ok(tyms_resolution()))
        .on_request(enrich("UniProtKB:P04637"), ScriptedReply::ok(tp53_protein()))
        .on_request(enrich("UniProtKB:P04818"), ScriptedReply::ok(tyms_protein()))
        .on(StepName::ExpandInteractions, ScriptedReply::ok(interactions()))
        .on(StepName::FindDrugs, ScriptedReply::ok(drugs()))
        .on(StepName::SearchTrials, ScriptedReply::ok(trials()))
        .on(StepName::ValidateGene, ScriptedReply::ok(evidence("gene")))
        .on(StepName::ValidateMechanism, ScriptedReply::ok(evidence("mechanism")))
        .on(StepName::ValidateTrial, ScriptedReply::ok(evidence("trial")))
        .on(
            StepName::ValidateSyntheticLethality,
            ScriptedReply::ok(evidence("synthetic lethality")),
        )
}
