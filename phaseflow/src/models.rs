//! Domain records produced by each phase.
//!
//! These mirror what the tool gateway returns. Field aliases accept the
//! gateway's longer names (`hgnc_id`, `chembl_id`, `nct_id`, ...) so either
//! spelling decodes.

use serde::{Deserialize, Serialize};

use crate::utils::Curie;

/// Namespace used to qualify bare protein accessions.
pub const PROTEIN_NAMESPACE: &str = "UniProtKB";

/// Namespace used to qualify bare trial registry numbers.
pub const TRIAL_NAMESPACE: &str = "NCT";

/// Cross-references attached to a resolved gene.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossReferences {
    /// Entrez Gene id.
    #[serde(default)]
    pub entrez: Option<String>,
    /// UniProt accession of the gene product.
    #[serde(default)]
    pub uniprot: Option<String>,
    /// Ensembl gene id.
    #[serde(default)]
    pub ensembl: Option<String>,
}

/// Anchor output: a gene symbol resolved to its canonical record.
///
/// Decodes both the nested form (`crossrefs: {uniprot, ...}`) and the flat
/// form the gateway emits (`uniprot_id`, `entrez_id`, `ensembl_id` beside
/// `hgnc_id`). Nested values win when both are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "GeneReply")]
pub struct GeneResolution {
    /// Canonical identifier, e.g. `HGNC:11998`.
    pub id: String,
    /// Approved symbol.
    pub symbol: String,
    /// Approved name.
    pub name: String,
    /// Links into other databases.
    pub crossrefs: CrossReferences,
}

#[derive(Deserialize)]
struct GeneReply {
    #[serde(alias = "hgnc_id")]
    id: String,
    symbol: String,
    name: String,
    #[serde(default)]
    crossrefs: Option<CrossReferences>,
    #[serde(default, alias = "entrez_id")]
    entrez: Option<String>,
    #[serde(default, alias = "uniprot_id")]
    uniprot: Option<String>,
    #[serde(default, alias = "ensembl_id")]
    ensembl: Option<String>,
}

impl From<GeneReply> for GeneResolution {
    fn from(reply: GeneReply) -> Self {
        let nested = reply.crossrefs.unwrap_or_default();
        Self {
            id: reply.id,
            symbol: reply.symbol,
            name: reply.name,
            crossrefs: CrossReferences {
                entrez: nested.entrez.or(reply.entrez),
                uniprot: nested.uniprot.or(reply.uniprot),
                ensembl: nested.ensembl.or(reply.ensembl),
            },
        }
    }
}

impl GeneResolution {
    /// The protein identifier to enrich, if the resolution carries one.
    #[must_use]
    pub fn protein_curie(&self) -> Option<Curie> {
        self.crossrefs
            .uniprot
            .as_deref()
            .and_then(|raw| Curie::qualify(raw, PROTEIN_NAMESPACE))
    }
}

/// Enrich output: functional context for a protein.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProteinContext {
    /// Protein identifier.
    #[serde(alias = "uniprot_id")]
    pub id: String,
    /// Function summary.
    #[serde(alias = "function_summary")]
    pub summary: String,
    /// Controlled-vocabulary keywords.
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Expand output item: one interaction partner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    /// Partner gene symbol.
    #[serde(alias = "partner_gene")]
    pub partner: String,
    /// Interaction type, e.g. `physical` or `negative_genetic`.
    #[serde(rename = "type", alias = "interaction_type")]
    pub interaction_type: String,
    /// Evidence source, e.g. `STRING` or `BioGRID`.
    #[serde(alias = "evidence_source")]
    pub source: String,
    /// Confidence score when the source provides one.
    #[serde(default)]
    pub score: Option<f64>,
    /// Supporting publication.
    #[serde(default)]
    pub pubmed_id: Option<String>,
}

/// Expand reply: a bare list, or the list wrapped as `{"interactions": [...]}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum InteractionReply {
    /// `[...]`
    List(Vec<Interaction>),
    /// `{"interactions": [...]}`
    Wrapped {
        /// The wrapped list.
        interactions: Vec<Interaction>,
    },
}

impl InteractionReply {
    /// The interactions, whichever shape they arrived in.
    #[must_use]
    pub fn into_vec(self) -> Vec<Interaction> {
        match self {
            Self::List(interactions) | Self::Wrapped { interactions } => interactions,
        }
    }
}

/// Traverse output item: a compound acting on the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drug {
    /// Compound identifier, e.g. `CHEMBL:185`.
    #[serde(alias = "chembl_id")]
    pub id: String,
    /// Preferred name.
    pub name: String,
    /// Target name.
    #[serde(alias = "target_name")]
    pub target: String,
    /// Mechanism of action, e.g. `INHIBITOR`.
    pub mechanism: String,
    /// Highest development phase reached (4 = approved).
    pub max_phase: u8,
}

/// Traverse output item: a clinical trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trial {
    /// Registry identifier.
    #[serde(alias = "nct_id")]
    pub id: String,
    /// Brief title.
    pub title: String,
    /// Trial phase.
    pub phase: String,
    /// Recruitment status.
    pub status: String,
    /// Conditions studied.
    #[serde(default)]
    pub conditions: Vec<String>,
    /// Interventions tested.
    #[serde(default)]
    pub interventions: Vec<String>,
}

impl Trial {
    /// The registry identifier in CURIE form, if it can be normalized.
    #[must_use]
    pub fn curie(&self) -> Option<Curie> {
        Curie::qualify(&self.id, TRIAL_NAMESPACE)
    }
}

/// Validate output item: evidence for or against one claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationEvidence {
    /// The claim that was checked.
    pub claim: String,
    /// Whether the claim held.
    pub verified: bool,
    /// Database consulted.
    #[serde(alias = "evidence_source")]
    pub source: String,
    /// Free-text detail.
    #[serde(alias = "evidence_details")]
    pub details: String,
    /// Supporting publications.
    #[serde(default)]
    pub pubmed_ids: Vec<String>,
}
