//! Proof and schema-version selection.
//!
//! Issuer and verifier both go through [`resolve`] so that they agree on
//! which proof entry and which schema version produce the prepared sequence.

use serde::{Deserialize, Serialize};

use crate::error::{CredError, CredErrorDetail, CredResult};
use crate::schema::{Schema, SchemaVersions};
use crate::types::{Credential, IssuerRef, ProofEntry};

// ---------------------------------------------------------------------------
// Criteria
// ---------------------------------------------------------------------------

/// Which proof to pick. Every supplied criterion must hold (AND).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub proof_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<IssuerRef>,
}

impl ProofCriteria {
    pub fn at(index: usize) -> Self {
        Self {
            index: Some(index),
            ..Self::default()
        }
    }

    pub fn of_type(proof_type: impl Into<String>) -> Self {
        Self::default().with_type(proof_type)
    }

    pub fn from_issuer(t: u64, k: impl Into<String>) -> Self {
        Self::default().with_issuer(t, k)
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_type(mut self, proof_type: impl Into<String>) -> Self {
        self.proof_type = Some(proof_type.into());
        self
    }

    pub fn with_issuer(mut self, t: u64, k: impl Into<String>) -> Self {
        self.issuer = Some(IssuerRef::new(t, k));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_none() && self.proof_type.is_none() && self.issuer.is_none()
    }

    fn matches(&self, entry: &ProofEntry) -> bool {
        let type_ok = self
            .proof_type
            .as_ref()
            .map_or(true, |t| *t == entry.proof_type);
        let issuer_ok = self
            .issuer
            .as_ref()
            .map_or(true, |isr| isr.id == *entry.issuer());
        type_ok && issuer_ok
    }

    fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(index) = self.index {
            parts.push(format!("index {}", index));
        }
        if let Some(ref t) = self.proof_type {
            parts.push(format!("type '{}'", t));
        }
        if let Some(ref isr) = self.issuer {
            parts.push(format!("issuer {}", isr.id));
        }
        parts.join(", ")
    }
}

/// Proof criteria plus the schema version to encode with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<ProofCriteria>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_proof(mut self, criteria: ProofCriteria) -> Self {
        self.proof = Some(criteria);
        self
    }

    pub fn with_schema(mut self, version: impl Into<String>) -> Self {
        self.schema = Some(version.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Proof selection
// ---------------------------------------------------------------------------

/// Pick exactly one proof. Without criteria this is the first entry.
/// Positions follow document order for issuer-keyed maps as for lists.
///
/// An index narrows the candidates to one position before the type and
/// issuer filters run, so an index combined with a disagreeing type fails.
pub fn select_proof<'a>(
    cred: &'a Credential,
    criteria: Option<&ProofCriteria>,
) -> CredResult<(usize, &'a ProofEntry)> {
    let entries = cred.proofs.entries();
    if entries.is_empty() {
        return Err(CredErrorDetail::new(
            CredError::NoMatchingProof("credential has no proofs".into()),
            "credential has no proofs",
        ));
    }
    let criteria = match criteria {
        Some(c) if !c.is_empty() => c.clone(),
        _ => ProofCriteria::at(0),
    };

    let candidates: Vec<(usize, &ProofEntry)> = match criteria.index {
        Some(index) => {
            let entry = entries.get(index).ok_or_else(|| {
                CredErrorDetail::from(CredError::ProofIndexOutOfRange {
                    index,
                    len: entries.len(),
                })
            })?;
            vec![(index, *entry)]
        }
        None => entries.iter().copied().enumerate().collect(),
    };

    let mut survivors = candidates
        .into_iter()
        .filter(|(_, entry)| criteria.matches(entry));

    let Some(first) = survivors.next() else {
        let description = criteria.describe();
        tracing::warn!(criteria = %description, "no proof matches selector");
        return Err(CredErrorDetail::new(
            CredError::NoMatchingProof(description.clone()),
            format!("credential has no proof matching {}", description),
        ));
    };
    if let Some(second) = survivors.next() {
        let description = criteria.describe();
        return Err(CredErrorDetail::new(
            CredError::AmbiguousProof(description.clone()),
            format!(
                "proofs {} and {} both match {}",
                first.0, second.0, description
            ),
        ));
    }

    tracing::debug!(
        index = first.0,
        proof_type = %first.1.proof_type,
        issuer = %first.1.issuer(),
        "proof selected"
    );
    Ok(first)
}

// ---------------------------------------------------------------------------
// Selection: one proof plus the version to read its schemas at
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Selection<'a> {
    pub index: usize,
    pub proof: &'a ProofEntry,
    pub version: String,
}

impl<'a> Selection<'a> {
    pub fn attribute_schema(&self) -> CredResult<&'a Schema> {
        lookup_version(&self.proof.attribute_schemas, &self.version)
    }

    pub fn signature_schema(&self) -> CredResult<&'a Schema> {
        lookup_version(&self.proof.signature_schemas, &self.version)
    }
}

fn lookup_version<'a>(versions: &'a SchemaVersions, requested: &str) -> CredResult<&'a Schema> {
    versions.get(requested).ok_or_else(|| {
        CredErrorDetail::from(CredError::UnknownSchemaVersion {
            requested: requested.to_string(),
            available: versions.keys().cloned().collect(),
        })
    })
}

/// Select the proof and pin the schema version (the selector's, or
/// `default_version` when it names none).
pub fn resolve<'a>(
    cred: &'a Credential,
    selector: &Selector,
    default_version: &str,
) -> CredResult<Selection<'a>> {
    let (index, proof) = select_proof(cred, selector.proof.as_ref())?;
    let version = selector
        .schema
        .clone()
        .unwrap_or_else(|| default_version.to_string());
    Ok(Selection {
        index,
        proof,
        version,
    })
}
