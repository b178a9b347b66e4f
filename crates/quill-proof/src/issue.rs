//! Proof issuance.
//!
//! Flow:
//! 1. Look up the requested version in the template's attribute schemas.
//! 2. Validate that schema (and the signature schema of the same version,
//!    if any) against the preparator's graph.
//! 3. Prepare the credential attributes.
//! 4. Sign the prepared sequence and wrap the signature in a proof entry
//!    that carries every schema version it can be read under.

use quill_core::SequenceSigner;
use quill_cred::{
    validate_schema_strict, CredError, CredErrorDetail, Credential, IssuerRef, Preparator,
    ProofEntry, ProofSignature, SchemaVersions,
};

use crate::error::{ProofError, ProofResult};

/// What an issuer signs under: proof type, its own identity and the schema
/// versions stored with every proof it issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofTemplate {
    pub proof_type: String,
    pub issuer: IssuerRef,
    pub attribute_schemas: SchemaVersions,
    pub signature_schemas: SchemaVersions,
}

impl ProofTemplate {
    pub fn new(proof_type: impl Into<String>, issuer: IssuerRef) -> Self {
        Self {
            proof_type: proof_type.into(),
            issuer,
            attribute_schemas: SchemaVersions::new(),
            signature_schemas: SchemaVersions::new(),
        }
    }

    pub fn with_attribute_schemas(mut self, schemas: SchemaVersions) -> Self {
        self.attribute_schemas = schemas;
        self
    }

    pub fn with_signature_schemas(mut self, schemas: SchemaVersions) -> Self {
        self.signature_schemas = schemas;
        self
    }
}

/// Sign `cred`'s attributes under `version` of the template's schemas.
pub fn issue_proof(
    preparator: &Preparator,
    cred: &Credential,
    template: &ProofTemplate,
    version: &str,
    signer: &dyn SequenceSigner,
) -> ProofResult<ProofEntry> {
    let schema = template.attribute_schemas.get(version).ok_or_else(|| {
        CredErrorDetail::from(CredError::UnknownSchemaVersion {
            requested: version.to_string(),
            available: template.attribute_schemas.keys().cloned().collect(),
        })
    })?;
    validate_schema_strict(schema, preparator.graph())?;
    if let Some(signature_schema) = template.signature_schemas.get(version) {
        validate_schema_strict(signature_schema, preparator.graph())?;
    }

    let sequence = preparator.prepare(&cred.attributes.to_value()?, schema)?;
    let sign = signer.sign(&sequence)?;
    if sign.is_empty() {
        return Err(ProofError::MissingSignature(format!(
            "signer returned an empty signature for type '{}'",
            template.proof_type
        )));
    }

    tracing::info!(
        proof_type = %template.proof_type,
        issuer = %template.issuer.id,
        version,
        elements = sequence.len(),
        "proof issued"
    );

    Ok(ProofEntry {
        proof_type: template.proof_type.clone(),
        signature: ProofSignature {
            sign,
            isr: template.issuer.clone(),
        },
        attribute_schemas: template.attribute_schemas.clone(),
        signature_schemas: template.signature_schemas.clone(),
    })
}

/// Append a proof to the credential. Issuer-keyed proof sets replace any
/// earlier proof from the same issuer key.
pub fn attach_proof(cred: &mut Credential, entry: ProofEntry) {
    tracing::debug!(
        proof_type = %entry.proof_type,
        issuer = %entry.issuer(),
        "attaching proof"
    );
    cred.proofs.push(entry);
}
