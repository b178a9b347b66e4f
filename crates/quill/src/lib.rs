//! Quill Root Library
//!
//! Orchestration layer behind the `quill` binary: builds the
//! transformation graph from configuration, loads credentials and schemas
//! from disk, and implements each command as a function returning the text
//! to print.

pub mod config;
pub mod ed25519;
pub mod error;

pub use config::{GraphConfig, RootConfig, KNOWN_EXTENSIONS};
pub use error::{RootError, RootResult};

use std::path::Path;
use std::sync::Arc;

use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::json;

use quill_cred::{
    resolve, validate_schema, BaseExtension, Credential, GraphBuilder, GraphExtension,
    MinaExtension, Preparator, ProofCriteria, Schema, SchemaVersions, Secp256k1Extension,
    Selector, TransformationGraph,
};
use quill_proof::{attach_proof, issue_proof, verify_proof, ProofTemplate, VerifyOutcome};

use crate::ed25519::{Ed25519Signer, Ed25519Verifier};

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

fn extension_by_name(name: &str) -> RootResult<Box<dyn GraphExtension>> {
    match name {
        "secp256k1" => Ok(Box::new(Secp256k1Extension)),
        "mina" => Ok(Box::new(MinaExtension)),
        other => Err(RootError::Config(format!(
            "unknown graph extension '{}'",
            other
        ))),
    }
}

/// Base primitives followed by the configured extensions, frozen.
pub fn build_graph(config: &GraphConfig) -> RootResult<TransformationGraph> {
    let mut builder = GraphBuilder::new();
    builder.extend(&BaseExtension)?;
    for name in &config.extensions {
        builder.extend(extension_by_name(name)?.as_ref())?;
    }
    Ok(builder.freeze())
}

pub fn build_preparator(config: &RootConfig) -> RootResult<Preparator> {
    let graph = build_graph(&config.graph)?;
    tracing::debug!(
        links = graph.link_count(),
        nodes = graph.node_count(),
        "graph ready"
    );
    Ok(Preparator::new(Arc::new(graph), config.preparator.clone()))
}

pub fn load_credential(path: &Path) -> RootResult<Credential> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

pub fn load_schema(path: &Path) -> RootResult<Schema> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

// ---------------------------------------------------------------------------
// Selector arguments
// ---------------------------------------------------------------------------

/// Proof and schema-version selection flags shared by several commands.
#[derive(Args, Debug, Clone, Default)]
pub struct SelectArgs {
    /// Position of the proof in the credential
    #[arg(long)]
    pub index: Option<usize>,

    /// Proof type to match
    #[arg(long = "type")]
    pub proof_type: Option<String>,

    /// Issuer identifier type to match (requires --issuer-key)
    #[arg(long, requires = "issuer_key")]
    pub issuer_type: Option<u64>,

    /// Issuer key to match (requires --issuer-type)
    #[arg(long, requires = "issuer_type")]
    pub issuer_key: Option<String>,

    /// Schema version to encode with
    #[arg(long)]
    pub schema: Option<String>,
}

impl SelectArgs {
    pub fn to_selector(&self) -> RootResult<Selector> {
        let mut criteria = ProofCriteria {
            index: self.index,
            proof_type: self.proof_type.clone(),
            issuer: None,
        };
        match (self.issuer_type, &self.issuer_key) {
            (Some(t), Some(k)) => criteria = criteria.with_issuer(t, k.clone()),
            (None, None) => {}
            _ => {
                return Err(RootError::Usage(
                    "--issuer-type and --issuer-key must be given together".into(),
                ))
            }
        }
        Ok(Selector {
            proof: (!criteria.is_empty()).then_some(criteria),
            schema: self.schema.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// One line per link: `name: input -> output`, spread links marked.
pub fn list_links(graph: &TransformationGraph) -> Vec<String> {
    graph
        .links()
        .into_iter()
        .map(|link| {
            let marker = if link.is_spread() { " (spread)" } else { "" };
            format!("{}: {} -> {}{}", link.name, link.input, link.output, marker)
        })
        .collect()
}

/// Validation messages for a schema; empty means valid.
pub fn check_schema(graph: &TransformationGraph, schema: &Schema) -> Vec<String> {
    validate_schema(schema, graph)
}

/// Prepared attributes (or signature envelope) of the selected proof, as
/// pretty JSON or as hex of the canonical byte form.
pub fn prepare_output(
    preparator: &Preparator,
    cred: &Credential,
    selector: &Selector,
    signature: bool,
    bytes: bool,
) -> RootResult<String> {
    let sequence = if signature {
        preparator.prepared_signature(cred, selector)?
    } else {
        preparator.prepared_attributes(cred, selector)?
    };
    if bytes {
        Ok(hex::encode(sequence.to_bytes()?))
    } else {
        Ok(serde_json::to_string_pretty(&sequence.to_json())?)
    }
}

/// Summary of the proof a selector resolves to.
pub fn select_output(
    preparator: &Preparator,
    cred: &Credential,
    selector: &Selector,
) -> RootResult<serde_json::Value> {
    let selection = resolve(cred, selector, &preparator.config().default_schema_version)?;
    let proof = selection.proof;
    Ok(json!({
        "index": selection.index,
        "type": proof.proof_type,
        "issuer": proof.issuer(),
        "version": selection.version,
        "attributeVersions": proof.attribute_schemas.keys().collect::<Vec<_>>(),
        "signatureVersions": proof.signature_schemas.keys().collect::<Vec<_>>(),
    }))
}

/// Proof type and schema versions an issuer signs under. The issuer key is
/// taken from the signing key, not from this file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueTemplate {
    #[serde(rename = "type")]
    pub proof_type: String,
    #[serde(default)]
    pub issuer_type: u64,
    pub attribute_schemas: SchemaVersions,
    #[serde(default)]
    pub signature_schemas: SchemaVersions,
}

/// Sign the credential's attributes with an Ed25519 key and attach the
/// proof. Returns the updated credential.
pub fn issue_ed25519(
    preparator: &Preparator,
    mut cred: Credential,
    template: &IssueTemplate,
    signer: &Ed25519Signer,
    version: &str,
) -> RootResult<Credential> {
    let proof_template = ProofTemplate::new(
        template.proof_type.clone(),
        quill_cred::IssuerRef::new(template.issuer_type, signer.public_key_hex()),
    )
    .with_attribute_schemas(template.attribute_schemas.clone())
    .with_signature_schemas(template.signature_schemas.clone());
    let entry = issue_proof(preparator, &cred, &proof_template, version, signer)?;
    attach_proof(&mut cred, entry);
    Ok(cred)
}

/// Verify the selected proof as an Ed25519 signature by its issuer key.
pub fn verify_ed25519(
    preparator: &Preparator,
    cred: &Credential,
    selector: &Selector,
) -> RootResult<VerifyOutcome> {
    Ok(verify_proof(preparator, cred, selector, &Ed25519Verifier)?)
}
