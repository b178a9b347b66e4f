//! Proof verification.
//!
//! Verification flow:
//! 1. Resolve exactly one proof entry and one schema version with the
//!    selector (the same chokepoint the issuer used).
//! 2. Recompute the prepared attributes under that version's schema.
//! 3. Hand signature, sequence and the issuer key to the verifier.
//! 4. Return a `VerifyOutcome` describing what was checked.

use serde::{Deserialize, Serialize};

use quill_core::SequenceVerifier;
use quill_cred::{resolve, Credential, Identifier, Preparator, Selector};

use crate::error::{ProofError, ProofResult};

/// Result of checking one proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOutcome {
    pub valid: bool,
    pub index: usize,
    pub proof_type: String,
    pub version: String,
    pub issuer: Identifier,
}

/// Verify the selected proof of `cred`. A signature that does not match is
/// `Ok` with `valid == false`; encoding and selection failures are errors.
pub fn verify_proof(
    preparator: &Preparator,
    cred: &Credential,
    selector: &Selector,
    verifier: &dyn SequenceVerifier,
) -> ProofResult<VerifyOutcome> {
    let selection = resolve(
        cred,
        selector,
        &preparator.config().default_schema_version,
    )?;
    let proof = selection.proof;
    if proof.signature.sign.is_empty() {
        tracing::warn!(index = selection.index, "verification rejected: empty signature");
        return Err(ProofError::MissingSignature(format!(
            "proof {} has an empty signature",
            selection.index
        )));
    }

    let schema = selection.attribute_schema()?;
    let sequence = preparator.prepare(&cred.attributes.to_value()?, schema)?;
    let valid = verifier.verify(&proof.signature.sign, &sequence, &proof.issuer().k)?;

    tracing::info!(
        index = selection.index,
        proof_type = %proof.proof_type,
        version = %selection.version,
        issuer = %proof.issuer(),
        valid,
        "proof verified"
    );

    Ok(VerifyOutcome {
        valid,
        index: selection.index,
        proof_type: proof.proof_type.clone(),
        version: selection.version,
        issuer: proof.issuer().clone(),
    })
}
