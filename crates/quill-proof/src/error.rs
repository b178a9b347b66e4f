use thiserror::Error;

use quill_core::QuillError;
use quill_cred::CredErrorDetail;

/// Errors from issuing or verifying a proof.
#[derive(Debug, Error)]
pub enum ProofError {
    /// Encoding, selection or schema failure in the credential engine.
    #[error("{0}")]
    Encoding(#[from] CredErrorDetail),

    /// The signer, verifier or hasher failed.
    #[error("{0}")]
    Crypto(#[from] QuillError),

    /// The proof entry carries no signature to check.
    #[error("missing signature: {0}")]
    MissingSignature(String),
}

/// Convenience result type for proof operations.
pub type ProofResult<T> = Result<T, ProofError>;
