use crate::error::QuillResult;
use crate::types::{FlatValue, PreparedSequence};

// ---------------------------------------------------------------------------
// SequenceSigner: produce a signature over a prepared sequence
//
// Byte-oriented schemes sign `PreparedSequence::to_bytes()`; field-oriented
// schemes sign `PreparedSequence::fields()`. The encoding of the returned
// signature string (hex, base58, ...) is up to the scheme.
// ---------------------------------------------------------------------------

pub trait SequenceSigner: Send + Sync {
    fn sign(&self, sequence: &PreparedSequence) -> QuillResult<String>;
}

// ---------------------------------------------------------------------------
// SequenceVerifier: check a signature against a prepared sequence
// ---------------------------------------------------------------------------

pub trait SequenceVerifier: Send + Sync {
    fn verify(
        &self,
        signature: &str,
        sequence: &PreparedSequence,
        public_key: &str,
    ) -> QuillResult<bool>;
}

// ---------------------------------------------------------------------------
// FieldHasher: collapse a sequence into one field element (e.g. Poseidon)
// ---------------------------------------------------------------------------

pub trait FieldHasher: Send + Sync {
    fn hash(&self, sequence: &PreparedSequence) -> QuillResult<FlatValue>;
}
