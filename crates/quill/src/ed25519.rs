//! Ed25519 over the canonical byte form of a prepared sequence.
//!
//! Signatures and public keys travel as lowercase hex. Only all-bytes
//! schemas can be signed this way.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use quill_core::{PreparedSequence, QuillError, QuillResult, SequenceSigner, SequenceVerifier};

pub struct Ed25519Signer {
    key: SigningKey,
}

impl Ed25519Signer {
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            key: SigningKey::from_bytes(seed),
        }
    }

    /// Parse a 32-byte seed from hex, ignoring surrounding whitespace.
    pub fn from_hex(seed_hex: &str) -> QuillResult<Self> {
        let seed = decode_fixed::<32>(seed_hex.trim(), "signing key")?;
        Ok(Self::from_seed(&seed))
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.key.verifying_key().to_bytes())
    }
}

impl SequenceSigner for Ed25519Signer {
    fn sign(&self, sequence: &PreparedSequence) -> QuillResult<String> {
        let message = sequence.to_bytes()?;
        Ok(hex::encode(self.key.sign(&message).to_bytes()))
    }
}

/// Verifies against the public key given at call time.
pub struct Ed25519Verifier;

impl SequenceVerifier for Ed25519Verifier {
    fn verify(
        &self,
        signature: &str,
        sequence: &PreparedSequence,
        public_key: &str,
    ) -> QuillResult<bool> {
        let key = VerifyingKey::from_bytes(&decode_fixed::<32>(public_key, "public key")?)
            .map_err(|e| QuillError::Verification(format!("invalid public key: {}", e)))?;
        let signature = Signature::from_bytes(&decode_fixed::<64>(signature, "signature")?);
        let message = sequence.to_bytes()?;
        Ok(key.verify(&message, &signature).is_ok())
    }
}

fn decode_fixed<const N: usize>(s: &str, what: &str) -> QuillResult<[u8; N]> {
    let bytes =
        hex::decode(s).map_err(|e| QuillError::Crypto(format!("{} is not hex: {}", what, e)))?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| QuillError::Crypto(format!("{} must be {} bytes, got {}", what, N, len)))
}
