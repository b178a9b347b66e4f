use quill_core::{
    FieldHasher, FlatValue, PreparedSequence, QuillResult, SequenceSigner, SequenceVerifier,
};

/// Signs or verifies `hash(sequence)` instead of the sequence itself, the
/// way field-oriented proof systems sign a Poseidon digest.
#[derive(Debug, Clone)]
pub struct HashThenSign<H, S> {
    hasher: H,
    inner: S,
}

impl<H, S> HashThenSign<H, S> {
    pub fn new(hasher: H, inner: S) -> Self {
        Self { hasher, inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<H: FieldHasher, S> HashThenSign<H, S> {
    /// The one-element sequence that is actually signed.
    pub fn digest(&self, sequence: &PreparedSequence) -> QuillResult<PreparedSequence> {
        let digest: FlatValue = self.hasher.hash(sequence)?;
        tracing::debug!(elements = sequence.len(), "hashed prepared sequence");
        Ok(PreparedSequence::new(vec![digest]))
    }
}

impl<H: FieldHasher, S: SequenceSigner> SequenceSigner for HashThenSign<H, S> {
    fn sign(&self, sequence: &PreparedSequence) -> QuillResult<String> {
        self.inner.sign(&self.digest(sequence)?)
    }
}

impl<H: FieldHasher, S: SequenceVerifier> SequenceVerifier for HashThenSign<H, S> {
    fn verify(
        &self,
        signature: &str,
        sequence: &PreparedSequence,
        public_key: &str,
    ) -> QuillResult<bool> {
        self.inner
            .verify(signature, &self.digest(sequence)?, public_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::QuillError;

    /// Sum of all uint elements.
    struct SumHasher;

    impl FieldHasher for SumHasher {
        fn hash(&self, sequence: &PreparedSequence) -> QuillResult<FlatValue> {
            let mut total = 0u64;
            for v in sequence {
                let n = v
                    .as_uint()
                    .and_then(|n| u64::try_from(n).ok())
                    .ok_or_else(|| QuillError::Hashing(format!("cannot hash {}", v)))?;
                total += n;
            }
            Ok(FlatValue::field(total))
        }
    }

    struct EchoSigner;

    impl SequenceSigner for EchoSigner {
        fn sign(&self, sequence: &PreparedSequence) -> QuillResult<String> {
            Ok(sequence.to_json().to_string())
        }
    }

    impl SequenceVerifier for EchoSigner {
        fn verify(&self, signature: &str, sequence: &PreparedSequence, _: &str) -> QuillResult<bool> {
            Ok(signature == sequence.to_json().to_string())
        }
    }

    fn seq(values: &[u64]) -> PreparedSequence {
        values.iter().map(|&v| FlatValue::uint(v)).collect::<Vec<_>>().into()
    }

    #[test]
    fn test_signs_digest_only() {
        let signer = HashThenSign::new(SumHasher, EchoSigner);
        assert_eq!(signer.sign(&seq(&[1, 2, 3])).unwrap(), "[\"6\"]");
    }

    #[test]
    fn test_verify_uses_same_digest() {
        let scheme = HashThenSign::new(SumHasher, EchoSigner);
        let sig = scheme.sign(&seq(&[4, 5])).unwrap();
        assert!(scheme.verify(&sig, &seq(&[5, 4]), "pk").unwrap());
        assert!(!scheme.verify(&sig, &seq(&[4, 6]), "pk").unwrap());
    }

    #[test]
    fn test_hash_failure_propagates() {
        let signer = HashThenSign::new(SumHasher, EchoSigner);
        let err = signer
            .sign(&PreparedSequence::new(vec![FlatValue::utf8("x")]))
            .unwrap_err();
        assert!(matches!(err, QuillError::Hashing(_)));
    }
}
