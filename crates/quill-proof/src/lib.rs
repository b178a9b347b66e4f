//! # Quill Proof
//!
//! The boundary between the credential encoding engine and an external
//! proof system. Provides three primitives:
//!
//! - [`issue_proof`]: Prepare a credential's attributes under one schema
//!   version and sign them into a new proof entry.
//! - [`verify_proof`]: Recompute the prepared attributes for the selected
//!   proof and check its signature.
//! - [`HashThenSign`]: Adapt a signer to sign a field digest of the
//!   sequence rather than the sequence itself.
//!
//! Signing, verification and hashing are supplied by the caller through the
//! `quill-core` traits; this crate never touches key material.
//!
//! # Example
//!
//! ```rust
//! use quill_core::{PreparedSequence, QuillResult, SequenceSigner};
//! use quill_cred::{Credential, IssuerRef, Preparator, Schema, SchemaVersions};
//! use quill_proof::{attach_proof, issue_proof, ProofTemplate};
//!
//! struct CountSigner;
//!
//! impl SequenceSigner for CountSigner {
//!     fn sign(&self, sequence: &PreparedSequence) -> QuillResult<String> {
//!         Ok(sequence.len().to_string())
//!     }
//! }
//!
//! let mut cred: Credential = serde_json::from_str(
//!     r#"{"attributes":{"sch":1,"isd":0,"exd":0,"sbj":{"id":{"t":1,"k":"abc"}}}}"#,
//! )
//! .unwrap();
//!
//! let mut schemas = SchemaVersions::new();
//! schemas.insert(
//!     "default".into(),
//!     Schema::object([("sch", Schema::chain(["uint-bytes2"]))]),
//! );
//! let template = ProofTemplate::new("count", IssuerRef::new(1, "issuer"))
//!     .with_attribute_schemas(schemas);
//!
//! let preparator = Preparator::standard().unwrap();
//! let entry = issue_proof(&preparator, &cred, &template, "default", &CountSigner).unwrap();
//! attach_proof(&mut cred, entry);
//! assert_eq!(cred.proofs.len(), 1);
//! ```

pub mod error;
pub mod hash;
pub mod issue;
pub mod verify;

pub use error::{ProofError, ProofResult};
pub use hash::HashThenSign;
pub use issue::{attach_proof, issue_proof, ProofTemplate};
pub use verify::{verify_proof, VerifyOutcome};
