//! Quill Credential Encoding Engine
//!
//! Turns a credential's attribute tree into the deterministic, ordered
//! sequence of primitive values that a proof system hashes and signs.
//!
//! 1. A [`TransformationGraph`] of typed nodes and named single-input links,
//!    assembled once from [`GraphExtension`]s and then frozen.
//! 2. A [`Schema`] per proof and version naming the exact link chain for
//!    every leaf.
//! 3. The [`Preparator`], which walks value and schema together and
//!    flattens the results in schema order.
//! 4. The selector, which picks exactly one proof entry and one schema
//!    version from a credential.
//!
//! Cryptographic primitives stay outside: links only encode and decode.

pub mod error;
pub mod graph;
pub mod links;
pub mod preparator;
pub mod schema;
pub mod selector;
pub mod types;

// Re-export primary types and functions for convenience
pub use error::{CredError, CredErrorDetail, CredResult, ErrorClass};
pub use graph::{
    GraphBuilder, GraphExtension, GraphLink, GraphNode, LinkOutput, TransformationGraph,
};
pub use links::{BaseExtension, MinaExtension, Secp256k1Extension};
pub use preparator::Preparator;
pub use schema::{validate_schema, validate_schema_strict, Schema, SchemaVersions};
pub use selector::{resolve, select_proof, ProofCriteria, Selection, Selector};
pub use types::*;
