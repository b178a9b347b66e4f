//! Quill core types
//!
//! Primitive value model shared by every quill crate: the `FlatValue` slots
//! that make up a prepared sequence, Pasta field constants, and the narrow
//! collaborator traits through which signing, verification and hashing are
//! delegated to an external proof system.

pub mod error;
pub mod field;
pub mod traits;
pub mod types;

pub use error::*;
pub use field::*;
pub use traits::*;
pub use types::*;
