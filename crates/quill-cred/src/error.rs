use std::fmt;
use thiserror::Error;

/// Broad category of a credential-encoding failure.
///
/// None of these are retried: every failure is a deterministic function of
/// the inputs, so the caller must change the graph, the schema, the data or
/// the selector before trying again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Unknown link, node or schema version; a deployment mistake.
    Configuration,
    /// A transform rejected a value, or schema and value disagree in shape.
    Data,
    /// The credential has no proof matching the requested criteria.
    Selection,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::Data => write!(f, "data"),
            Self::Selection => write!(f, "selection"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredError {
    #[error("unknown link: {0}")]
    UnknownLink(String),

    #[error("unknown node: {0}")]
    UnknownNode(String),

    #[error("invalid link definition: {0}")]
    InvalidLink(String),

    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("link '{0}' follows a spread link")]
    SpreadNotTerminal(String),

    #[error("unknown schema version '{requested}' (available: {})", .available.join(", "))]
    UnknownSchemaVersion {
        requested: String,
        available: Vec<String>,
    },

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("transform '{link}' failed: {reason}")]
    TransformFailed { link: String, reason: String },

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("non-byte output: {0}")]
    NonByteOutput(String),

    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    #[error("no matching proof: {0}")]
    NoMatchingProof(String),

    #[error("ambiguous proof selection: {0}")]
    AmbiguousProof(String),

    #[error("proof index {index} out of range ({len} proofs)")]
    ProofIndexOutOfRange { index: usize, len: usize },
}

impl CredError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::UnknownLink(_)
            | Self::UnknownNode(_)
            | Self::InvalidLink(_)
            | Self::InvalidSchema(_)
            | Self::SpreadNotTerminal(_)
            | Self::UnknownSchemaVersion { .. } => ErrorClass::Configuration,
            Self::TypeMismatch(_)
            | Self::TransformFailed { .. }
            | Self::ShapeMismatch(_)
            | Self::NonByteOutput(_)
            | Self::EncodingFailed(_) => ErrorClass::Data,
            Self::NoMatchingProof(_)
            | Self::AmbiguousProof(_)
            | Self::ProofIndexOutOfRange { .. } => ErrorClass::Selection,
        }
    }
}

/// Structured error with a CredError variant, a human-readable message and
/// the leaf path (dot-separated) where the failure happened, if any.
#[derive(Debug, Clone)]
pub struct CredErrorDetail {
    pub kind: CredError,
    pub message: String,
    pub path: Option<String>,
}

impl fmt::Display for CredErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(ref path) = self.path {
            write!(f, " at {}", path)?;
        }
        Ok(())
    }
}

impl std::error::Error for CredErrorDetail {}

impl CredErrorDetail {
    pub fn new(kind: CredError, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach a path only if none was recorded closer to the failure.
    pub fn or_path(self, path: impl Into<String>) -> Self {
        if self.path.is_some() {
            self
        } else {
            self.with_path(path)
        }
    }

    pub fn class(&self) -> ErrorClass {
        self.kind.class()
    }
}

impl From<CredError> for CredErrorDetail {
    fn from(kind: CredError) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            message,
            path: None,
        }
    }
}

impl From<quill_core::QuillError> for CredErrorDetail {
    fn from(err: quill_core::QuillError) -> Self {
        let message = err.to_string();
        Self {
            kind: CredError::NonByteOutput(message.clone()),
            message,
            path: None,
        }
    }
}

pub type CredResult<T> = Result<T, CredErrorDetail>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cred_error_detail_construction() {
        let detail = CredErrorDetail::new(
            CredError::UnknownLink("utf8-nope".into()),
            "link 'utf8-nope' is not registered",
        );
        assert_eq!(detail.kind, CredError::UnknownLink("utf8-nope".into()));
        assert_eq!(detail.message, "link 'utf8-nope' is not registered");
        assert!(detail.path.is_none());
    }

    #[test]
    fn test_cred_error_detail_with_path() {
        let detail = CredErrorDetail::new(CredError::ShapeMismatch("x".into()), "x")
            .with_path("sbj.id.k");
        assert_eq!(detail.path.as_deref(), Some("sbj.id.k"));
        assert_eq!(detail.to_string(), "shape mismatch: x at sbj.id.k");
    }

    #[test]
    fn test_or_path_keeps_innermost() {
        let detail = CredErrorDetail::from(CredError::ShapeMismatch("x".into()))
            .with_path("sbj.id.k")
            .or_path("sbj");
        assert_eq!(detail.path.as_deref(), Some("sbj.id.k"));
    }

    #[test]
    fn test_unknown_version_lists_available() {
        let err = CredError::UnknownSchemaVersion {
            requested: "v9".into(),
            available: vec!["default".into(), "pre".into()],
        };
        assert_eq!(
            err.to_string(),
            "unknown schema version 'v9' (available: default, pre)"
        );
    }

    #[test]
    fn test_error_classes() {
        assert_eq!(
            CredError::UnknownLink("a".into()).class(),
            ErrorClass::Configuration
        );
        assert_eq!(
            CredError::UnknownSchemaVersion {
                requested: "a".into(),
                available: vec![]
            }
            .class(),
            ErrorClass::Configuration
        );
        assert_eq!(
            CredError::TransformFailed {
                link: "a".into(),
                reason: "b".into()
            }
            .class(),
            ErrorClass::Data
        );
        assert_eq!(CredError::ShapeMismatch("a".into()).class(), ErrorClass::Data);
        assert_eq!(CredError::EncodingFailed("a".into()).class(), ErrorClass::Data);
        assert_eq!(
            CredError::NoMatchingProof("a".into()).class(),
            ErrorClass::Selection
        );
        assert_eq!(
            CredError::ProofIndexOutOfRange { index: 3, len: 1 }.class(),
            ErrorClass::Selection
        );
    }

    #[test]
    fn test_all_error_variants_display() {
        let variants: Vec<CredError> = vec![
            CredError::UnknownLink("test".into()),
            CredError::EncodingFailed("test".into()),
            CredError::UnknownNode("test".into()),
            CredError::InvalidLink("test".into()),
            CredError::InvalidSchema("test".into()),
            CredError::SpreadNotTerminal("test".into()),
            CredError::UnknownSchemaVersion {
                requested: "test".into(),
                available: vec![],
            },
            CredError::TypeMismatch("test".into()),
            CredError::TransformFailed {
                link: "test".into(),
                reason: "test".into(),
            },
            CredError::ShapeMismatch("test".into()),
            CredError::NonByteOutput("test".into()),
            CredError::NoMatchingProof("test".into()),
            CredError::AmbiguousProof("test".into()),
            CredError::ProofIndexOutOfRange { index: 0, len: 0 },
        ];
        for v in variants {
            let s = v.to_string();
            assert!(!s.is_empty(), "Display for {:?} should not be empty", v);
        }
    }
}
