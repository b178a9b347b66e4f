use thiserror::Error;

/// Error type for the quill binary, aggregating errors from the library
/// crates plus configuration and I/O failures.
#[derive(Debug, Error)]
pub enum RootError {
    #[error("credential error: {0}")]
    Credential(#[from] quill_cred::CredErrorDetail),

    #[error("proof error: {0}")]
    Proof(#[from] quill_proof::ProofError),

    #[error("core error: {0}")]
    Core(#[from] quill_core::QuillError),

    #[error("invalid arguments: {0}")]
    Usage(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for RootError {
    fn from(e: serde_json::Error) -> Self {
        RootError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for RootError {
    fn from(e: toml::de::Error) -> Self {
        RootError::Config(format!("TOML parse error: {}", e))
    }
}

pub type RootResult<T> = Result<T, RootError>;
