use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuillError {
    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("signing error: {0}")]
    Signing(String),

    #[error("verification error: {0}")]
    Verification(String),

    #[error("hashing error: {0}")]
    Hashing(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type QuillResult<T> = Result<T, QuillError>;
