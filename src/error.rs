use thiserror::Error;

/// Errors surfaced by the suite.
///
/// Messages describe *what* was wrong with an input (lengths, tags) and never
/// carry key bytes or plaintext. Decryption failures collapse into the single
/// [`CryptoError::AuthenticationFailed`] variant so callers cannot tell a wrong
/// key apart from tampered data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Post-quantum primitive unavailable: {0}")]
    PrimitiveUnavailable(String),
    #[error("Invalid key material: {0}")]
    InvalidKeyMaterial(String),
    #[error("Message could not be verified or decrypted")]
    AuthenticationFailed,
    #[error("Not initialized: {0}")]
    NotInitialized(&'static str),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Serialization failed: {0}")]
    Serialization(String),
    #[error("Secure randomness unavailable")]
    RandomnessUnavailable,
}

pub type Result<T> = std::result::Result<T, CryptoError>;

impl From<serde_json::Error> for CryptoError {
    fn from(e: serde_json::Error) -> Self {
        CryptoError::Serialization(e.to_string())
    }
}

/// Build an `InvalidKeyMaterial` error for a length mismatch.
pub(crate) fn invalid_length(what: &str, expected: usize, actual: usize) -> CryptoError {
    CryptoError::InvalidKeyMaterial(format!(
        "{} must be {} bytes, got {}",
        what, expected, actual
    ))
}
