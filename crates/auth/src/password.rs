use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HashError {
    /// No salt could be generated (entropy source unavailable).
    #[error("salt generation failed: {0}")]
    Salt(String),

    #[error("digest computation failed: {0}")]
    Digest(String),
}

/// Password hashing capability.
///
/// Digests are opaque to this crate; implementations decide the algorithm and
/// encoding (e.g. a PHC string).
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plain: &str) -> Result<String, HashError>;

    fn verify(&self, plain: &str, digest: &str) -> bool;
}
