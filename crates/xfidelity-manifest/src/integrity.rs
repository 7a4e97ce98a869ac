use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntegrityError {
    #[error("hash mismatch: expected {expected}, actual {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error("invalid hash format: {0}")]
    InvalidFormat(String),
}

pub struct HashVerifier;

impl HashVerifier {
    pub fn compute(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        hex::encode(hasher.finalize())
    }

    pub fn verify(bytes: &[u8], expected: &str) -> Result<(), IntegrityError> {
        if expected.len() != 64 || !expected.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(IntegrityError::InvalidFormat(expected.to_string()));
        }

        let actual = Self::compute(bytes);
        if actual.eq_ignore_ascii_case(expected) {
            Ok(())
        } else {
            Err(IntegrityError::HashMismatch {
                expected: expected.to_string(),
                actual,
            })
        }
    }
}
