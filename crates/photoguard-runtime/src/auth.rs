//! API key verification
//!
//! The service stores only the SHA-256 hex digest of its shared API key.
//! Presented keys are hashed and compared in constant time.

use photoguard_core::{PhotoGuardError, PhotoGuardResult};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Credential check run before any network call
pub trait CredentialVerifier: Send + Sync {
    /// true if `secret` is an accepted credential
    fn verify(&self, secret: &str) -> bool;
}

/// SHA-256 hex digest of an API key
pub fn hash_api_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// Verifier holding the precomputed hash of the single shared API key
#[derive(Clone)]
pub struct Sha256KeyVerifier {
    expected: [u8; 32],
}

impl Sha256KeyVerifier {
    /// Build from a hex-encoded SHA-256 digest
    pub fn from_hex(hash: &str) -> PhotoGuardResult<Self> {
        let bytes = hex::decode(hash.trim())
            .map_err(|e| PhotoGuardError::config(format!("API key hash is not valid hex: {}", e)))?;
        let expected: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            PhotoGuardError::config(format!(
                "API key hash must be 32 bytes (64 hex chars), got {} bytes",
                b.len()
            ))
        })?;
        Ok(Self { expected })
    }

    /// Build from the plain key (tests and local runs)
    pub fn from_key(key: &str) -> Self {
        Self {
            expected: Sha256::digest(key.as_bytes()).into(),
        }
    }
}

impl std::fmt::Debug for Sha256KeyVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sha256KeyVerifier").finish_non_exhaustive()
    }
}

impl CredentialVerifier for Sha256KeyVerifier {
    fn verify(&self, secret: &str) -> bool {
        if secret.is_empty() {
            return false;
        }
        let presented: [u8; 32] = Sha256::digest(secret.as_bytes()).into();
        let ok = constant_time_eq(&presented, &self.expected);
        if !ok {
            debug!("API key hash mismatch");
        }
        ok
    }
}

fn constant_time_eq(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
