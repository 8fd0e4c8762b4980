//! Password verification

use std::fmt;

use rand::rngs::OsRng;
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};

/// Checks a login candidate against the configured password
pub trait PasswordVerifier: Send + Sync {
    fn verify(&self, candidate: &str) -> bool;
}

/// Keyed BLAKE3 digest of the configured password
///
/// The key is random per process, so the digest is useless outside it.
/// Comparison goes through `blake3::Hash` equality, which is constant time.
pub struct KeyedPasswordHash {
    key: [u8; 32],
    digest: blake3::Hash,
}

impl KeyedPasswordHash {
    pub fn new(password: &SecretString) -> Self {
        let key: [u8; 32] = OsRng.gen();
        let digest = blake3::keyed_hash(&key, password.expose_secret().as_bytes());
        Self { key, digest }
    }
}

impl PasswordVerifier for KeyedPasswordHash {
    fn verify(&self, candidate: &str) -> bool {
        blake3::keyed_hash(&self.key, candidate.as_bytes()) == self.digest
    }
}

impl fmt::Debug for KeyedPasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedPasswordHash").finish_non_exhaustive()
    }
}
