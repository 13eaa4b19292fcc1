//! Argon2id implementation of the `CredentialHasher` port.
//!
//! Both operations run on tokio's blocking pool so a sign-in burst cannot
//! stall the actix workers.

use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash as EncodedHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use async_trait::async_trait;
use rand::RngCore;
use tokio::task;
use zeroize::Zeroizing;

use crate::domain::ports::{CredentialHasher, CredentialHasherError};
use crate::domain::{Password, PasswordHash};

/// Argon2id with default parameters and a 16-byte random salt per hash.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2CredentialHasher;

impl Argon2CredentialHasher {
    /// Create a hasher.
    pub fn new() -> Self {
        Self
    }
}

fn hash_blocking(secret: &[u8]) -> Result<PasswordHash, CredentialHasherError> {
    let mut salt_bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|err| CredentialHasherError::hash(err.to_string()))?;

    Argon2::default()
        .hash_password(secret, &salt)
        .map(|hash| PasswordHash::new(hash.to_string()))
        .map_err(|err| CredentialHasherError::hash(err.to_string()))
}

fn verify_blocking(candidate: &[u8], encoded: &str) -> Result<bool, CredentialHasherError> {
    let parsed = EncodedHash::new(encoded)
        .map_err(|err| CredentialHasherError::malformed_hash(err.to_string()))?;
    Ok(Argon2::default().verify_password(candidate, &parsed).is_ok())
}

fn join_failed(err: task::JoinError) -> CredentialHasherError {
    CredentialHasherError::hash(format!("hashing task did not complete: {err}"))
}

#[async_trait]
impl CredentialHasher for Argon2CredentialHasher {
    async fn hash(&self, password: &Password) -> Result<PasswordHash, CredentialHasherError> {
        let secret = Zeroizing::new(password.expose().to_owned());
        task::spawn_blocking(move || hash_blocking(secret.as_bytes()))
            .await
            .map_err(join_failed)?
    }

    async fn verify(
        &self,
        candidate: &str,
        hash: &PasswordHash,
    ) -> Result<bool, CredentialHasherError> {
        let candidate = Zeroizing::new(candidate.to_owned());
        let encoded = hash.as_str().to_owned();
        task::spawn_blocking(move || verify_blocking(candidate.as_bytes(), &encoded))
            .await
            .map_err(join_failed)?
    }
}
