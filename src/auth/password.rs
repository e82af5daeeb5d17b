//! Argon2id password hashing.
//!
//! Hashes are stored in PHC string format, so the parameters and salt travel
//! with the hash and older hashes keep verifying after a cost change.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{Error as HashError, PasswordHash, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHasher as _, PasswordVerifier, Version};
use thiserror::Error;

const PASSWORD_TARGET: &str = "garage::auth::password";

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("invalid password hashing parameters: {0}")]
    Params(String),

    #[error("password hashing failed")]
    Hash,

    #[error("stored password hash is unreadable")]
    CorruptHash,

    #[error("password does not match")]
    Mismatch,
}

#[derive(Debug, Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Builds an Argon2id hasher with the given memory cost (KiB) and
    /// iteration count, single lane.
    pub fn new(memory_kib: u32, iterations: u32) -> Result<Self, PasswordError> {
        let params = Params::new(memory_kib, iterations, 1, None).map_err(|e| {
            tracing::error!(target: PASSWORD_TARGET, error = %e, "Failed to create Argon2 parameters");
            PasswordError::Params(e.to_string())
        })?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!(target: PASSWORD_TARGET, error = %e, "Password hashing operation failed");
                PasswordError::Hash
            })?;

        Ok(hash.to_string())
    }

    pub fn verify(&self, password: &str, stored_hash: &str) -> Result<(), PasswordError> {
        let parsed = PasswordHash::new(stored_hash).map_err(|e| {
            tracing::warn!(target: PASSWORD_TARGET, error = %e, "Invalid password hash format");
            PasswordError::CorruptHash
        })?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(()),
            Err(HashError::Password) => Err(PasswordError::Mismatch),
            Err(e) => {
                tracing::error!(target: PASSWORD_TARGET, error = %e, "Password verification failed");
                Err(PasswordError::Hash)
            }
        }
    }

    /// [`hash`](Self::hash) on the blocking pool, off the async workers.
    pub async fn hash_blocking(&self, password: String) -> Result<String, PasswordError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| {
                tracing::error!(target: PASSWORD_TARGET, error = %e, "Password hashing task failed");
                PasswordError::Hash
            })?
    }

    /// [`verify`](Self::verify) on the blocking pool, off the async workers.
    pub async fn verify_blocking(&self, password: String, stored_hash: String) -> Result<(), PasswordError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &stored_hash))
            .await
            .map_err(|e| {
                tracing::error!(target: PASSWORD_TARGET, error = %e, "Password verification task failed");
                PasswordError::Hash
            })?
    }
}
