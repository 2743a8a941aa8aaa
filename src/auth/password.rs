//! Password hashing and verification using Argon2id.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::config::HashingConfig;
use crate::error::{AppError, CredentialError};

/// Salted, memory-hard credential hasher.
///
/// Hashes are PHC strings (`$argon2id$v=19$m=..,t=..,p=..$salt$digest`), so the
/// salt and cost travel with the hash and verification never needs the
/// current configuration.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
    decoy_hash: String,
}

// Hashed once at startup so lookups of unknown emails pay the same cost.
const DECOY_SECRET: &str = "bookmark-server decoy credential";

impl CredentialHasher {
    pub fn new(config: &HashingConfig) -> Result<Self, AppError> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| AppError::ConfigError(format!("invalid hashing parameters: {}", e)))?;

        let mut hasher = Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            decoy_hash: String::new(),
        };
        hasher.decoy_hash = hasher.hash(DECOY_SECRET)?;

        Ok(hasher)
    }

    pub fn hash(&self, secret: &str) -> Result<String, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| CredentialError::HashingFailed(e.to_string()))?
            .to_string();

        Ok(hash)
    }

    /// `Ok(false)` on mismatch; only an unparsable hash is an error.
    ///
    /// The digest comparison inside `verify_password` is constant time.
    pub fn verify(&self, hashed: &str, secret: &str) -> Result<bool, CredentialError> {
        let parsed = PasswordHash::new(hashed).map_err(|_| CredentialError::MalformedHash)?;

        match self.argon2.verify_password(secret.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(_) => Err(CredentialError::MalformedHash),
        }
    }

    /// Runs a full verification against a hash no account owns.
    pub fn verify_decoy(&self, secret: &str) {
        let _ = self.verify(&self.decoy_hash, secret);
    }
}
