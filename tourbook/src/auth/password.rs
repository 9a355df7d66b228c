//! Password hashing using Argon2id
//!
//! Stored user passwords are PHC strings produced by [`PasswordHasher::hash`].
//!
//! # Example
//!
//! ```rust,ignore
//! use tourbook::auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::default();
//! let hash = hasher.hash("pass1234")?;
//! assert!(hasher.verify("pass1234", &hash)?);
//! assert!(!hasher.verify("wrong_password", &hash)?);
//! ```

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as Argon2Hasher, PasswordVerifier,
        SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

use crate::auth::config::PasswordConfig;
use crate::error::Error;

/// Password hasher using Argon2id
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    min_password_length: usize,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
            min_password_length: PasswordConfig::default().min_password_length,
        }
    }
}

impl PasswordHasher {
    /// Create a hasher from configuration
    ///
    /// Fails with [`Error::Config`] if Argon2 rejects the parameters.
    pub fn new(config: &PasswordConfig) -> Result<Self, Error> {
        let params = Params::new(
            config.memory_cost_kib,
            config.time_cost,
            config.parallelism,
            None,
        )
        .map_err(|e| {
            Error::Config(Box::new(figment::Error::from(format!(
                "Invalid Argon2 parameters: {}",
                e
            ))))
        })?;

        Ok(Self {
            params,
            min_password_length: config.min_password_length,
        })
    }

    /// Message reported when `password` is too short, if it is
    pub fn check_length(&self, password: &str) -> Option<String> {
        (password.chars().count() < self.min_password_length).then(|| {
            format!(
                "Password must be at least {} characters",
                self.min_password_length
            )
        })
    }

    /// Hash a password into a PHC string
    pub fn hash(&self, password: &str) -> Result<String, Error> {
        if let Some(message) = self.check_length(password) {
            return Err(Error::BadRequest(message));
        }

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());

        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| Error::Internal(format!("Failed to hash password: {}", e)))?;

        Ok(hash.to_string())
    }

    /// Verify a password against a PHC hash
    ///
    /// Uses constant-time comparison. A malformed hash is an error, not a
    /// mismatch.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, Error> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| Error::Internal(format!("Invalid password hash format: {}", e)))?;

        // Parameters are read from the hash
        let argon2 = Argon2::default();

        match argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(Error::Internal(format!(
                "Password verification failed: {}",
                e
            ))),
        }
    }

    /// Get the minimum password length requirement
    pub fn min_password_length(&self) -> usize {
        self.min_password_length
    }
}
