//! Password hashing using Argon2id
//!
//! Hashes are stored as PHC strings, so the parameters used for a hash travel
//! with it and verification works across configuration changes.
//!
//! # Example
//!
//! ```rust,ignore
//! use todo_service::auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::default();
//! let hash = hasher.hash("my_secure_password")?;
//! assert!(hasher.verify("my_secure_password", &hash)?);
//! assert!(!hasher.verify("wrong_password", &hash)?);
//! ```

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as Argon2Hasher, PasswordVerifier,
        SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

use crate::config::PasswordConfig;
use crate::error::{Error, Result};

/// Password hasher using Argon2id
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    min_password_length: usize,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("m_cost", &self.params.m_cost())
            .field("t_cost", &self.params.t_cost())
            .field("p_cost", &self.params.p_cost())
            .field("min_password_length", &self.min_password_length)
            .finish()
    }
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
    /// # Errors
    ///
    /// Returns [`Error::Auth`] when the Argon2 parameters are out of range.
    pub fn new(config: &PasswordConfig) -> Result<Self> {
        let params = Params::new(
            config.memory_cost_kib,
            config.time_cost,
            config.parallelism,
            None,
        )
        .map_err(|e| Error::Auth(format!("Invalid Argon2 parameters: {}", e)))?;

        Ok(Self {
            params,
            min_password_length: config.min_password_length,
        })
    }

    /// Hash a password into a PHC string
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] when the password is shorter than the
    /// configured minimum, [`Error::Auth`] on a hashing failure.
    pub fn hash(&self, password: &str) -> Result<String> {
        if password.chars().count() < self.min_password_length {
            return Err(Error::ValidationError(format!(
                "Password must be at least {} characters",
                self.min_password_length
            )));
        }

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());

        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| Error::Auth(format!("Failed to hash password: {}", e)))?;

        Ok(hash.to_string())
    }

    /// Verify a password against a PHC string
    ///
    /// Returns `Ok(false)` on a mismatch and an error only when the stored
    /// hash cannot be parsed.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| Error::Auth(format!("Invalid password hash format: {}", e)))?;

        // parameters are read from the hash itself
        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(Error::Auth(format!("Password verification failed: {}", e))),
        }
    }

    /// Minimum accepted password length
    pub fn min_password_length(&self) -> usize {
        self.min_password_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Cheap parameters so tests stay fast
    fn fast_hasher() -> PasswordHasher {
        PasswordHasher::new(&PasswordConfig {
            memory_cost_kib: 1024,
            time_cost: 1,
            parallelism: 1,
            min_password_length: 6,
        })
        .unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = fast_hasher();
        let hash = hasher.hash("test_password_123").unwrap();
        assert!(hash.starts_with("$argon2id$"));

        assert!(hasher.verify("test_password_123", &hash).unwrap());
        assert!(!hasher.verify("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_password_too_short() {
        let result = fast_hasher().hash("short");
        match result {
            Err(Error::ValidationError(msg)) => assert!(msg.contains("at least 6 characters")),
            other => panic!("Expected ValidationError, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_params_are_rejected() {
        let config = PasswordConfig {
            parallelism: 0,
            ..PasswordConfig::default()
        };
        assert!(PasswordHasher::new(&config).is_err());
    }

    #[test]
    fn test_invalid_hash_format() {
        assert!(fast_hasher().verify("password", "not_a_valid_hash").is_err());
    }

    #[test]
    fn test_different_hashes_for_same_password() {
        let hasher = fast_hasher();
        let first = hasher.hash("same_password").unwrap();
        let second = hasher.hash("same_password").unwrap();
        assert_ne!(first, second);
        assert!(hasher.verify("same_password", &first).unwrap());
        assert!(hasher.verify("same_password", &second).unwrap());
    }
}
