//! Credential hashing.
//!
//! Stored credentials are argon2id PHC strings (salted). Verification
//! is a parse-and-compare against the stored string; callers treat a
//! `false` result as an authentication failure without learning why.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use thiserror::Error;

/// Errors from credential hashing.
#[derive(Debug, Error)]
pub enum SecretError {
    /// The hasher rejected the input.
    #[error("failed to hash credential: {0}")]
    Hash(String),
}

/// Hash a secret with a freshly generated salt.
///
/// Returns a PHC-format string suitable for storage, e.g.
/// `$argon2id$v=19$m=19456,t=2,p=1$...`.
pub fn hash_secret(secret: &str) -> Result<String, SecretError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| SecretError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify a secret against a stored PHC string.
///
/// A malformed stored string verifies as `false` rather than erroring;
/// the caller cannot distinguish corruption from a wrong secret.
pub fn verify_secret(secret: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let stored = hash_secret("hunter42").unwrap();
        assert!(stored.starts_with("$argon2"));
        assert!(verify_secret("hunter42", &stored));
        assert!(!verify_secret("hunter43", &stored));
    }

    #[test]
    fn test_unique_salts() {
        let a = hash_secret("same secret").unwrap();
        let b = hash_secret("same secret").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_stored_hash() {
        assert!(!verify_secret("anything", "not-a-phc-string"));
        assert!(!verify_secret("anything", ""));
    }
}
