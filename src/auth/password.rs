//! Salted password hashing with Argon2.

use crate::errors::{Error, Result};
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand_core::OsRng;
use std::sync::OnceLock;

static DUMMY_HASH: OnceLock<String> = OnceLock::new();

/// Hashes `password` with a fresh random salt and returns the PHC string.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::PasswordHash {
            message: e.to_string(),
        })
}

/// Checks `password` against a stored PHC string.
///
/// A malformed stored hash is an error; a mismatch is `Ok(false)`.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| Error::PasswordHash {
        message: e.to_string(),
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Runs one full verification against a fixed throwaway hash.
///
/// Used when no account matches a sign-in, so the reply takes as long as a
/// wrong password would. Always `Ok(false)`.
pub fn verify_against_dummy(password: &str) -> Result<bool> {
    let stored = match DUMMY_HASH.get() {
        Some(hash) => hash,
        None => {
            let hash = hash_password("basket-buddy placeholder")?;
            DUMMY_HASH.get_or_init(|| hash)
        }
    };
    verify_password(password, stored)?;
    Ok(false)
}
