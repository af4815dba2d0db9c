//! Argon2id salted credential hashing.
//!
//! Credentials are stored as `argon2id$<salt hex>$<digest hex>` and
//! compared by re-deriving the digest, never as plaintext.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use thiserror::Error;

/// Argon2id parameters: 64 MB memory, 3 iterations, 1 lane of parallelism.
const ARGON2_MEMORY_KIB: u32 = 65536; // 64 MB
const ARGON2_ITERATIONS: u32 = 3;
const ARGON2_PARALLELISM: u32 = 1;
const ARGON2_OUTPUT_LEN: usize = 32;

/// Salt length in bytes.
const SALT_LEN: usize = 16;

/// Record prefix identifying the scheme, kept in the stored string so the
/// format can evolve without guessing.
const SCHEME: &str = "argon2id";

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("stored credential record is malformed")]
    MalformedRecord,
}

/// Whether a password meets the minimum strength bar:
/// at least 8 characters with an uppercase letter, a lowercase letter,
/// and a digit.
pub fn password_is_strong(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let digest = derive(password, &salt)?;
    Ok(format!(
        "{SCHEME}${}${}",
        hex::encode(salt),
        hex::encode(digest)
    ))
}

/// Verify a password against a stored credential record.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, PasswordError> {
    let mut parts = stored.split('$');
    let (Some(scheme), Some(salt_hex), Some(digest_hex), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(PasswordError::MalformedRecord);
    };
    if scheme != SCHEME {
        return Err(PasswordError::MalformedRecord);
    }
    let salt = hex::decode(salt_hex).map_err(|_| PasswordError::MalformedRecord)?;
    let expected = hex::decode(digest_hex).map_err(|_| PasswordError::MalformedRecord)?;
    if expected.len() != ARGON2_OUTPUT_LEN {
        return Err(PasswordError::MalformedRecord);
    }

    let digest = derive(password, &salt)?;
    Ok(constant_time_eq(&digest, &expected))
}

/// Derive the Argon2id digest for a password + salt.
fn derive(password: &str, salt: &[u8]) -> Result<[u8; ARGON2_OUTPUT_LEN], PasswordError> {
    let params = Params::new(
        ARGON2_MEMORY_KIB,
        ARGON2_ITERATIONS,
        ARGON2_PARALLELISM,
        Some(ARGON2_OUTPUT_LEN),
    )
    .map_err(|e| PasswordError::Hash(format!("invalid Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let mut out = [0u8; ARGON2_OUTPUT_LEN];
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut out)
        .map_err(|e| PasswordError::Hash(format!("key derivation failed: {e}")))?;
    Ok(out)
}

/// Compare digests without early exit on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
