//! Salted SHA-256 digests used for keys and token verification.
//!
//! The salt is fed to the digest before the data and is not embedded in the
//! output, so the same salt must be supplied again to reproduce a digest.
//! Link compatibility depends on these exact inputs:
//!
//! - key: `sha256("KEY:" || random_bytes)`, first 16 hex chars
//! - token hash: `sha256(key_hex || token_hex)`, 64 hex chars

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Domain separation salt for key derivation.
pub const KEY_SALT: &[u8] = b"KEY:";

/// Length of a hex-encoded SHA-256 digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// Computes the lowercase hex SHA-256 digest of `salt || data`.
#[must_use]
pub fn salted_digest(data: &[u8], salt: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Digest of random bytes used to derive a confirmation key.
#[must_use]
pub fn key_digest(random: &[u8]) -> String {
    salted_digest(random, KEY_SALT)
}

/// Hash of a stored token as embedded in confirmation links.
#[must_use]
pub fn token_hash(token: &str, key: &str) -> String {
    salted_digest(token.as_bytes(), key.as_bytes())
}

/// Compares two digests in constant time with respect to their content.
#[must_use]
pub fn hashes_match(expected: &str, supplied: &str) -> bool {
    expected.as_bytes().ct_eq(supplied.as_bytes()).into()
}
