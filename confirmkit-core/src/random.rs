//! Cryptographically secure random bytes.

use rand::{rngs::OsRng, RngCore};

use crate::error::{ConfirmError, ConfirmResult};

/// Source of random bytes used for keys and tokens.
pub trait RandomSource: Send + Sync {
    /// Returns `len` random bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfirmError::EntropyUnavailable`] if the underlying
    /// generator fails. Implementations do not retry.
    fn next_bytes(&self, len: usize) -> ConfirmResult<Vec<u8>>;
}

/// Random source backed by the operating system generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn next_bytes(&self, len: usize) -> ConfirmResult<Vec<u8>> {
        let mut bytes = vec![0u8; len];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|err| ConfirmError::EntropyUnavailable(err.to_string()))?;
        Ok(bytes)
    }
}
