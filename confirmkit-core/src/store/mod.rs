//! Persistence of confirmation records.
//!
//! The engine treats the store as a keyed document store with two extra
//! guarantees: `create` rejects duplicate keys and `conditional_update`
//! only applies while the stored token still equals the expected one.

mod file;
mod lock;
mod memory;
mod paths;

pub use file::FileStore;
pub use lock::{StoreLock, StoreLockGuard};
pub use memory::MemoryStore;
pub use paths::StorePaths;

use crate::error::StoreResult;
use crate::record::{ConfirmationKey, ConfirmationRecord, Token};

/// Result of a conditional update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The token matched; it was cleared and `confirmed` was set.
    Applied,
    /// The record is gone or its token no longer matches.
    Conflict,
}

/// Record store used by the engine.
pub trait ConfirmationStore: Send + Sync {
    /// Fetches the record stored under `key`, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn find_by_key(&self, key: &ConfirmationKey) -> StoreResult<Option<ConfirmationRecord>>;

    /// Persists a new record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateKey`](crate::StoreError::DuplicateKey)
    /// if a record with the same key exists, or a backend error.
    fn create(&self, record: ConfirmationRecord) -> StoreResult<()>;

    /// Clears the token and sets `confirmed = confirmed_at`, but only if the
    /// stored token still equals `expected`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read or written.
    fn conditional_update(
        &self,
        key: &ConfirmationKey,
        expected: &Token,
        confirmed_at: u64,
    ) -> StoreResult<UpdateOutcome>;
}

/// Applies a confirmation to an in-memory record if its token matches.
pub(crate) fn apply_confirmation(
    record: &mut ConfirmationRecord,
    expected: &Token,
    confirmed_at: u64,
) -> UpdateOutcome {
    if record.token.as_ref() != Some(expected) {
        return UpdateOutcome::Conflict;
    }
    record.token = None;
    record.confirmed = Some(confirmed_at);
    UpdateOutcome::Applied
}
