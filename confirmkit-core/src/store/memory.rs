//! In-memory record store backed by a `HashMap`.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::record::{ConfirmationKey, ConfirmationRecord, Token};

use super::{apply_confirmation, ConfirmationStore, UpdateOutcome};

/// Thread-safe in-memory store.
///
/// Conditional updates run under the write lock, so two concurrent
/// confirmations of the same record cannot both apply.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<ConfirmationKey, ConfirmationRecord>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Lock`] if the lock is poisoned.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.records.read().map_err(StoreError::lock)?.len())
    }

    /// Returns `true` if no records are stored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Lock`] if the lock is poisoned.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl ConfirmationStore for MemoryStore {
    fn find_by_key(&self, key: &ConfirmationKey) -> StoreResult<Option<ConfirmationRecord>> {
        Ok(self
            .records
            .read()
            .map_err(StoreError::lock)?
            .get(key)
            .cloned())
    }

    fn create(&self, record: ConfirmationRecord) -> StoreResult<()> {
        let mut records = self.records.write().map_err(StoreError::lock)?;
        if records.contains_key(&record.key) {
            return Err(StoreError::DuplicateKey(record.key.to_string()));
        }
        records.insert(record.key.clone(), record);
        Ok(())
    }

    fn conditional_update(
        &self,
        key: &ConfirmationKey,
        expected: &Token,
        confirmed_at: u64,
    ) -> StoreResult<UpdateOutcome> {
        let mut records = self.records.write().map_err(StoreError::lock)?;
        Ok(records
            .get_mut(key)
            .map_or(UpdateOutcome::Conflict, |record| {
                apply_confirmation(record, expected, confirmed_at)
            }))
    }
}
