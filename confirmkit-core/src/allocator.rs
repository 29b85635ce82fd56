//! Allocation of unique confirmation keys.

use tracing::{debug, error};

use crate::error::{ConfirmError, ConfirmResult};
use crate::hash::key_digest;
use crate::random::RandomSource;
use crate::record::ConfirmationKey;
use crate::store::ConfirmationStore;

/// Draws keys until one is unused in the store, within a fixed budget.
pub struct KeyAllocator<'a> {
    random: &'a dyn RandomSource,
    entropy_bytes: usize,
    max_attempts: u32,
}

impl<'a> KeyAllocator<'a> {
    /// Creates an allocator drawing `entropy_bytes` per attempt and giving up
    /// after `max_attempts` collisions.
    #[must_use]
    pub fn new(random: &'a dyn RandomSource, entropy_bytes: usize, max_attempts: u32) -> Self {
        Self {
            random,
            entropy_bytes,
            max_attempts,
        }
    }

    /// Returns the attempt budget.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Derives one candidate key from fresh randomness.
    ///
    /// # Errors
    ///
    /// Returns [`ConfirmError::EntropyUnavailable`] if the random source fails.
    pub fn candidate(&self) -> ConfirmResult<ConfirmationKey> {
        let random = self.random.next_bytes(self.entropy_bytes)?;
        ConfirmationKey::from_digest(&key_digest(&random))
    }

    /// Returns a key not present in `store`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfirmError::KeySpaceExhausted`] once the budget is spent,
    /// [`ConfirmError::PersistenceFailed`] if the store cannot be read, or
    /// [`ConfirmError::EntropyUnavailable`] if the random source fails.
    pub fn allocate(&self, store: &dyn ConfirmationStore) -> ConfirmResult<ConfirmationKey> {
        let mut budget = self.max_attempts;
        self.allocate_within(store, &mut budget)
    }

    /// Like [`Self::allocate`], drawing attempts from a budget shared with
    /// the caller.
    pub(crate) fn allocate_within(
        &self,
        store: &dyn ConfirmationStore,
        budget: &mut u32,
    ) -> ConfirmResult<ConfirmationKey> {
        while *budget > 0 {
            *budget -= 1;
            let key = self.candidate()?;
            if store.find_by_key(&key)?.is_none() {
                return Ok(key);
            }
            debug!(key = %key, remaining = *budget, "confirmation key collision, retrying");
        }
        error!(attempts = self.max_attempts, "no unique confirmation key found");
        Err(ConfirmError::KeySpaceExhausted {
            attempts: self.max_attempts,
        })
    }
}
