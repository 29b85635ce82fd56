//! Validation of inbound confirmation requests.
//!
//! An attempt is classified in this order, the first match winning:
//!
//! 1. the token is already gone or blank: [`Outcome::Again`]
//! 2. the supplied hash differs from the stored token's hash: [`Outcome::InvalidHash`]
//! 3. the record expired: [`Outcome::Expired`]
//! 4. the conditional update applied: [`Outcome::Success`]; it lost a race
//!    against a concurrent confirmation: [`Outcome::Again`]; the store
//!    failed: [`Outcome::CantUpdate`]
//!
//! Only step 4 mutates the record, and it does so before the handler runs.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error, warn};

use crate::error::{ConfirmError, ConfirmResult};
use crate::handler::{Handler, HandlerRegistry, Reply};
use crate::hash::{hashes_match, token_hash};
use crate::outcome::Outcome;
use crate::record::{ConfirmationKey, ConfirmationRecord};
use crate::store::{ConfirmationStore, UpdateOutcome};

/// Result of a validated confirmation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    /// Key of the confirmation record.
    pub key: ConfirmationKey,
    /// How the attempt concluded.
    pub outcome: Outcome,
    /// Reply produced by the handler.
    pub reply: Reply,
}

/// Validates `(key, token hash)` pairs and dispatches to the handler.
pub struct ConfirmationValidator<'a> {
    store: &'a dyn ConfirmationStore,
    registry: &'a HandlerRegistry,
}

impl<'a> ConfirmationValidator<'a> {
    /// Creates a validator over the given collaborators.
    #[must_use]
    pub fn new(store: &'a dyn ConfirmationStore, registry: &'a HandlerRegistry) -> Self {
        Self { store, registry }
    }

    /// Validates a confirmation attempt at time `now` and invokes the
    /// registered handler with the resulting outcome.
    ///
    /// # Errors
    ///
    /// - [`ConfirmError::InputInvalid`] if either value is empty after
    ///   trimming or the key is malformed
    /// - [`ConfirmError::NotFound`] if no record exists for the key
    /// - [`ConfirmError::PersistenceFailed`] if the record cannot be read
    /// - [`ConfirmError::HandlerUnresolved`] if the handler is gone
    /// - [`ConfirmError::HandlerFault`] if the handler fails or panics
    pub fn validate(
        &self,
        id: &str,
        supplied_hash: &str,
        now: u64,
    ) -> ConfirmResult<Confirmation> {
        let id = id.trim();
        let supplied_hash = supplied_hash.trim();
        if id.is_empty() || supplied_hash.is_empty() {
            return Err(ConfirmError::InputInvalid(
                "missing confirmation key or token hash".to_string(),
            ));
        }
        let key = ConfirmationKey::parse(id)?;

        let record = match self.store.find_by_key(&key) {
            Ok(Some(record)) => record,
            Ok(None) => {
                warn!(key = %key, "request for missing confirmation");
                return Err(ConfirmError::NotFound(key.to_string()));
            }
            Err(err) => {
                error!(key = %key, error = %err, "fetching confirmation record failed");
                return Err(err.into());
            }
        };

        let handler = self.registry.resolve(&record.selector).map_err(|err| {
            error!(key = %key, handler = %record.selector, error = %err, "missing confirmation handler");
            ConfirmError::from(err)
        })?;

        let outcome = self.classify(&record, supplied_hash, now);
        let reply = dispatch(handler.as_ref(), &key, outcome, &record.argument)?;
        Ok(Confirmation {
            key,
            outcome,
            reply,
        })
    }

    fn classify(&self, record: &ConfirmationRecord, supplied_hash: &str, now: u64) -> Outcome {
        let Some(token) = record.pending_token() else {
            return Outcome::Again;
        };

        let expected = token_hash(token.expose(), record.key.as_str());
        if !hashes_match(&expected, supplied_hash) {
            return Outcome::InvalidHash;
        }

        if record.is_expired(now) {
            return Outcome::Expired;
        }

        match self.store.conditional_update(&record.key, token, now) {
            Ok(UpdateOutcome::Applied) => Outcome::Success,
            Ok(UpdateOutcome::Conflict) => {
                debug!(key = %record.key, "confirmation consumed by a concurrent request");
                Outcome::Again
            }
            Err(err) => {
                error!(key = %record.key, error = %err, "failed marking successful confirmation");
                Outcome::CantUpdate
            }
        }
    }
}

/// Invokes the handler, turning errors and panics into
/// [`ConfirmError::HandlerFault`].
fn dispatch(
    handler: &dyn Handler,
    key: &ConfirmationKey,
    outcome: Outcome,
    argument: &str,
) -> ConfirmResult<Reply> {
    match panic::catch_unwind(AssertUnwindSafe(|| handler.invoke(outcome, argument))) {
        Ok(Ok(reply)) => Ok(reply),
        Ok(Err(fault)) => {
            error!(key = %key, %outcome, error = %fault, "processing confirmation failed");
            Err(ConfirmError::HandlerFault(fault.to_string()))
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(key = %key, %outcome, panic = %message, "confirmation handler panicked");
            Err(ConfirmError::HandlerFault(message))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "handler panicked".to_string())
}
