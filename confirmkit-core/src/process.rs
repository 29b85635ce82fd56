//! Creation of confirmation processes and the links pointing at them.

use std::fmt;

use tracing::{debug, error};

use crate::allocator::KeyAllocator;
use crate::config::EngineConfig;
use crate::error::{ConfirmError, ConfirmResult, StoreError};
use crate::handler::HandlerRegistry;
use crate::hash::token_hash;
use crate::random::RandomSource;
use crate::record::{ConfirmationKey, ConfirmationRecord, HandlerSelector, Token};
use crate::store::ConfirmationStore;

/// Path segment between the prefix and the key.
pub const PROCESS_SEGMENT: &str = "process";

/// Shareable confirmation link: `/<prefix>/process/<key>/<token hash>`.
///
/// Only the salted token hash is embedded; the token stays in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationPath {
    prefix: String,
    key: ConfirmationKey,
    token_hash: String,
}

impl ConfirmationPath {
    /// Builds a path from its parts.
    #[must_use]
    pub fn new(prefix: impl Into<String>, key: ConfirmationKey, token_hash: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            key,
            token_hash: token_hash.into(),
        }
    }

    /// Splits an inbound path into key and token hash.
    ///
    /// # Errors
    ///
    /// Returns [`ConfirmError::InputInvalid`] if the path does not follow the
    /// template for `prefix` or its key is malformed.
    pub fn parse(path: &str, prefix: &str) -> ConfirmResult<Self> {
        let invalid = || ConfirmError::InputInvalid(format!("not a confirmation path: `{path}`"));

        let rest = path
            .trim()
            .strip_prefix('/')
            .and_then(|rest| rest.strip_prefix(prefix))
            .and_then(|rest| rest.strip_prefix('/'))
            .and_then(|rest| rest.strip_prefix(PROCESS_SEGMENT))
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(invalid)?;

        let (key, token_hash) = rest.split_once('/').ok_or_else(invalid)?;
        if token_hash.is_empty() || token_hash.contains('/') {
            return Err(invalid());
        }
        Ok(Self::new(prefix, ConfirmationKey::parse(key)?, token_hash))
    }

    /// Returns the key of the referenced record.
    #[must_use]
    pub const fn key(&self) -> &ConfirmationKey {
        &self.key
    }

    /// Returns the salted token hash.
    #[must_use]
    pub fn token_hash(&self) -> &str {
        &self.token_hash
    }
}

impl fmt::Display for ConfirmationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/{}/{PROCESS_SEGMENT}/{}/{}",
            self.prefix, self.key, self.token_hash
        )
    }
}

/// Registers deferred actions and issues their confirmation links.
pub struct ProcessFactory<'a> {
    store: &'a dyn ConfirmationStore,
    registry: &'a HandlerRegistry,
    random: &'a dyn RandomSource,
    config: &'a EngineConfig,
}

impl<'a> ProcessFactory<'a> {
    /// Creates a factory over the given collaborators.
    #[must_use]
    pub fn new(
        store: &'a dyn ConfirmationStore,
        registry: &'a HandlerRegistry,
        random: &'a dyn RandomSource,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            store,
            registry,
            random,
            config,
        }
    }

    /// Creates a confirmation process for `selector`.
    ///
    /// The handler is resolved before anything is persisted. A key taken by a
    /// concurrent creation between allocation and insert is retried within
    /// the same attempt budget.
    ///
    /// # Errors
    ///
    /// - [`ConfirmError::HandlerUnresolved`] if the selector does not resolve
    /// - [`ConfirmError::KeySpaceExhausted`] if no unique key was found
    /// - [`ConfirmError::PersistenceFailed`] if the store fails
    /// - [`ConfirmError::EntropyUnavailable`] if the random source fails
    pub fn create_process(
        &self,
        selector: &HandlerSelector,
        argument: impl Into<String>,
        expires: Option<u64>,
        now: u64,
    ) -> ConfirmResult<ConfirmationPath> {
        self.registry.resolve(selector)?;

        let allocator =
            KeyAllocator::new(self.random, self.config.entropy_bytes, self.config.key_attempts);
        let argument = argument.into();
        let mut budget = allocator.max_attempts();

        loop {
            let key = allocator.allocate_within(self.store, &mut budget)?;
            let token = Token::generate(self.random, self.config.entropy_bytes)?;
            let hash = token_hash(token.expose(), key.as_str());

            let record = ConfirmationRecord {
                key: key.clone(),
                token: Some(token),
                selector: selector.clone(),
                argument: argument.clone(),
                expires,
                confirmed: None,
                created_at: now,
            };

            match self.store.create(record) {
                Ok(()) => {
                    debug!(key = %key, handler = %selector, "confirmation process created");
                    return Ok(ConfirmationPath::new(
                        self.config.path_prefix.clone(),
                        key,
                        hash,
                    ));
                }
                Err(StoreError::DuplicateKey(_)) if budget > 0 => {
                    debug!(key = %key, "confirmation key taken concurrently, retrying");
                }
                Err(StoreError::DuplicateKey(_)) => {
                    error!(attempts = allocator.max_attempts(), "no unique confirmation key found");
                    return Err(ConfirmError::KeySpaceExhausted {
                        attempts: allocator.max_attempts(),
                    });
                }
                Err(err) => {
                    error!(error = %err, "failed persisting confirmation process");
                    return Err(err.into());
                }
            }
        }
    }

    /// Creates a confirmation process invoking `method` of the capability
    /// group `group`.
    ///
    /// # Errors
    ///
    /// See [`Self::create_process`].
    pub fn create_process_on_group(
        &self,
        group: &str,
        method: &str,
        argument: impl Into<String>,
        expires: Option<u64>,
        now: u64,
    ) -> ConfirmResult<ConfirmationPath> {
        self.create_process(&HandlerSelector::group(group, method), argument, expires, now)
    }
}
