//! Entry point bundling store, handlers, randomness and configuration.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::EngineConfig;
use crate::error::ConfirmResult;
use crate::handler::HandlerRegistry;
use crate::process::{ConfirmationPath, ProcessFactory};
use crate::random::{OsRandom, RandomSource};
use crate::record::HandlerSelector;
use crate::store::ConfirmationStore;
use crate::validator::{Confirmation, ConfirmationValidator};

/// Deferred-confirmation engine.
///
/// Cheap to share behind an `Arc`; every operation takes `&self`.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use confirmkit_core::{
///     ConfirmationEngine, EngineConfig, HandlerModule, HandlerRegistry, MemoryStore, Outcome,
///     Reply,
/// };
///
/// let registry = HandlerRegistry::new().with_group(
///     "user",
///     HandlerModule::new().with("activate", |outcome: Outcome, user: &str| {
///         Ok(Reply::ok(format!("{user}: {outcome}")))
///     }),
/// );
/// let engine = ConfirmationEngine::new(
///     Arc::new(MemoryStore::new()),
///     Arc::new(registry),
///     EngineConfig::default(),
/// )
/// .unwrap();
///
/// let path = engine.create_process_on_group("user", "activate", "alice", None).unwrap();
/// let confirmation = engine.confirm_path(&path.to_string()).unwrap();
/// assert_eq!(confirmation.outcome, Outcome::Success);
/// ```
pub struct ConfirmationEngine {
    store: Arc<dyn ConfirmationStore>,
    registry: Arc<HandlerRegistry>,
    random: Arc<dyn RandomSource>,
    config: EngineConfig,
}

impl ConfirmationEngine {
    /// Creates an engine drawing randomness from the operating system.
    ///
    /// # Errors
    ///
    /// Returns [`ConfirmError::InputInvalid`](crate::ConfirmError::InputInvalid)
    /// if `config` is invalid.
    pub fn new(
        store: Arc<dyn ConfirmationStore>,
        registry: Arc<HandlerRegistry>,
        config: EngineConfig,
    ) -> ConfirmResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            registry,
            random: Arc::new(OsRandom),
            config,
        })
    }

    /// Replaces the random source.
    #[must_use]
    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    /// Returns the engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the record store.
    #[must_use]
    pub fn store(&self) -> &dyn ConfirmationStore {
        self.store.as_ref()
    }

    /// Returns the handler registry.
    #[must_use]
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Returns a process factory borrowing this engine's collaborators.
    #[must_use]
    pub fn factory(&self) -> ProcessFactory<'_> {
        ProcessFactory::new(
            self.store.as_ref(),
            &self.registry,
            self.random.as_ref(),
            &self.config,
        )
    }

    /// Returns a validator borrowing this engine's collaborators.
    #[must_use]
    pub fn validator(&self) -> ConfirmationValidator<'_> {
        ConfirmationValidator::new(self.store.as_ref(), &self.registry)
    }

    /// Creates a confirmation process; see [`ProcessFactory::create_process`].
    ///
    /// # Errors
    ///
    /// See [`ProcessFactory::create_process`].
    pub fn create_process(
        &self,
        selector: &HandlerSelector,
        argument: impl Into<String>,
        expires: Option<u64>,
    ) -> ConfirmResult<ConfirmationPath> {
        self.factory()
            .create_process(selector, argument, expires, current_timestamp())
    }

    /// Creates a confirmation process invoking `group.method`.
    ///
    /// # Errors
    ///
    /// See [`ProcessFactory::create_process`].
    pub fn create_process_on_group(
        &self,
        group: &str,
        method: &str,
        argument: impl Into<String>,
        expires: Option<u64>,
    ) -> ConfirmResult<ConfirmationPath> {
        self.factory()
            .create_process_on_group(group, method, argument, expires, current_timestamp())
    }

    /// Validates a confirmation attempt now.
    ///
    /// # Errors
    ///
    /// See [`ConfirmationValidator::validate`].
    pub fn confirm(&self, key: &str, token_hash: &str) -> ConfirmResult<Confirmation> {
        self.confirm_at(key, token_hash, current_timestamp())
    }

    /// Validates a confirmation attempt at an explicit time.
    ///
    /// # Errors
    ///
    /// See [`ConfirmationValidator::validate`].
    pub fn confirm_at(&self, key: &str, token_hash: &str, now: u64) -> ConfirmResult<Confirmation> {
        self.validator().validate(key, token_hash, now)
    }

    /// Validates the confirmation referenced by a full link path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfirmError::InputInvalid`](crate::ConfirmError::InputInvalid)
    /// if the path does not match the configured prefix, otherwise see
    /// [`ConfirmationValidator::validate`].
    pub fn confirm_path(&self, path: &str) -> ConfirmResult<Confirmation> {
        let path = ConfirmationPath::parse(path, &self.config.path_prefix)?;
        self.confirm(path.key().as_str(), path.token_hash())
    }
}

/// Current Unix time in seconds; `0` if the clock is before the epoch.
#[must_use]
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}
