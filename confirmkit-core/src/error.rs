//! Error types for the confirmation engine.

use thiserror::Error;

/// Result type for engine operations.
pub type ConfirmResult<T> = Result<T, ConfirmError>;

/// Result type for record store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised while creating or validating a confirmation.
#[derive(Debug, Error)]
pub enum ConfirmError {
    /// The supplied key, token hash or configuration value is malformed.
    #[error("invalid input: {0}")]
    InputInvalid(String),

    /// No confirmation record exists for the supplied key.
    #[error("confirmation not found: {0}")]
    NotFound(String),

    /// The deferred handler could not be resolved.
    #[error("handler unresolved: {0}")]
    HandlerUnresolved(#[from] ResolveError),

    /// The record store failed.
    #[error("persistence failed: {0}")]
    PersistenceFailed(#[from] StoreError),

    /// No unique key was found within the allocation budget.
    #[error("key space exhausted after {attempts} attempts")]
    KeySpaceExhausted {
        /// Number of allocation attempts made.
        attempts: u32,
    },

    /// The deferred handler failed while being dispatched.
    #[error("handler fault: {0}")]
    HandlerFault(String),

    /// The operating system random source failed.
    #[error("entropy unavailable: {0}")]
    EntropyUnavailable(String),
}

/// Errors raised when a handler selector cannot be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The method selector is empty.
    #[error("empty method selector")]
    EmptyMethod,

    /// The module selector is present but empty.
    #[error("empty module selector")]
    EmptyModule,

    /// A dotted method selector was combined with an explicit module.
    #[error("unexpected group prefix in method `{method}` for module `{module}`")]
    AmbiguousSelector {
        /// Module selector.
        module: String,
        /// Offending method selector.
        method: String,
    },

    /// Without a module the method selector must read `<group>.<method>`.
    #[error("expected `<group>.<method>`, got `{0}`")]
    MalformedSelector(String),

    /// No module is registered under the given name.
    #[error("module not found: {0}")]
    ModuleNotFound(String),

    /// No capability group is registered under the given name.
    #[error("group not found: {0}")]
    GroupNotFound(String),

    /// The module or group exists but does not export the method.
    #[error("method `{method}` not found in `{owner}`")]
    MethodNotFound {
        /// Module or group name.
        owner: String,
        /// Missing method name.
        method: String,
    },
}

/// Errors raised by record store backends.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A record with the same key already exists.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// The backing storage failed.
    #[error("backend error: {0}")]
    Backend(String),

    /// Records could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A lock guarding the store could not be acquired.
    #[error("store lock error: {0}")]
    Lock(String),

    /// The on-disk snapshot uses an unknown format version.
    #[error("unsupported snapshot version: {0}")]
    UnsupportedVersion(u32),
}

impl StoreError {
    pub(crate) fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }

    pub(crate) fn lock(err: impl std::fmt::Display) -> Self {
        Self::Lock(err.to_string())
    }
}
