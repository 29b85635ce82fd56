//! Deferred-confirmation engine.
//!
//! An application registers a deferred action ("activate this account",
//! "apply this email change") and receives a link of the form
//! `/<prefix>/process/<key>/<token hash>`. Following the link validates the
//! token once, records the confirmation, and dispatches the action with the
//! [`Outcome`] of the attempt.
//!
//! [`ConfirmationEngine`] bundles the pieces. [`ProcessFactory`] and
//! [`ConfirmationValidator`] can be used directly for finer control over
//! time and collaborators.
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod allocator;
pub mod config;
pub mod engine;
pub mod error;
pub mod handler;
pub mod hash;
pub mod outcome;
pub mod process;
pub mod random;
pub mod record;
pub mod response;
pub mod store;
pub mod validator;

pub use allocator::KeyAllocator;
pub use config::EngineConfig;
pub use engine::{current_timestamp, ConfirmationEngine};
pub use error::{ConfirmError, ConfirmResult, ResolveError, StoreError, StoreResult};
pub use handler::{Handler, HandlerFault, HandlerModule, HandlerRegistry, HandlerResult, Reply};
pub use outcome::Outcome;
pub use process::{ConfirmationPath, ProcessFactory};
pub use random::{OsRandom, RandomSource};
pub use record::{ConfirmationKey, ConfirmationRecord, HandlerSelector, Token};
pub use response::{standard_status, status_for, StandardReply};
pub use store::{ConfirmationStore, FileStore, MemoryStore, StorePaths, UpdateOutcome};
pub use validator::{Confirmation, ConfirmationValidator};
