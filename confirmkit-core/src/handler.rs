//! Deferred handlers and the registry resolving them by name.
//!
//! Handlers are registered explicitly, either under a module name or under a
//! capability group. A [`HandlerSelector`] is resolved both when a process is
//! created and again when it is confirmed, since the registry may change in
//! between.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;

use crate::error::ResolveError;
use crate::outcome::Outcome;
use crate::record::HandlerSelector;

/// Separator between group and method in a qualified method selector.
pub const GROUP_SEPARATOR: char = '.';

/// Response a handler asks the boundary to return to the requester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// HTTP-style status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl Reply {
    /// Creates a reply with an explicit status.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Creates a `200` reply.
    #[must_use]
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }
}

/// Failure raised by a handler while processing a confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HandlerFault(pub String);

impl HandlerFault {
    /// Creates a fault with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Result returned by handlers.
pub type HandlerResult = Result<Reply, HandlerFault>;

/// A deferred action invoked with the outcome of a confirmation attempt.
pub trait Handler: Send + Sync {
    /// Processes a concluded confirmation attempt.
    ///
    /// # Errors
    ///
    /// Returns a [`HandlerFault`] if the deferred action fails.
    fn invoke(&self, outcome: Outcome, argument: &str) -> HandlerResult;
}

impl<F> Handler for F
where
    F: Fn(Outcome, &str) -> HandlerResult + Send + Sync,
{
    fn invoke(&self, outcome: Outcome, argument: &str) -> HandlerResult {
        self(outcome, argument)
    }
}

/// Named set of handlers exported by one module or capability group.
#[derive(Clone, Default)]
pub struct HandlerModule {
    methods: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerModule {
    /// Creates an empty module.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `handler` under `method` and returns the module.
    #[must_use]
    pub fn with(mut self, method: impl Into<String>, handler: impl Handler + 'static) -> Self {
        self.insert(method, Arc::new(handler));
        self
    }

    /// Adds or replaces the handler for `method`.
    pub fn insert(&mut self, method: impl Into<String>, handler: Arc<dyn Handler>) {
        self.methods.insert(method.into(), handler);
    }

    /// Returns the handler exported as `method`.
    #[must_use]
    pub fn get(&self, method: &str) -> Option<Arc<dyn Handler>> {
        self.methods.get(method).cloned()
    }

    /// Returns the exported method names, sorted.
    #[must_use]
    pub fn methods(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods.keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for HandlerModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerModule")
            .field("methods", &self.methods())
            .finish()
    }
}

/// Registry mapping selectors to handlers.
#[derive(Default)]
pub struct HandlerRegistry {
    modules: RwLock<HashMap<String, HandlerModule>>,
    groups: RwLock<HashMap<String, HandlerModule>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `module` under `name` and returns the registry.
    #[must_use]
    pub fn with_module(self, name: impl Into<String>, module: HandlerModule) -> Self {
        self.register_module(name, module);
        self
    }

    /// Registers the capability group `name` and returns the registry.
    #[must_use]
    pub fn with_group(self, name: impl Into<String>, group: HandlerModule) -> Self {
        self.register_group(name, group);
        self
    }

    /// Registers or replaces a module.
    pub fn register_module(&self, name: impl Into<String>, module: HandlerModule) {
        self.modules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), module);
    }

    /// Registers or replaces a capability group.
    pub fn register_group(&self, name: impl Into<String>, group: HandlerModule) {
        self.groups
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), group);
    }

    /// Removes a module, returning it if it was registered.
    pub fn remove_module(&self, name: &str) -> Option<HandlerModule> {
        self.modules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    /// Removes a capability group, returning it if it was registered.
    pub fn remove_group(&self, name: &str) -> Option<HandlerModule> {
        self.groups
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    /// Looks up a module by name.
    #[must_use]
    pub fn resolve_module(&self, name: &str) -> Option<HandlerModule> {
        self.modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Looks up `method` in the capability group `group`.
    #[must_use]
    pub fn resolve_named_capability(&self, group: &str, method: &str) -> Option<Arc<dyn Handler>> {
        self.groups
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(group)
            .and_then(|group| group.get(method))
    }

    /// Resolves a selector to its handler.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] describing why the selector is malformed or
    /// which part of it is not registered.
    pub fn resolve(&self, selector: &HandlerSelector) -> Result<Arc<dyn Handler>, ResolveError> {
        let method = selector.method.as_str();
        if method.is_empty() {
            return Err(ResolveError::EmptyMethod);
        }

        if let Some(module_name) = selector.module.as_deref() {
            if module_name.is_empty() {
                return Err(ResolveError::EmptyModule);
            }
            if method.contains(GROUP_SEPARATOR) {
                return Err(ResolveError::AmbiguousSelector {
                    module: module_name.to_string(),
                    method: method.to_string(),
                });
            }
            let module = self
                .resolve_module(module_name)
                .ok_or_else(|| ResolveError::ModuleNotFound(module_name.to_string()))?;
            return module.get(method).ok_or_else(|| ResolveError::MethodNotFound {
                owner: module_name.to_string(),
                method: method.to_string(),
            });
        }

        let (group, name) = split_qualified(method)
            .ok_or_else(|| ResolveError::MalformedSelector(method.to_string()))?;
        if !self
            .groups
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(group)
        {
            return Err(ResolveError::GroupNotFound(group.to_string()));
        }
        self.resolve_named_capability(group, name)
            .ok_or_else(|| ResolveError::MethodNotFound {
                owner: group.to_string(),
                method: name.to_string(),
            })
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modules = self.modules.read().unwrap_or_else(PoisonError::into_inner);
        let groups = self.groups.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("HandlerRegistry")
            .field("modules", &*modules)
            .field("groups", &*groups)
            .finish()
    }
}

/// Splits `<group>.<method>` into its two non-empty parts.
fn split_qualified(method: &str) -> Option<(&str, &str)> {
    let mut parts = method.split(GROUP_SEPARATOR);
    let group = parts.next()?;
    let name = parts.next()?;
    if parts.next().is_some() || group.is_empty() || name.is_empty() {
        return None;
    }
    Some((group, name))
}
