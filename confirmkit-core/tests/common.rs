//! Common test utilities shared across integration tests.
#![allow(dead_code, reason = "each test binary uses a subset")]
#![allow(missing_docs, reason = "test helpers")]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use confirmkit_core::{
    ConfirmResult, ConfirmationEngine, ConfirmationKey, ConfirmationRecord, ConfirmationStore,
    EngineConfig, HandlerFault, HandlerModule, HandlerRegistry, HandlerResult, MemoryStore,
    Outcome, RandomSource, Reply, StoreError, StoreResult, Token, UpdateOutcome,
};
use tempfile::TempDir;

/// Returns each scripted buffer once, then repeats the last one.
pub struct ScriptedRandom {
    script: Mutex<Vec<Vec<u8>>>,
}

impl ScriptedRandom {
    pub fn new(mut script: Vec<Vec<u8>>) -> Self {
        assert!(!script.is_empty(), "script must not be empty");
        script.reverse();
        Self {
            script: Mutex::new(script),
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn next_bytes(&self, len: usize) -> ConfirmResult<Vec<u8>> {
        let mut script = self.script.lock().expect("lock");
        let mut bytes = if script.len() > 1 {
            script.pop().expect("non-empty")
        } else {
            script[0].clone()
        };
        bytes.resize(len, 0);
        Ok(bytes)
    }
}

/// Handler that records every invocation and echoes the outcome.
#[derive(Clone, Default)]
pub struct RecordingHandler {
    calls: Arc<Mutex<Vec<(Outcome, String)>>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(Outcome, String)> {
        self.calls.lock().expect("lock").clone()
    }

    pub fn handle(&self, outcome: Outcome, argument: &str) -> HandlerResult {
        self.calls
            .lock()
            .expect("lock")
            .push((outcome, argument.to_string()));
        Ok(Reply::ok(format!("{outcome}:{argument}")))
    }

    /// Module exporting this handler as `activate`.
    pub fn module(&self) -> HandlerModule {
        let handler = self.clone();
        HandlerModule::new().with("activate", move |outcome: Outcome, argument: &str| {
            handler.handle(outcome, argument)
        })
    }
}

/// Store wrapping [`MemoryStore`] whose writes can be made to fail.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_create: AtomicBool,
    fail_update: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn fail_update(&self, fail: bool) {
        self.fail_update.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.inner.len().expect("len")
    }
}

impl ConfirmationStore for FlakyStore {
    fn find_by_key(&self, key: &ConfirmationKey) -> StoreResult<Option<ConfirmationRecord>> {
        self.inner.find_by_key(key)
    }

    fn create(&self, record: ConfirmationRecord) -> StoreResult<()> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("disk full".to_string()));
        }
        self.inner.create(record)
    }

    fn conditional_update(
        &self,
        key: &ConfirmationKey,
        expected: &Token,
        confirmed_at: u64,
    ) -> StoreResult<UpdateOutcome> {
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("write rejected".to_string()));
        }
        self.inner.conditional_update(key, expected, confirmed_at)
    }
}

/// Registry exporting `user.activate` backed by `handler`.
pub fn user_registry(handler: &RecordingHandler) -> HandlerRegistry {
    HandlerRegistry::new().with_group("user", handler.module())
}

/// Engine over `store` with `user.activate` registered.
pub fn engine_with_store(
    store: Arc<dyn ConfirmationStore>,
    handler: &RecordingHandler,
) -> ConfirmationEngine {
    ConfirmationEngine::new(store, Arc::new(user_registry(handler)), EngineConfig::default())
        .expect("engine")
}

/// Engine over a fresh [`MemoryStore`] with `user.activate` registered.
pub fn memory_engine(handler: &RecordingHandler) -> ConfirmationEngine {
    engine_with_store(Arc::new(MemoryStore::new()), handler)
}

/// Handler that always fails.
pub fn failing_handler(_: Outcome, _: &str) -> HandlerResult {
    Err(HandlerFault::new("downstream unavailable"))
}

pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("create temp dir")
}

/// Installs a test subscriber so engine events show up with `--nocapture`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
