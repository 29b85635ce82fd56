//! File lock serializing store mutations across processes.

use std::fs::{self, File, OpenOptions, TryLockError};
use std::path::Path;
use std::sync::Arc;

use crate::error::{StoreError, StoreResult};

/// A file-backed exclusive lock.
#[derive(Debug, Clone)]
pub struct StoreLock {
    file: Arc<File>,
}

/// Guard that holds the exclusive lock for its lifetime.
#[derive(Debug)]
pub struct StoreLockGuard {
    file: Arc<File>,
}

impl StoreLock {
    /// Opens or creates the lock file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(StoreError::lock)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(StoreError::lock)?;
        Ok(Self {
            file: Arc::new(file),
        })
    }

    /// Acquires the exclusive lock, blocking until it is available.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock cannot be acquired.
    pub fn lock(&self) -> StoreResult<StoreLockGuard> {
        self.file.lock().map_err(StoreError::lock)?;
        Ok(StoreLockGuard {
            file: Arc::clone(&self.file),
        })
    }

    /// Attempts to acquire the exclusive lock without blocking.
    ///
    /// # Errors
    ///
    /// Returns an error if the attempt fails for reasons other than the lock
    /// being held elsewhere.
    pub fn try_lock(&self) -> StoreResult<Option<StoreLockGuard>> {
        match self.file.try_lock() {
            Ok(()) => Ok(Some(StoreLockGuard {
                file: Arc::clone(&self.file),
            })),
            Err(TryLockError::WouldBlock) => Ok(None),
            Err(TryLockError::Error(err)) => Err(StoreError::lock(err)),
        }
    }
}

impl Drop for StoreLockGuard {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
