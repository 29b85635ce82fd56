//! Record store persisted as a single CBOR snapshot on disk.
//!
//! Every operation runs under an in-process mutex plus the exclusive file
//! lock, reads the whole snapshot, and rewrites it atomically (temp file,
//! then rename) when it changed.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::record::{ConfirmationKey, ConfirmationRecord, Token};

use super::{apply_confirmation, ConfirmationStore, StoreLock, StorePaths, UpdateOutcome};

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    records: Vec<ConfirmationRecord>,
}

impl Snapshot {
    const fn empty() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            records: Vec::new(),
        }
    }

    fn serialize(&self) -> StoreResult<Vec<u8>> {
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(self, &mut bytes)
            .map_err(|err| StoreError::Serialization(err.to_string()))?;
        Ok(bytes)
    }

    fn deserialize(bytes: &[u8]) -> StoreResult<Self> {
        let snapshot: Self = ciborium::de::from_reader(bytes)
            .map_err(|err| StoreError::Serialization(err.to_string()))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StoreError::UnsupportedVersion(snapshot.version));
        }
        Ok(snapshot)
    }

    fn position(&self, key: &ConfirmationKey) -> Option<usize> {
        self.records.iter().position(|record| &record.key == key)
    }
}

/// File-backed store for single-host deployments and the CLI.
#[derive(Debug)]
pub struct FileStore {
    paths: StorePaths,
    lock: StoreLock,
    guard: Mutex<()>,
}

impl FileStore {
    /// Opens the store under `paths`, creating its directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or lock file cannot be created.
    pub fn open(paths: StorePaths) -> StoreResult<Self> {
        fs::create_dir_all(paths.store_dir()).map_err(StoreError::backend)?;
        let lock = StoreLock::open(&paths.lock_path())?;
        Ok(Self {
            paths,
            lock,
            guard: Mutex::new(()),
        })
    }

    /// Returns the paths used by this store.
    #[must_use]
    pub const fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// Returns every stored record.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be read or decoded.
    pub fn records(&self) -> StoreResult<Vec<ConfirmationRecord>> {
        self.with_snapshot(|snapshot| Ok((snapshot.records.clone(), false)))
    }

    /// Runs `f` against the current snapshot while holding both locks and
    /// persists the snapshot if `f` reports a change.
    fn with_snapshot<R>(
        &self,
        f: impl FnOnce(&mut Snapshot) -> StoreResult<(R, bool)>,
    ) -> StoreResult<R> {
        let _local = self.guard.lock().map_err(StoreError::lock)?;
        let _file = self.lock.lock()?;

        let mut snapshot = self.load()?;
        let (result, changed) = f(&mut snapshot)?;
        if changed {
            self.save(&snapshot)?;
        }
        Ok(result)
    }

    fn load(&self) -> StoreResult<Snapshot> {
        let path = self.paths.snapshot_path();
        match fs::read(&path) {
            Ok(bytes) => Snapshot::deserialize(&bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Snapshot::empty()),
            Err(err) => Err(StoreError::backend(err)),
        }
    }

    fn save(&self, snapshot: &Snapshot) -> StoreResult<()> {
        let bytes = snapshot.serialize()?;
        let path = self.paths.snapshot_path();
        let tmp_path = path.with_extension("cbor.tmp");
        write_synced(&tmp_path, &bytes)?;
        fs::rename(&tmp_path, &path).map_err(StoreError::backend)
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let mut file = File::create(path).map_err(StoreError::backend)?;
    file.write_all(bytes).map_err(StoreError::backend)?;
    file.sync_all().map_err(StoreError::backend)
}

impl ConfirmationStore for FileStore {
    fn find_by_key(&self, key: &ConfirmationKey) -> StoreResult<Option<ConfirmationRecord>> {
        self.with_snapshot(|snapshot| {
            let found = snapshot
                .position(key)
                .map(|index| snapshot.records[index].clone());
            Ok((found, false))
        })
    }

    fn create(&self, record: ConfirmationRecord) -> StoreResult<()> {
        self.with_snapshot(|snapshot| {
            if snapshot.position(&record.key).is_some() {
                return Err(StoreError::DuplicateKey(record.key.to_string()));
            }
            snapshot.records.push(record);
            Ok(((), true))
        })
    }

    fn conditional_update(
        &self,
        key: &ConfirmationKey,
        expected: &Token,
        confirmed_at: u64,
    ) -> StoreResult<UpdateOutcome> {
        self.with_snapshot(|snapshot| {
            let outcome = snapshot
                .position(key)
                .map_or(UpdateOutcome::Conflict, |index| {
                    apply_confirmation(&mut snapshot.records[index], expected, confirmed_at)
                });
            Ok((outcome, outcome == UpdateOutcome::Applied))
        })
    }
}
