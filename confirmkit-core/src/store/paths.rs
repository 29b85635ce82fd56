//! File store path helpers.

use std::path::{Path, PathBuf};

const STORE_DIRNAME: &str = "confirmkit";
const SNAPSHOT_FILENAME: &str = "confirmations.cbor";
const LOCK_FILENAME: &str = "lock";

/// Paths for file store artifacts under `<root>/confirmkit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    root: PathBuf,
    store_dir: PathBuf,
}

impl StorePaths {
    /// Builds store paths rooted at `root`.
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let store_dir = root.join(STORE_DIRNAME);
        Self { root, store_dir }
    }

    /// Returns the storage root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the directory holding the store files.
    #[must_use]
    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }

    /// Returns the path to the records snapshot.
    #[must_use]
    pub fn snapshot_path(&self) -> PathBuf {
        self.store_dir.join(SNAPSHOT_FILENAME)
    }

    /// Returns the path to the lock file.
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        self.store_dir.join(LOCK_FILENAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_layout() {
        let paths = StorePaths::new("/tmp/data");
        assert_eq!(paths.root(), Path::new("/tmp/data"));
        assert_eq!(paths.store_dir(), Path::new("/tmp/data/confirmkit"));
        assert_eq!(
            paths.snapshot_path(),
            PathBuf::from("/tmp/data/confirmkit/confirmations.cbor")
        );
        assert_eq!(paths.lock_path(), PathBuf::from("/tmp/data/confirmkit/lock"));
    }
}
