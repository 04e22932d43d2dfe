//! Advisory lock serializing migration runs across processes.
//!
//! Replicas starting against the same database file take turns: the first
//! migrates, the rest find the schema current once they get the lock.

use std::ffi::OsString;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use bpo_core::errors::StorageError;

/// `<db>.migrate.lock` next to the database file.
pub fn lock_path(db_path: &Path) -> PathBuf {
    let mut name = OsString::from(db_path.as_os_str());
    name.push(".migrate.lock");
    PathBuf::from(name)
}

/// Run `f` while holding an exclusive lock on the database's lock file.
/// Blocks until the lock is available.
pub fn with_migration_lock<T>(
    db_path: &Path,
    f: impl FnOnce() -> Result<T, StorageError>,
) -> Result<T, StorageError> {
    let path = lock_path(db_path);
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&path)
        .map_err(|e| StorageError::LockUnavailable {
            path: path.clone(),
            message: e.to_string(),
        })?;

    let mut lock = fd_lock::RwLock::new(file);
    let _guard = lock.write().map_err(|e| StorageError::LockUnavailable {
        path: path.clone(),
        message: e.to_string(),
    })?;
    tracing::debug!(path = %path.display(), "migration lock acquired");

    f()
}
