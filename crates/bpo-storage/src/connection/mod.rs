//! Connection management and the startup gate.
//!
//! `DatabaseManager::open` returns only once the schema is current, so a
//! connection can never be used against an outdated schema.

pub mod lock;
pub mod pragmas;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use bpo_core::config::StorageConfig;
use bpo_core::errors::StorageError;
use rusqlite::Connection;

use self::lock::with_migration_lock;
use self::pragmas::{apply_pragmas, verify_wal_mode};
use crate::migrator::{MigrationReport, Migrator};
use crate::version_store::SqliteVersionStore;

/// Owns the single write connection of a migrated database.
pub struct DatabaseManager {
    writer: Mutex<Connection>,
    path: Option<PathBuf>,
    report: MigrationReport,
}

impl DatabaseManager {
    /// Open the database named by `config` with the bpo schema.
    pub fn open_configured(config: &StorageConfig) -> Result<Self, StorageError> {
        Self::open(&config.effective_db_path(), config)
    }

    /// Open a database file, apply pragmas, migrate with the bpo schema.
    pub fn open(path: &Path, config: &StorageConfig) -> Result<Self, StorageError> {
        Self::open_with(path, config, &Migrator::bpo()?)
    }

    /// Open a database file and migrate it with `migrator`.
    pub fn open_with(
        path: &Path,
        config: &StorageConfig,
        migrator: &Migrator,
    ) -> Result<Self, StorageError> {
        let writer = Connection::open(path).map_err(|e| StorageError::SqliteError {
            message: format!("open {}: {e}", path.display()),
        })?;
        let startup = || {
            apply_pragmas(&writer, config, true)?;
            if config.effective_wal() && !verify_wal_mode(&writer)? {
                tracing::warn!(path = %path.display(), "WAL requested but not active");
            }
            migrate(&writer, migrator)
        };
        let report = if config.effective_lock_migrations() {
            with_migration_lock(path, startup)?
        } else {
            startup()?
        };

        Ok(Self {
            writer: Mutex::new(writer),
            path: Some(path.to_path_buf()),
            report,
        })
    }

    /// Open an in-memory database with the bpo schema (for testing).
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let writer = Connection::open_in_memory().map_err(|e| StorageError::SqliteError {
            message: e.to_string(),
        })?;
        apply_pragmas(&writer, &StorageConfig::default(), false)?;
        let report = migrate(&writer, &Migrator::bpo()?)?;

        Ok(Self {
            writer: Mutex::new(writer),
            path: None,
            report,
        })
    }

    /// Execute an operation on the write connection.
    pub fn with_writer<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError>,
    {
        let guard = self.writer.lock().map_err(|_| StorageError::SqliteError {
            message: "write lock poisoned".to_string(),
        })?;
        f(&guard)
    }

    /// What the startup migration did.
    pub fn migration_report(&self) -> &MigrationReport {
        &self.report
    }

    /// Get the database file path (None for in-memory).
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn migrate(conn: &Connection, migrator: &Migrator) -> Result<MigrationReport, StorageError> {
    let store = SqliteVersionStore::new(conn);
    Ok(migrator.run(conn, &store)?)
}
