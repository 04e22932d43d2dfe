//! Storage configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for the database and its migration run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file. Default: `bpo.db`.
    pub db_path: Option<PathBuf>,
    /// SQLite busy timeout in milliseconds. Default: 5000.
    pub busy_timeout_ms: Option<u64>,
    /// Use WAL journaling for file-backed databases. Default: true.
    pub wal: Option<bool>,
    /// Hold an advisory file lock for the whole migration run. Default: true.
    pub lock_migrations: Option<bool>,
}

impl StorageConfig {
    /// Returns the effective database path, defaulting to `bpo.db`.
    pub fn effective_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("bpo.db"))
    }

    /// Returns the effective busy timeout, defaulting to 5000ms.
    pub fn effective_busy_timeout_ms(&self) -> u64 {
        self.busy_timeout_ms.unwrap_or(5000)
    }

    pub fn effective_wal(&self) -> bool {
        self.wal.unwrap_or(true)
    }

    pub fn effective_lock_migrations(&self) -> bool {
        self.lock_migrations.unwrap_or(true)
    }
}
