//! Storage-layer errors for SQLite operations.

use std::path::PathBuf;

use super::error_code::{self, BpoErrorCode};
use super::MigrationError;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("Could not acquire migration lock {path}: {message}")]
    LockUnavailable { path: PathBuf, message: String },

    #[error(transparent)]
    Migration(#[from] MigrationError),
}

impl BpoErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::SqliteError { .. } => error_code::STORAGE_ERROR,
            Self::LockUnavailable { .. } => error_code::DB_LOCKED,
            Self::Migration(e) => e.error_code(),
        }
    }
}
