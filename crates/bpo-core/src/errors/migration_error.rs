//! Schema migration errors.
//!
//! Every variant is fatal: the process must not serve traffic against a
//! database whose schema state could not be brought to the current version.

use super::error_code::{self, BpoErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Storage unreachable: {message}")]
    StorageUnreachable { message: String },

    #[error("Version store corrupt: {message}")]
    VersionStoreCorrupt { message: String },

    #[error("Migration catalog has a gap: expected a step from version {expected}, found {found}")]
    CatalogGap { expected: u32, found: u32 },

    #[error("Migration catalog has more than one step from version {from}")]
    DuplicateStep { from: u32 },

    #[error("Migration step from version {from} has no statements")]
    EmptyStep { from: u32 },

    #[error("Schema declarations disagree with the migration catalog at {item}: {message}")]
    CatalogMismatch { item: String, message: String },

    #[error("Stored schema version {stored} is newer than the latest known version {latest}")]
    VersionAheadOfCatalog { stored: u32, latest: u32 },

    #[error("Database has tables but no schema version: {}", .tables.join(", "))]
    UntrackedSchema { tables: Vec<String> },

    #[error("Migration {from} -> {to} failed on `{statement}`: {message}")]
    StepExecutionFailed {
        from: u32,
        to: u32,
        statement: String,
        message: String,
    },
}

impl BpoErrorCode for MigrationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::StorageUnreachable { .. } | Self::VersionStoreCorrupt { .. } => {
                error_code::STORAGE_ERROR
            }
            Self::CatalogGap { .. }
            | Self::DuplicateStep { .. }
            | Self::EmptyStep { .. }
            | Self::CatalogMismatch { .. } => error_code::CATALOG_INVALID,
            Self::VersionAheadOfCatalog { .. } => error_code::VERSION_AHEAD,
            Self::UntrackedSchema { .. } => error_code::SCHEMA_UNTRACKED,
            Self::StepExecutionFailed { .. } => error_code::MIGRATION_FAILED,
        }
    }
}

/// Map a SQLite-level failure outside of a migration step.
pub fn unreachable(e: impl std::fmt::Display) -> MigrationError {
    MigrationError::StorageUnreachable {
        message: e.to_string(),
    }
}
