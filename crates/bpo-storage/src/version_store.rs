//! Persisted schema version.
//!
//! The version lives in a one-row `version` table inside the database it
//! describes. A missing table means the database has never been migrated.

use std::fmt;

use bpo_core::errors::migration_error::unreachable;
use bpo_core::errors::MigrationError;
use rusqlite::{params, Connection};

/// Number of catalog steps applied to a database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SchemaVersion(u32);

impl SchemaVersion {
    pub const ZERO: SchemaVersion = SchemaVersion(0);

    pub const fn new(version: u32) -> Self {
        Self(version)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    /// The version a step starting at `self` transitions to.
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl From<u32> for SchemaVersion {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Where the Migrator reads and writes the schema version.
///
/// Every method is fatal on failure; there is no degraded mode for schema
/// state. `set` must be durable once the surrounding transaction commits.
pub trait VersionStore {
    /// Whether the backing object exists at all.
    fn exists(&self) -> Result<bool, MigrationError>;

    /// Create the backing object holding `initial`.
    fn create(&self, initial: SchemaVersion) -> Result<(), MigrationError>;

    fn get(&self) -> Result<SchemaVersion, MigrationError>;

    fn set(&self, version: SchemaVersion) -> Result<(), MigrationError>;
}

pub const VERSION_TABLE: &str = "version";

/// `VersionStore` over a borrowed SQLite connection.
pub struct SqliteVersionStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteVersionStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl VersionStore for SqliteVersionStore<'_> {
    fn exists(&self) -> Result<bool, MigrationError> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![VERSION_TABLE],
                |row| row.get(0),
            )
            .map_err(unreachable)?;
        Ok(count > 0)
    }

    fn create(&self, initial: SchemaVersion) -> Result<(), MigrationError> {
        self.conn
            .execute_batch(
                "CREATE TABLE version (
                    id INTEGER PRIMARY KEY CHECK (id = 0),
                    version INTEGER NOT NULL CHECK (version >= 0)
                );",
            )
            .map_err(unreachable)?;
        self.conn
            .execute(
                "INSERT INTO version (id, version) VALUES (0, ?1)",
                params![initial.get()],
            )
            .map_err(unreachable)?;
        Ok(())
    }

    fn get(&self) -> Result<SchemaVersion, MigrationError> {
        let mut stmt = self
            .conn
            .prepare("SELECT version FROM version")
            .map_err(unreachable)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, i64>(0))
            .map_err(unreachable)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(unreachable)?;

        match rows.as_slice() {
            [raw] => u32::try_from(*raw).map(SchemaVersion).map_err(|_| {
                MigrationError::VersionStoreCorrupt {
                    message: format!("stored version {raw} is out of range"),
                }
            }),
            _ => Err(MigrationError::VersionStoreCorrupt {
                message: format!("expected exactly one version row, found {}", rows.len()),
            }),
        }
    }

    fn set(&self, version: SchemaVersion) -> Result<(), MigrationError> {
        let updated = self
            .conn
            .execute(
                "UPDATE version SET version = ?1 WHERE id = 0",
                params![version.get()],
            )
            .map_err(unreachable)?;
        if updated != 1 {
            return Err(MigrationError::VersionStoreCorrupt {
                message: format!("version row missing while setting {version}"),
            });
        }
        Ok(())
    }
}
