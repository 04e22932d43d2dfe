//! bpo-storage: SQLite persistence layer.
//!
//! A database is brought to the schema the running code expects before any
//! connection is handed out:
//! - `schema`: current-shape table declarations
//! - `bootstrap`: create wholly missing tables in their current shape
//! - `version_store`: the persisted schema version
//! - `migrations`: the gapless catalog of incremental steps
//! - `migrator`: the driver tying them together
//! - `connection`: `DatabaseManager`, the startup gate

pub mod bootstrap;
pub mod connection;
pub mod introspect;
pub mod migrations;
pub mod migrator;
pub mod schema;
pub mod version_store;

pub use connection::DatabaseManager;
pub use migrations::{MigrationCatalog, MigrationStep};
pub use migrator::{MigrationPath, MigrationReport, Migrator, MigratorState};
pub use schema::{ColumnDeclaration, ColumnType, IndexDeclaration, TableDeclaration};
pub use version_store::{SchemaVersion, SqliteVersionStore, VersionStore};
