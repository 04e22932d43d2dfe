//! Migrator: bring a database to the latest schema version.
//!
//! `Bootstrapping -> Upgrading -> Current`. A database without a version
//! store is fresh: its tables are created in their latest shape and the
//! store starts at the latest version, so no catalog step runs. A database
//! with a store is advanced one step at a time, each step committed together
//! with its new version.

use std::fmt;

use bpo_core::errors::migration_error::unreachable;
use bpo_core::errors::MigrationError;
use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::bootstrap::{check_consistency, create_missing_tables, existing_tables};
use crate::migrations::{self, MigrationCatalog, MigrationStep};
use crate::schema::{self, TableDeclaration};
use crate::version_store::{SchemaVersion, VersionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigratorState {
    Bootstrapping,
    Upgrading,
    Current,
}

impl fmt::Display for MigratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bootstrapping => "bootstrapping",
            Self::Upgrading => "upgrading",
            Self::Current => "current",
        })
    }
}

/// How the database reached the latest version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationPath {
    /// Fresh database, created directly at the latest shape.
    Bootstrapped,
    /// At least one catalog step ran.
    Upgraded,
    /// The stored version was already the latest.
    AlreadyCurrent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedStep {
    pub from: SchemaVersion,
    pub to: SchemaVersion,
    pub name: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Version found on entry; `None` for a fresh database.
    pub initial: Option<SchemaVersion>,
    pub final_version: SchemaVersion,
    pub path: MigrationPath,
    pub tables_created: Vec<String>,
    pub applied: Vec<AppliedStep>,
    pub statements_executed: usize,
    pub state: MigratorState,
}

/// Declarations plus the catalog that keeps existing databases in step with
/// them. Construction fails if the two disagree.
#[derive(Debug, Clone)]
pub struct Migrator {
    declarations: Vec<TableDeclaration>,
    catalog: MigrationCatalog,
}

impl Migrator {
    pub fn new(
        declarations: Vec<TableDeclaration>,
        catalog: MigrationCatalog,
    ) -> Result<Self, MigrationError> {
        check_consistency(&declarations, &catalog)?;
        Ok(Self {
            declarations,
            catalog,
        })
    }

    /// The bpo layout with the bpo catalog.
    pub fn bpo() -> Result<Self, MigrationError> {
        Self::new(schema::declarations(), migrations::catalog()?)
    }

    pub fn catalog(&self) -> &MigrationCatalog {
        &self.catalog
    }

    pub fn declarations(&self) -> &[TableDeclaration] {
        &self.declarations
    }

    /// Run to the latest version.
    ///
    /// `store` must operate on `conn`: each step and its version update
    /// share one transaction. Any error is fatal and leaves the stored
    /// version at the last fully applied step.
    pub fn run(
        &self,
        conn: &Connection,
        store: &dyn VersionStore,
    ) -> Result<MigrationReport, MigrationError> {
        let latest = self.catalog.latest();
        tracing::debug!(state = %MigratorState::Bootstrapping, %latest, "migration started");

        let initial = if store.exists()? {
            let stored = store.get()?;
            if stored > latest {
                tracing::error!(%stored, %latest, "database is newer than this code");
                return Err(MigrationError::VersionAheadOfCatalog {
                    stored: stored.get(),
                    latest: latest.get(),
                });
            }
            Some(stored)
        } else {
            let existing = existing_tables(conn, &self.declarations)?;
            if !existing.is_empty() {
                tracing::error!(tables = ?existing, "tables exist without a schema version");
                return Err(MigrationError::UntrackedSchema { tables: existing });
            }
            None
        };

        let tables_created = {
            let tx = begin(conn)?;
            let created = create_missing_tables(conn, &self.declarations)?;
            if initial.is_none() {
                store.create(latest)?;
            }
            tx.commit().map_err(unreachable)?;
            created
        };

        let Some(mut current) = initial else {
            tracing::info!(version = %latest, tables = tables_created.len(), "bootstrapped fresh database");
            return Ok(MigrationReport {
                initial,
                final_version: latest,
                path: MigrationPath::Bootstrapped,
                tables_created,
                applied: Vec::new(),
                statements_executed: 0,
                state: MigratorState::Current,
            });
        };

        tracing::debug!(state = %MigratorState::Upgrading, from = %current, "upgrading");
        let mut applied = Vec::new();
        let mut statements_executed = 0;
        while let Some(step) = self.catalog.step_after(current) {
            statements_executed += apply_step(conn, store, step)?;
            applied.push(AppliedStep {
                from: step.from,
                to: step.to(),
                name: step.name,
            });
            current = step.to();
        }

        let path = if applied.is_empty() {
            MigrationPath::AlreadyCurrent
        } else {
            MigrationPath::Upgraded
        };
        tracing::info!(version = %current, steps = applied.len(), "schema is current");

        Ok(MigrationReport {
            initial,
            final_version: current,
            path,
            tables_created,
            applied,
            statements_executed,
            state: MigratorState::Current,
        })
    }
}

fn begin(conn: &Connection) -> Result<Transaction<'_>, MigrationError> {
    Transaction::new_unchecked(conn, TransactionBehavior::Immediate).map_err(unreachable)
}

/// Execute one step and advance the version, atomically. Returns the number
/// of statements executed.
fn apply_step(
    conn: &Connection,
    store: &dyn VersionStore,
    step: &MigrationStep,
) -> Result<usize, MigrationError> {
    let tx = begin(conn)?;
    for sql in step.statements {
        if let Err(e) = conn.execute_batch(sql) {
            tracing::error!(from = %step.from, to = %step.to(), name = step.name, error = %e, "migration step failed");
            return Err(MigrationError::StepExecutionFailed {
                from: step.from.get(),
                to: step.to().get(),
                statement: (*sql).to_string(),
                message: e.to_string(),
            });
        }
    }
    store.set(step.to())?;
    tx.commit().map_err(unreachable)?;

    tracing::info!(from = %step.from, to = %step.to(), name = step.name, "applied migration");
    Ok(step.statements.len())
}
