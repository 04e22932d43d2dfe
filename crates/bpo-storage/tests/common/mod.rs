//! Shared fixtures: databases frozen at a historical schema version.

#![allow(dead_code)]

use std::cell::RefCell;

use bpo_core::errors::MigrationError;
use bpo_storage::introspect::{snapshot, SchemaSnapshot};
use bpo_storage::schema::quote;
use bpo_storage::{
    ColumnType, Migrator, SchemaVersion, SqliteVersionStore, TableDeclaration, VersionStore,
};
use rusqlite::Connection;

/// Create every table as it looked at `version`, put one row in each and
/// record that version, the way a database deployed back then would look
/// today. SQLite only rejects some `ADD COLUMN` forms on tables with rows.
pub fn build_at_version(conn: &Connection, declarations: &[TableDeclaration], version: u32) {
    let version = SchemaVersion::new(version);
    for table in declarations {
        let historical = table.at_version(version);
        for sql in historical.create_statements() {
            conn.execute_batch(&sql).unwrap();
        }
        seed_row(conn, &historical);
    }
    SqliteVersionStore::new(conn).create(version).unwrap();
}

/// Insert one row, filling only the columns that demand a value. Integer
/// columns get 1, so references to the first row of an earlier table hold.
pub fn seed_row(conn: &Connection, table: &TableDeclaration) {
    let required: Vec<_> = table
        .columns
        .iter()
        .filter(|c| !c.nullable && c.default.is_none())
        .collect();
    let sql = if required.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES", quote(table.name))
    } else {
        let names = required.iter().map(|c| quote(c.name)).collect::<Vec<_>>();
        let values = required
            .iter()
            .map(|c| match c.column_type {
                ColumnType::Integer => "1",
                _ => "'1'",
            })
            .collect::<Vec<_>>();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote(table.name),
            names.join(", "),
            values.join(", ")
        )
    };
    conn.execute_batch(&sql).unwrap();
}

pub fn row_count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", quote(table)), [], |r| {
        r.get(0)
    })
    .unwrap()
}

/// Schema of a fresh database bootstrapped by `migrator`.
pub fn fresh_snapshot(migrator: &Migrator) -> SchemaSnapshot {
    let conn = Connection::open_in_memory().unwrap();
    migrator.run(&conn, &SqliteVersionStore::new(&conn)).unwrap();
    snapshot(&conn).unwrap()
}

pub fn stored_version(conn: &Connection) -> SchemaVersion {
    SqliteVersionStore::new(conn).get().unwrap()
}

pub fn user_tables(conn: &Connection) -> Vec<String> {
    snapshot(conn).unwrap().into_keys().collect()
}

/// Wraps a SQLite store and records every `set`.
pub struct RecordingStore<'c> {
    inner: SqliteVersionStore<'c>,
    pub sets: RefCell<Vec<SchemaVersion>>,
}

impl<'c> RecordingStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self {
            inner: SqliteVersionStore::new(conn),
            sets: RefCell::new(Vec::new()),
        }
    }
}

impl VersionStore for RecordingStore<'_> {
    fn exists(&self) -> Result<bool, MigrationError> {
        self.inner.exists()
    }

    fn create(&self, initial: SchemaVersion) -> Result<(), MigrationError> {
        self.inner.create(initial)
    }

    fn get(&self) -> Result<SchemaVersion, MigrationError> {
        self.inner.get()
    }

    fn set(&self, version: SchemaVersion) -> Result<(), MigrationError> {
        self.inner.set(version)?;
        self.sets.borrow_mut().push(version);
        Ok(())
    }
}
