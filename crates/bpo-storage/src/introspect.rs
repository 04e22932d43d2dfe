//! Read the physical schema back out of SQLite.
//!
//! Two databases with equal snapshots have the same tables, columns (in
//! order, with type, nullability, default and key flags), indexes and
//! foreign keys. The raw `CREATE` text in `sqlite_master` is ignored since
//! `ALTER TABLE` rewrites it differently from a fresh `CREATE TABLE`.

use std::collections::BTreeMap;

use bpo_core::errors::StorageError;
use rusqlite::{params, Connection};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub decl_type: String,
    pub not_null: bool,
    pub default: Option<String>,
    /// 1-based position in the primary key, 0 if not part of it.
    pub pk: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexInfo {
    pub unique: bool,
    /// `c` for CREATE INDEX, `u` for UNIQUE, `pk` for PRIMARY KEY.
    pub origin: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyInfo {
    pub from: String,
    pub table: String,
    pub to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableSnapshot {
    pub columns: Vec<ColumnInfo>,
    pub indexes: BTreeMap<String, IndexInfo>,
    pub foreign_keys: Vec<ForeignKeyInfo>,
}

impl TableSnapshot {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Every user table, keyed by name.
pub type SchemaSnapshot = BTreeMap<String, TableSnapshot>;

fn sqlite_err(e: rusqlite::Error) -> StorageError {
    StorageError::SqliteError {
        message: e.to_string(),
    }
}

/// Snapshot every table except SQLite's own `sqlite_*` tables.
pub fn snapshot(conn: &Connection) -> Result<SchemaSnapshot, StorageError> {
    let tables: Vec<String> = conn
        .prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
             ORDER BY name",
        )
        .map_err(sqlite_err)?
        .query_map([], |row| row.get(0))
        .map_err(sqlite_err)?
        .collect::<Result<_, _>>()
        .map_err(sqlite_err)?;

    let mut out = SchemaSnapshot::new();
    for table in tables {
        let snap = table_snapshot(conn, &table)?;
        out.insert(table, snap);
    }
    Ok(out)
}

pub fn table_snapshot(conn: &Connection, table: &str) -> Result<TableSnapshot, StorageError> {
    let columns = conn
        .prepare(
            "SELECT name, type, \"notnull\", dflt_value, pk
             FROM pragma_table_info(?1) ORDER BY cid",
        )
        .map_err(sqlite_err)?
        .query_map(params![table], |row| {
            Ok(ColumnInfo {
                name: row.get(0)?,
                decl_type: row.get(1)?,
                not_null: row.get(2)?,
                default: row.get(3)?,
                pk: row.get(4)?,
            })
        })
        .map_err(sqlite_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(sqlite_err)?;

    let index_rows = conn
        .prepare("SELECT name, \"unique\", origin FROM pragma_index_list(?1)")
        .map_err(sqlite_err)?
        .query_map(params![table], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, bool>(1)?,
                row.get::<_, String>(2)?,
            ))
        })
        .map_err(sqlite_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(sqlite_err)?;

    let mut indexes = BTreeMap::new();
    for (name, unique, origin) in index_rows {
        let columns = conn
            .prepare("SELECT name FROM pragma_index_info(?1) ORDER BY seqno")
            .map_err(sqlite_err)?
            .query_map(params![name], |row| row.get::<_, String>(0))
            .map_err(sqlite_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(sqlite_err)?;
        indexes.insert(
            name,
            IndexInfo {
                unique,
                origin,
                columns,
            },
        );
    }

    let foreign_keys = conn
        .prepare("SELECT \"from\", \"table\", \"to\" FROM pragma_foreign_key_list(?1) ORDER BY id, seq")
        .map_err(sqlite_err)?
        .query_map(params![table], |row| {
            Ok(ForeignKeyInfo {
                from: row.get(0)?,
                table: row.get(1)?,
                to: row.get(2)?,
            })
        })
        .map_err(sqlite_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(sqlite_err)?;

    Ok(TableSnapshot {
        columns,
        indexes,
        foreign_keys,
    })
}
