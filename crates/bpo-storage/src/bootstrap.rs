//! Bootstrap: create wholly missing tables directly in their current shape.
//!
//! Existing tables are never altered here. Adding columns or indexes to a
//! table that already exists is the catalog's job.

use std::collections::BTreeSet;

use bpo_core::errors::migration_error::unreachable;
use bpo_core::errors::MigrationError;
use rusqlite::{params, Connection};

use crate::migrations::MigrationCatalog;
use crate::schema::{ColumnDeclaration, TableDeclaration};
use crate::version_store::SchemaVersion;

/// Whether `name` exists as a table.
pub fn table_exists(conn: &Connection, name: &str) -> Result<bool, MigrationError> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![name],
            |row| row.get(0),
        )
        .map_err(unreachable)?;
    Ok(count > 0)
}

/// Names of the declared tables that already exist.
pub fn existing_tables(
    conn: &Connection,
    declarations: &[TableDeclaration],
) -> Result<Vec<String>, MigrationError> {
    let mut existing = Vec::new();
    for table in declarations {
        if table_exists(conn, table.name)? {
            existing.push(table.name.to_string());
        }
    }
    Ok(existing)
}

/// Create every declared table that does not exist yet, with all of its
/// columns and indexes. Returns the names of the tables created.
///
/// Callers own the transaction; on error nothing here is rolled back.
pub fn create_missing_tables(
    conn: &Connection,
    declarations: &[TableDeclaration],
) -> Result<Vec<String>, MigrationError> {
    let mut created = Vec::new();
    for table in declarations {
        if table_exists(conn, table.name)? {
            continue;
        }
        for sql in table.create_statements() {
            conn.execute_batch(&sql).map_err(|e| MigrationError::StorageUnreachable {
                message: format!("creating table {}: {e}", table.name),
            })?;
        }
        tracing::info!(table = table.name, "created table");
        created.push(table.name.to_string());
    }
    Ok(created)
}

/// Cross-check `since` annotations against the catalog.
///
/// Every annotation must name a version the catalog can reach, every step
/// must be claimed by at least one annotation, and annotated columns must
/// be addable with `ADD COLUMN` in the order the steps run.
pub fn check_consistency(
    declarations: &[TableDeclaration],
    catalog: &MigrationCatalog,
) -> Result<(), MigrationError> {
    let latest = catalog.latest();
    let mut claimed = BTreeSet::new();

    let mut check_since = |item: String, since: SchemaVersion| {
        if since == SchemaVersion::ZERO || since > latest {
            return Err(MigrationError::CatalogMismatch {
                item,
                message: format!("annotated {since} but the catalog ends at {latest}"),
            });
        }
        claimed.insert(since);
        Ok(())
    };

    for table in declarations {
        let mut last_since = SchemaVersion::ZERO;
        for column in &table.columns {
            let item = format!("{}.{}", table.name, column.name);
            let Some(since) = column.since else {
                if last_since != SchemaVersion::ZERO {
                    return Err(MigrationError::CatalogMismatch {
                        item,
                        message: "original column declared after an added one".to_string(),
                    });
                }
                continue;
            };
            if since < last_since {
                return Err(MigrationError::CatalogMismatch {
                    item,
                    message: format!("declared after a column added in {last_since}"),
                });
            }
            if let Some(reason) = add_column_blocker(column) {
                return Err(MigrationError::CatalogMismatch {
                    item,
                    message: reason.to_string(),
                });
            }
            last_since = since;
            check_since(item, since)?;
        }
        for index in &table.indexes {
            if let Some(since) = index.since {
                check_since(format!("{}: index {}", table.name, index.name), since)?;
            }
        }
    }

    for step in catalog.steps() {
        if !claimed.contains(&step.to()) {
            return Err(MigrationError::CatalogMismatch {
                item: format!("step {} -> {} ({})", step.from, step.to(), step.name),
                message: "no declared column or index is annotated with this version".to_string(),
            });
        }
    }

    Ok(())
}

/// Why SQLite would refuse `ADD COLUMN` for `column` on a table with rows.
fn add_column_blocker(column: &ColumnDeclaration) -> Option<&'static str> {
    if column.primary_key || column.unique {
        return Some("ADD COLUMN cannot add PRIMARY KEY or UNIQUE columns");
    }
    match column.default {
        None if !column.nullable => {
            Some("ADD COLUMN cannot add a NOT NULL column without a default")
        }
        Some(expr) if !is_constant_default(expr) => {
            Some("ADD COLUMN cannot add a column with a non-constant default")
        }
        _ => None,
    }
}

fn is_constant_default(expr: &str) -> bool {
    let expr = expr.trim();
    !(expr.starts_with('(')
        || ["CURRENT_TIMESTAMP", "CURRENT_DATE", "CURRENT_TIME"]
            .iter()
            .any(|f| expr.eq_ignore_ascii_case(f)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::{self, MigrationStep};
    use crate::schema::{self, ColumnDeclaration, ColumnType, IndexDeclaration};

    #[test]
    fn creates_only_missing_tables() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE log (id INTEGER PRIMARY KEY)")
            .unwrap();

        let created = create_missing_tables(&conn, &schema::declarations()).unwrap();
        assert_eq!(created, vec!["package", "package_dependency"]);

        // The pre-existing log table keeps its old shape.
        let cols: i64 = conn
            .query_row("SELECT COUNT(*) FROM pragma_table_info('log')", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(cols, 1);
    }

    #[test]
    fn created_tables_carry_their_indexes() {
        let conn = Connection::open_in_memory().unwrap();
        create_missing_tables(&conn, &[schema::layout::package()]).unwrap();
        let names: Vec<String> = conn
            .prepare("SELECT name FROM pragma_index_list('package') WHERE origin = 'c' ORDER BY name")
            .unwrap()
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(names, vec!["arch-branch", "job_id", "pkgname-arch-branch", "status"]);
    }

    #[test]
    fn bpo_layout_matches_bpo_catalog() {
        let catalog = migrations::catalog().unwrap();
        check_consistency(&schema::declarations(), &catalog).unwrap();
    }

    #[test]
    fn unclaimed_step_is_a_mismatch() {
        let catalog = MigrationCatalog::new(vec![MigrationStep::new(0, "orphan", &["SELECT 1"])])
            .unwrap();
        let decls = vec![TableDeclaration::new("t")
            .column(ColumnDeclaration::new("a", ColumnType::Integer))];
        let err = check_consistency(&decls, &catalog).unwrap_err();
        assert!(matches!(err, MigrationError::CatalogMismatch { .. }));
    }

    #[test]
    fn annotation_beyond_catalog_is_a_mismatch() {
        let catalog = MigrationCatalog::new(Vec::new()).unwrap();
        let decls = vec![TableDeclaration::new("t")
            .column(ColumnDeclaration::new("a", ColumnType::Integer))
            .index(IndexDeclaration::new("t_a", &["a"]).since(1))];
        let err = check_consistency(&decls, &catalog).unwrap_err();
        assert!(err.to_string().contains("t: index t_a"));
    }

    #[test]
    fn original_column_after_added_column_is_a_mismatch() {
        let catalog = MigrationCatalog::new(vec![MigrationStep::new(0, "b", &["SELECT 1"])])
            .unwrap();
        let decls = vec![TableDeclaration::new("t")
            .column(ColumnDeclaration::new("b", ColumnType::Text).since(1))
            .column(ColumnDeclaration::new("a", ColumnType::Integer))];
        let err = check_consistency(&decls, &catalog).unwrap_err();
        assert!(err.to_string().contains("t.a"));
    }

    #[test]
    fn unique_added_column_is_a_mismatch() {
        let catalog = MigrationCatalog::new(vec![MigrationStep::new(0, "b", &["SELECT 1"])])
            .unwrap();
        let decls = vec![TableDeclaration::new("t")
            .column(ColumnDeclaration::new("a", ColumnType::Integer))
            .column(ColumnDeclaration::new("b", ColumnType::Text).unique().since(1))];
        assert!(check_consistency(&decls, &catalog).is_err());
    }

    fn one_step() -> MigrationCatalog {
        MigrationCatalog::new(vec![MigrationStep::new(0, "b", &["SELECT 1"])]).unwrap()
    }

    fn with_added(column: ColumnDeclaration) -> Vec<TableDeclaration> {
        vec![TableDeclaration::new("t")
            .column(ColumnDeclaration::new("a", ColumnType::Integer))
            .column(column)]
    }

    #[test]
    fn not_null_added_column_needs_a_default() {
        let err = check_consistency(
            &with_added(ColumnDeclaration::new("b", ColumnType::Text).not_null().since(1)),
            &one_step(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("NOT NULL"), "{err}");

        check_consistency(
            &with_added(
                ColumnDeclaration::new("b", ColumnType::Text)
                    .not_null()
                    .default("''")
                    .since(1),
            ),
            &one_step(),
        )
        .unwrap();
    }

    #[test]
    fn non_constant_default_on_added_column_is_a_mismatch() {
        for expr in ["CURRENT_TIMESTAMP", "current_date", "CURRENT_TIME", "(datetime('now'))"] {
            let decls =
                with_added(ColumnDeclaration::new("d", ColumnType::DateTime).default(expr).since(1));
            let err = check_consistency(&decls, &one_step()).unwrap_err();
            assert!(err.to_string().contains("non-constant"), "{expr}: {err}");
        }
        check_consistency(
            &with_added(ColumnDeclaration::new("d", ColumnType::Integer).default("0").since(1)),
            &one_step(),
        )
        .unwrap();
    }

    #[test]
    fn original_columns_may_use_any_default() {
        // Bootstrap creates these with CREATE TABLE, which has no such limits.
        let decls = vec![TableDeclaration::new("t")
            .column(ColumnDeclaration::new("a", ColumnType::Integer).not_null())
            .column(ColumnDeclaration::new("d", ColumnType::DateTime).default("CURRENT_TIMESTAMP"))];
        check_consistency(&decls, &MigrationCatalog::new(Vec::new()).unwrap()).unwrap();
    }
}
