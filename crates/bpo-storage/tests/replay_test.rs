//! Fresh-install equivalence: a database upgraded from any historical
//! version ends up with the same physical schema as one created today.

mod common;

use bpo_storage::introspect::snapshot;
use bpo_storage::{MigrationPath, Migrator, SchemaVersion, SqliteVersionStore};
use rusqlite::Connection;

use common::{build_at_version, fresh_snapshot, row_count, stored_version};

#[test]
fn upgrade_from_every_version_matches_fresh_install() {
    let migrator = Migrator::bpo().unwrap();
    let fresh = fresh_snapshot(&migrator);
    let latest = migrator.catalog().latest().get();

    for start in 0..=latest {
        let conn = Connection::open_in_memory().unwrap();
        build_at_version(&conn, migrator.declarations(), start);

        let report = migrator.run(&conn, &SqliteVersionStore::new(&conn)).unwrap();

        assert_eq!(report.final_version.get(), latest);
        assert_eq!(report.applied.len() as u32, latest - start, "start at v{start}");
        assert_eq!(snapshot(&conn).unwrap(), fresh, "start at v{start}");
        for table in migrator.declarations() {
            assert_eq!(row_count(&conn, table.name), 1, "{} at v{start}", table.name);
        }
    }
}

#[test]
fn historical_shapes_differ_from_latest() {
    // Guards the replay test above against declarations that ignore `since`.
    let migrator = Migrator::bpo().unwrap();
    let fresh = fresh_snapshot(&migrator);

    let conn = Connection::open_in_memory().unwrap();
    build_at_version(&conn, migrator.declarations(), 0);
    let v0 = snapshot(&conn).unwrap();

    assert_ne!(v0, fresh);
    assert!(v0["log"].column("commit").is_none());
    assert!(!v0["package"].indexes.contains_key("arch-branch"));
    assert!(!v0["package"].indexes.contains_key("status"));
    assert!(v0["package"].indexes.contains_key("job_id"));
}

#[test]
fn bootstrap_is_idempotent() {
    let conn = Connection::open_in_memory().unwrap();
    let migrator = Migrator::bpo().unwrap();
    let store = SqliteVersionStore::new(&conn);

    migrator.run(&conn, &store).unwrap();
    let after_first = snapshot(&conn).unwrap();

    for _ in 0..3 {
        let report = migrator.run(&conn, &store).unwrap();
        assert_eq!(report.path, MigrationPath::AlreadyCurrent);
        assert!(report.tables_created.is_empty());
    }
    assert_eq!(snapshot(&conn).unwrap(), after_first);
    assert_eq!(stored_version(&conn), SchemaVersion::new(3));
}

#[test]
fn foreign_keys_survive_bootstrap() {
    let migrator = Migrator::bpo().unwrap();
    let fresh = fresh_snapshot(&migrator);

    let fks = &fresh["package_dependency"].foreign_keys;
    assert_eq!(fks.len(), 2);
    assert!(fks.iter().all(|fk| fk.table == "package"));
    assert!(fks.iter().any(|fk| fk.from == "package_id"));
    assert!(fks.iter().any(|fk| fk.from == "dependency_id"));
}
