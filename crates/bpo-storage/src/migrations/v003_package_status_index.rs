//! V003: index package rows by build status for the scheduler queries.

pub const MIGRATION_SQL: &[&str] = &[r#"CREATE INDEX "status" ON "package" ("status")"#];
