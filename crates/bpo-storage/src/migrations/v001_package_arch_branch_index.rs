//! V001: index package rows by arch and branch.

pub const MIGRATION_SQL: &[&str] = &[r#"CREATE INDEX "arch-branch" ON "package" ("arch", "branch")"#];
