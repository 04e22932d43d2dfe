//! V002: record the bpo git commit each log entry was written by.
//!
//! `ADD COLUMN` has no `IF NOT EXISTS` form; a duplicate column fails the step.

pub const MIGRATION_SQL: &[&str] = &[r#"ALTER TABLE "log" ADD COLUMN "commit" TEXT"#];
