//! BpoErrorCode trait: stable machine-readable codes for every error.

/// Every error enum implements this so that operators and supervisors can
/// match on a fixed code instead of parsing messages.
pub trait BpoErrorCode {
    /// Returns the code string (e.g., "MIGRATION_FAILED").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted string: `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const DB_LOCKED: &str = "DB_LOCKED";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const MIGRATION_FAILED: &str = "MIGRATION_FAILED";
pub const CATALOG_INVALID: &str = "CATALOG_INVALID";
pub const VERSION_AHEAD: &str = "VERSION_AHEAD";
pub const SCHEMA_UNTRACKED: &str = "SCHEMA_UNTRACKED";
