//! PRAGMA configuration applied to the write connection.

use std::time::Duration;

use bpo_core::config::StorageConfig;
use bpo_core::errors::StorageError;
use rusqlite::Connection;

/// Apply journaling, foreign key and busy-timeout settings.
///
/// WAL is only requested for file-backed databases; in-memory databases
/// always report `memory`.
pub fn apply_pragmas(
    conn: &Connection,
    config: &StorageConfig,
    file_backed: bool,
) -> Result<(), StorageError> {
    conn.busy_timeout(Duration::from_millis(config.effective_busy_timeout_ms()))
        .map_err(|e| StorageError::SqliteError {
            message: format!("failed to set busy_timeout: {e}"),
        })?;

    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA synchronous = NORMAL;
        ",
    )
    .map_err(|e| StorageError::SqliteError {
        message: format!("failed to apply pragmas: {e}"),
    })?;

    if file_backed && config.effective_wal() {
        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .map_err(|e| StorageError::SqliteError {
                message: format!("failed to enable WAL: {e}"),
            })?;
    }

    Ok(())
}

/// Verify that WAL mode is active.
pub fn verify_wal_mode(conn: &Connection) -> Result<bool, StorageError> {
    let mode: String = conn
        .pragma_query_value(None, "journal_mode", |row| row.get(0))
        .map_err(|e| StorageError::SqliteError {
            message: e.to_string(),
        })?;
    Ok(mode.eq_ignore_ascii_case("wal"))
}
