//! bpo-core: shared foundation for the bpo database layer.
//!
//! - Errors: one enum per subsystem, `thiserror` only.
//! - Config: TOML-based, layered resolution.
//! - Tracing: `tracing` with `EnvFilter` driven by `BPO_LOG`.

pub mod config;
pub mod errors;
pub mod tracing;

pub use config::{BpoConfig, StorageConfig};
pub use errors::{ConfigError, MigrationError, StorageError};
