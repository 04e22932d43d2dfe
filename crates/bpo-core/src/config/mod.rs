//! Configuration system for bpo.
//! TOML-based, layered resolution: CLI > env > project > user > defaults.

pub mod bpo_config;
pub mod storage_config;

pub use bpo_config::{BpoConfig, CliOverrides};
pub use storage_config::StorageConfig;
