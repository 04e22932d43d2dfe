//! Top-level bpo configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::StorageConfig;
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`BPO_*`)
/// 3. Project config (`bpo.toml` in the working directory)
/// 4. User config (`~/.bpo/config.toml`)
/// 5. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BpoConfig {
    pub storage: StorageConfig,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub db_path: Option<PathBuf>,
    pub busy_timeout_ms: Option<u64>,
}

impl BpoConfig {
    /// Load configuration with layered resolution rooted at `root`.
    pub fn load(root: &Path, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Lowest priority: user config. Only a parse error is fatal here.
        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                match Self::merge_toml_file(&mut config, &user_config_path) {
                    Ok(()) => {}
                    Err(ConfigError::FileNotFound { path }) => {
                        ::tracing::debug!(%path, "user config unreadable, using defaults");
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        let project_config_path = root.join("bpo.toml");
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        Self::apply_env_overrides(&mut config);

        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(config: &BpoConfig) -> Result<(), ConfigError> {
        if config.storage.busy_timeout_ms == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "storage.busy_timeout_ms".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if let Some(ref path) = config.storage.db_path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::ValidationFailed {
                    field: "storage.db_path".to_string(),
                    message: "must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    fn user_config_path() -> Option<PathBuf> {
        home_dir().map(|h| h.join(".bpo").join("config.toml"))
    }

    fn merge_toml_file(config: &mut BpoConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: BpoConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`; only `Some` values in `other` win.
    fn merge(base: &mut BpoConfig, other: &BpoConfig) {
        if other.storage.db_path.is_some() {
            base.storage.db_path = other.storage.db_path.clone();
        }
        if other.storage.busy_timeout_ms.is_some() {
            base.storage.busy_timeout_ms = other.storage.busy_timeout_ms;
        }
        if other.storage.wal.is_some() {
            base.storage.wal = other.storage.wal;
        }
        if other.storage.lock_migrations.is_some() {
            base.storage.lock_migrations = other.storage.lock_migrations;
        }
    }

    /// Pattern: `BPO_DB_PATH`, `BPO_BUSY_TIMEOUT_MS`, `BPO_WAL`, `BPO_LOCK_MIGRATIONS`.
    /// Unparseable values are ignored.
    fn apply_env_overrides(config: &mut BpoConfig) {
        if let Ok(val) = std::env::var("BPO_DB_PATH") {
            if !val.is_empty() {
                config.storage.db_path = Some(PathBuf::from(val));
            }
        }
        if let Ok(val) = std::env::var("BPO_BUSY_TIMEOUT_MS") {
            if let Ok(v) = val.parse::<u64>() {
                config.storage.busy_timeout_ms = Some(v);
            }
        }
        if let Ok(val) = std::env::var("BPO_WAL") {
            if let Ok(v) = val.parse::<bool>() {
                config.storage.wal = Some(v);
            }
        }
        if let Ok(val) = std::env::var("BPO_LOCK_MIGRATIONS") {
            if let Ok(v) = val.parse::<bool>() {
                config.storage.lock_migrations = Some(v);
            }
        }
    }

    fn apply_cli_overrides(config: &mut BpoConfig, cli: &CliOverrides) {
        if let Some(ref v) = cli.db_path {
            config.storage.db_path = Some(v.clone());
        }
        if let Some(v) = cli.busy_timeout_ms {
            config.storage.busy_timeout_ms = Some(v);
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
