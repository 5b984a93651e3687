// crates/lifeledger-config/src/config.rs
// ============================================================================
// Module: Lifeledger Configuration
// Description: Configuration loading and validation for Lifeledger.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: lifeledger-core, lifeledger-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The file carries the store settings, the synchronizer policy, logging
//! options, and the declared dataset catalog:
//!
//! ```toml
//! [store]
//! type = "sqlite"
//! path = "data/lifeledger.db"
//!
//! [sync]
//! policy = "diff_before_write"
//!
//! [[datasets]]
//! id = "todos"
//! name = "Todos"
//! type = "todo"
//!
//! [[datasets.fields]]
//! key = "title"
//! type = "text"
//! displayName = "Title"
//! isUnique = true
//! ```
//!
//! Missing or invalid configuration fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use lifeledger_core::DatasetDefinition;
use lifeledger_core::SyncPolicy;
use lifeledger_store_sqlite::SqliteStoreConfig;
use lifeledger_store_sqlite::SqliteStoreMode;
use lifeledger_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "lifeledger.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "LIFELEDGER_CONFIG";
/// Maximum size of a config file in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default busy timeout (ms).
const DEFAULT_STORE_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Default log filter directive.
const DEFAULT_LOG_LEVEL: &str = "info";

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Lifeledger configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    /// Store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Schema synchronizer configuration.
    #[serde(default)]
    pub sync: SyncConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Declared dataset catalog.
    #[serde(default)]
    pub datasets: Vec<DatasetDefinition>,
}

impl LedgerConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order: the explicit `path`, then [`CONFIG_ENV_VAR`], then
    /// [`DEFAULT_CONFIG_NAME`] in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] when validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store.validate()?;
        self.logging.validate()?;
        let mut seen = BTreeSet::new();
        for definition in &self.datasets {
            definition
                .validate()
                .map_err(|err| ConfigError::Invalid(format!("datasets.{}: {err}", definition.id)))?;
            if !seen.insert(&definition.id) {
                return Err(ConfigError::Invalid(format!(
                    "datasets.{} is declared more than once",
                    definition.id
                )));
            }
        }
        Ok(())
    }
}

/// Store backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    /// Use the in-memory store (contents are lost on exit).
    Memory,
    /// Use the `SQLite`-backed durable store.
    #[default]
    Sqlite,
}

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Store backend type.
    #[serde(rename = "type", default)]
    pub store_type: StoreType,
    /// `SQLite` database path when using the sqlite backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_store_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_type: StoreType::default(),
            path: None,
            busy_timeout_ms: default_store_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl StoreConfig {
    /// Validates store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.store_type {
            StoreType::Memory => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid(
                        "memory store must not set path".to_string(),
                    ));
                }
                Ok(())
            }
            StoreType::Sqlite => {
                let path = self.path.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("sqlite store requires path".to_string())
                })?;
                validate_store_path(path)
            }
        }
    }

    /// Returns the `SQLite` settings, or `None` for the memory backend.
    #[must_use]
    pub fn sqlite(&self) -> Option<SqliteStoreConfig> {
        if self.store_type != StoreType::Sqlite {
            return None;
        }
        let path = self.path.clone()?;
        Some(SqliteStoreConfig {
            path,
            busy_timeout_ms: self.busy_timeout_ms,
            journal_mode: self.journal_mode,
            sync_mode: self.sync_mode,
        })
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_store_busy_timeout_ms() -> u64 {
    DEFAULT_STORE_BUSY_TIMEOUT_MS
}

/// Schema synchronizer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// How existing datasets are reconciled with their declarations.
    #[serde(default)]
    pub policy: SyncPolicy,
    /// Delete datasets that are not declared after synchronizing.
    #[serde(default)]
    pub prune_undeclared: bool,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Filter directive (`info`, `lifeledger_core=debug`, ...).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// Validates the filter directive.
    fn validate(&self) -> Result<(), ConfigError> {
        EnvFilter::try_new(&self.level).map(|_| ()).map_err(|err| {
            ConfigError::Invalid(format!("logging.level is not a valid filter: {err}"))
        })
    }
}

/// Returns the default log filter directive.
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the caller or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates the store path through the store's own checks.
fn validate_store_path(path: &Path) -> Result<(), ConfigError> {
    SqliteStoreConfig::new(path)
        .validate()
        .map_err(|err| ConfigError::Invalid(format!("store.path: {err}")))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
