/*!
 * Emulation Configuration
 *
 * Where the shared table lives and how logs are emitted. Loaded from the
 * environment by the binary, or from JSON by embedders.
 */

use crate::core::limits::{DEFAULT_LOCK_PATH, DEFAULT_TABLE_PATH};
use crate::table::ProcessTable;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

/// Backing file of the shared table
pub const ENV_TABLE_PATH: &str = "PROCS_TABLE_PATH";
/// Lock file guarding the shared table
pub const ENV_LOCK_PATH: &str = "PROCS_LOCK_PATH";
/// `heap` or `mapped`
pub const ENV_BACKEND: &str = "PROCS_BACKEND";
/// `1` or `true` for JSON log lines
pub const ENV_TRACE_JSON: &str = "PROCS_TRACE_JSON";

#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error("Unknown table backend: {0}")]
    #[diagnostic(code(config::backend), help("Use \"heap\" or \"mapped\"."))]
    UnknownBackend(String),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(config::parse))]
    Parse(#[from] serde_json::Error),

    #[error("Failed to open process table: {0}")]
    #[diagnostic(code(config::open))]
    Open(#[from] crate::core::errors::ProcessError),
}

/// Where the process table is stored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableBackend {
    /// Private to this host process
    Heap,
    /// File-backed shared mapping visible to every host process
    #[default]
    Mapped,
}

impl std::str::FromStr for TableBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heap" => Ok(TableBackend::Heap),
            "mapped" => Ok(TableBackend::Mapped),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmulationConfig {
    pub backend: TableBackend,
    pub table_path: PathBuf,
    pub lock_path: PathBuf,
    pub trace_json: bool,
}

impl Default for EmulationConfig {
    fn default() -> Self {
        Self {
            backend: TableBackend::default(),
            table_path: PathBuf::from(DEFAULT_TABLE_PATH),
            lock_path: PathBuf::from(DEFAULT_LOCK_PATH),
            trace_json: false,
        }
    }
}

impl EmulationConfig {
    /// Defaults overridden by `PROCS_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(path) = std::env::var(ENV_TABLE_PATH) {
            config.table_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var(ENV_LOCK_PATH) {
            config.lock_path = PathBuf::from(path);
        }
        if let Ok(backend) = std::env::var(ENV_BACKEND) {
            config.backend = backend.parse()?;
        }
        config.trace_json = std::env::var(ENV_TRACE_JSON)
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Open the configured table
    pub fn open_table(&self) -> Result<ProcessTable, ConfigError> {
        let table = match self.backend {
            TableBackend::Heap => ProcessTable::in_memory(),
            TableBackend::Mapped => self.open_mapped()?,
        };
        info!(backend = ?self.backend, table = %table.describe(), "process table opened");
        Ok(table)
    }

    #[cfg(unix)]
    fn open_mapped(&self) -> Result<ProcessTable, ConfigError> {
        use crate::table::{FileLock, MappedStorage};
        use std::sync::Arc;
        let storage = MappedStorage::open(&self.table_path)?;
        let lock = FileLock::open(&self.lock_path)?;
        Ok(ProcessTable::new(Arc::new(storage), Arc::new(lock)))
    }

    #[cfg(not(unix))]
    fn open_mapped(&self) -> Result<ProcessTable, ConfigError> {
        tracing::warn!("shared mapping unavailable on this host, using heap table");
        Ok(ProcessTable::in_memory())
    }
}
