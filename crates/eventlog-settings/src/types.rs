//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]`, so a settings
//! file may be partial: missing fields keep their default value.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type for the eventlog service.
///
/// ```json
/// {
///   "server": { "port": 9000, "maxPageLimit": 500 },
///   "database": { "path": "/var/lib/eventlog/events.db" },
///   "logging": { "level": "debug", "json": true }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventlogSettings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
}

impl EventlogSettings {
    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let server = &self.server;
        if server.max_page_limit == 0 {
            return Err(SettingsError::InvalidValue(
                "server.maxPageLimit must be at least 1".into(),
            ));
        }
        if server.default_page_limit == 0 || server.default_page_limit > server.max_page_limit {
            return Err(SettingsError::InvalidValue(format!(
                "server.defaultPageLimit must be between 1 and {}",
                server.max_page_limit
            )));
        }
        Ok(())
    }
}

/// HTTP listener and pagination settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// HTTP port. `0` picks a free port.
    pub port: u16,
    /// Page size used when a request omits `limit`.
    pub default_page_limit: u32,
    /// Requests asking for more than this many events are clamped.
    pub max_page_limit: u32,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            default_page_limit: 100,
            max_page_limit: 1000,
        }
    }
}

/// SQLite store location.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseSettings {
    pub path: PathBuf,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: eventlog_home().join("events.db"),
        }
    }
}

/// Log output settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default level (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
    /// One JSON object per line instead of human-readable output.
    pub json: bool,
    /// Per-module overrides, e.g. `{"eventlog_store": "debug"}`.
    pub module_levels: BTreeMap<String, String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            module_levels: BTreeMap::new(),
        }
    }
}

/// `~/.eventlog`, falling back to `/tmp/.eventlog` when `HOME` is unset.
pub fn eventlog_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
        .join(".eventlog")
}
