//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`EventlogSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over defaults
//! 3. Apply environment variable overrides (highest priority)
//! 4. Validate cross-field constraints
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::{eventlog_home, EventlogSettings};

/// Resolve the settings file path: `EVENTLOG_SETTINGS` if set, otherwise
/// `~/.eventlog/settings.json`.
pub fn settings_path() -> PathBuf {
    std::env::var("EVENTLOG_SETTINGS")
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| eventlog_home().join("settings.json"))
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<EventlogSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error. Ignored env values are logged through
/// whatever subscriber is current; callers that load settings before
/// logging is configured should use [`load_settings_with_report`].
pub fn load_settings_from_path(path: &Path) -> Result<EventlogSettings> {
    let loaded = load_settings_with_report(path)?;
    for rejected in &loaded.rejected {
        rejected.log();
    }
    Ok(loaded.settings)
}

/// Settings plus the env overrides that were ignored while loading them.
#[derive(Clone, Debug)]
pub struct LoadedSettings {
    pub settings: EventlogSettings,
    pub rejected: Vec<RejectedOverride>,
}

/// An `EVENTLOG_*` value that could not be parsed and was left unapplied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedOverride {
    pub key: &'static str,
    pub value: String,
    pub expected: &'static str,
}

impl RejectedOverride {
    pub fn log(&self) {
        tracing::warn!(
            key = self.key,
            value = %self.value,
            expected = self.expected,
            "invalid env var, ignoring"
        );
    }
}

/// Like [`load_settings_from_path`], but hands ignored env values back to
/// the caller instead of logging them.
pub fn load_settings_with_report(path: &Path) -> Result<LoadedSettings> {
    load_with(path, |name| std::env::var(name).ok())
}

fn load_with<F>(path: &Path, lookup: F) -> Result<LoadedSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = read_settings_file(path)?;
    let rejected = apply_overrides(&mut settings, lookup);
    settings.validate()?;
    Ok(LoadedSettings { settings, rejected })
}

fn read_settings_file(path: &Path) -> Result<EventlogSettings> {
    let defaults = serde_json::to_value(EventlogSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `EVENTLOG_*` overrides read through `lookup`.
///
/// Invalid values leave the file/default value in place and are returned.
pub fn apply_overrides<F>(settings: &mut EventlogSettings, lookup: F) -> Vec<RejectedOverride>
where
    F: Fn(&str) -> Option<String>,
{
    let mut env = EnvReader {
        lookup,
        rejected: Vec::new(),
    };

    if let Some(v) = env.string("EVENTLOG_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = env.u16_in("EVENTLOG_PORT", 1, 65535) {
        settings.server.port = v;
    }
    if let Some(v) = env.u32_in("EVENTLOG_MAX_PAGE_LIMIT", 1, 100_000) {
        settings.server.max_page_limit = v;
    }
    if let Some(v) = env.u32_in("EVENTLOG_DEFAULT_PAGE_LIMIT", 1, 100_000) {
        settings.server.default_page_limit = v;
    }
    if let Some(v) = env.string("EVENTLOG_DB_PATH") {
        settings.database.path = PathBuf::from(v);
    }
    if let Some(v) = env.string("EVENTLOG_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = env.bool("EVENTLOG_LOG_JSON") {
        settings.logging.json = v;
    }
    env.rejected
}

// ── Value parsers ───────────────────────────────────────────────────────────

/// Parse a boolean env value: `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u32` within a range.
pub fn parse_u32_range(val: &str, min: u32, max: u32) -> Option<u32> {
    let n: u32 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

struct EnvReader<F> {
    lookup: F,
    rejected: Vec<RejectedOverride>,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.is_empty())
    }

    fn bool(&mut self, name: &'static str) -> Option<bool> {
        let val = (self.lookup)(name)?;
        self.checked(name, val, "boolean", |v| parse_bool(v))
    }

    fn u16_in(&mut self, name: &'static str, min: u16, max: u16) -> Option<u16> {
        let val = (self.lookup)(name)?;
        self.checked(name, val, "u16 in range", |v| parse_u16_range(v, min, max))
    }

    fn u32_in(&mut self, name: &'static str, min: u32, max: u32) -> Option<u32> {
        let val = (self.lookup)(name)?;
        self.checked(name, val, "u32 in range", |v| parse_u32_range(v, min, max))
    }

    fn checked<T>(
        &mut self,
        key: &'static str,
        value: String,
        expected: &'static str,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Option<T> {
        let result = parse(&value);
        if result.is_none() {
            self.rejected.push(RejectedOverride {
                key,
                value,
                expected,
            });
        }
        result
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
