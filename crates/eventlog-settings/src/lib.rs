//! # eventlog-settings
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`EventlogSettings::default()`]
//! 2. **User file**: `~/.eventlog/settings.json`, or the path in
//!    `EVENTLOG_SETTINGS` (deep-merged over defaults)
//! 3. **Environment variables**: `EVENTLOG_*` overrides (highest priority)
//!
//! The loaded value is returned to the caller and passed down explicitly;
//! there is no process-wide settings global.
//!
//! ```no_run
//! let settings = eventlog_settings::load_settings().unwrap_or_default();
//! println!("listening on {}:{}", settings.server.host, settings.server.port);
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    deep_merge, load_settings, load_settings_from_path, load_settings_with_report, settings_path,
    LoadedSettings, RejectedOverride,
};
pub use types::*;
