/// SQL DDL for the eventlog database.
/// Tables are created on open when absent; there is no migration step.
pub const SCHEMA_VERSION: u32 = 1;

/// `AUTOINCREMENT` keeps ids monotonic and never reused.
pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT,
    event_type TEXT,
    severity TEXT,
    source TEXT,
    user_id TEXT,
    status TEXT
);

CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events(timestamp);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);
"#;

pub const PRAGMAS: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA busy_timeout = 5000;
PRAGMA synchronous = NORMAL;
"#;
