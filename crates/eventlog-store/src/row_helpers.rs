use chrono::NaiveDateTime;
use eventlog_core::timestamp;

use crate::error::StoreError;

/// Get a required column value from a row, returning CorruptRow on failure.
pub fn get<T: rusqlite::types::FromSql>(
    row: &rusqlite::Row<'_>,
    idx: usize,
    table: &'static str,
    column: &'static str,
) -> Result<T, StoreError> {
    row.get(idx).map_err(|e| StoreError::CorruptRow {
        table,
        column,
        detail: e.to_string(),
    })
}

/// Get an optional column value.
pub fn get_opt<T: rusqlite::types::FromSql>(
    row: &rusqlite::Row<'_>,
    idx: usize,
    table: &'static str,
    column: &'static str,
) -> Result<Option<T>, StoreError> {
    row.get(idx).map_err(|e| StoreError::CorruptRow {
        table,
        column,
        detail: e.to_string(),
    })
}

/// Parse a stored timestamp column, returning CorruptRow on parse failure.
pub fn parse_timestamp(
    raw: Option<&str>,
    table: &'static str,
    column: &'static str,
) -> Result<Option<NaiveDateTime>, StoreError> {
    raw.map(|raw| {
        timestamp::parse_timestamp(raw).map_err(|e| StoreError::CorruptRow {
            table,
            column,
            detail: e.to_string(),
        })
    })
    .transpose()
}
