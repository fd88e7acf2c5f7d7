use std::collections::BTreeMap;

use rusqlite::Connection;
use tracing::{debug, instrument};

use eventlog_core::events::{
    EventFilter, EventRecord, EventSummary, HourlyCount, NewEvent, SourceCount, UserActivity,
};
use eventlog_core::ids::EventId;
use eventlog_core::timestamp;

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

const SELECT_COLUMNS: &str =
    "SELECT id, timestamp, event_type, severity, source, user_id, status FROM events";

/// Rows kept in the ranked summary lists.
const SUMMARY_TOP_N: u32 = 10;

/// Hour bucket of a stored `YYYY-MM-DDTHH:MM:SS[.ffffff]` timestamp.
const HOUR_BUCKET: &str = "substr(timestamp, 1, 13) || ':00'";

/// Data access for the `events` table.
pub struct EventRepo {
    db: Database,
}

impl EventRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// List events in insertion order, skipping `offset` rows and returning
    /// at most `limit`. An empty page is not an error.
    pub fn list(&self, offset: u32, limit: u32) -> Result<Vec<EventRecord>, StoreError> {
        self.list_filtered(&EventFilter::default(), offset, limit)
    }

    /// [`EventRepo::list`] restricted to events matching `filter`. Offset
    /// and limit apply to the matching rows.
    #[instrument(skip(self))]
    pub fn list_filtered(
        &self,
        filter: &EventFilter,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<EventRecord>, StoreError> {
        let mut conditions: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(ref severity) = filter.severity {
            conditions.push("severity = ?");
            values.push(Box::new(severity.clone()));
        }
        if let Some(ref event_type) = filter.event_type {
            conditions.push("event_type = ?");
            values.push(Box::new(event_type.clone()));
        }
        if let Some(ref source) = filter.source {
            conditions.push("source = ?");
            values.push(Box::new(source.clone()));
        }
        // Stored timestamps share one fixed-width layout, so text order is
        // time order.
        if let Some(ref start) = filter.start {
            conditions.push("timestamp >= ?");
            values.push(Box::new(timestamp::format_timestamp(start)));
        }
        if let Some(ref end) = filter.end {
            conditions.push("timestamp <= ?");
            values.push(Box::new(timestamp::format_timestamp(end)));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        values.push(Box::new(limit));
        values.push(Box::new(offset));

        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS}{where_clause} ORDER BY id ASC LIMIT ? OFFSET ?"
            ))?;
            let params: Vec<&dyn rusqlite::types::ToSql> =
                values.iter().map(AsRef::as_ref).collect();
            let mut rows = stmt.query(params.as_slice())?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                results.push(row_to_event(row)?);
            }
            Ok(results)
        })
    }

    /// Persist a new event and return it as stored, including its
    /// store-assigned id.
    ///
    /// Textual timestamps are coerced before anything is written; an
    /// unparseable timestamp fails with [`StoreError::Parse`] and leaves the
    /// table untouched.
    #[instrument(skip(self, event), fields(event_type = ?event.event_type))]
    pub fn create(&self, event: NewEvent) -> Result<EventRecord, StoreError> {
        let ts = event.resolve_timestamp()?;
        let ts_text = ts.as_ref().map(timestamp::format_timestamp);

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO events (timestamp, event_type, severity, source, user_id, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    ts_text,
                    event.event_type,
                    event.severity,
                    event.source,
                    event.user_id,
                    event.status,
                ],
            )?;
            let id = EventId::from_raw(conn.last_insert_rowid());
            debug!(event_id = %id, "event inserted");
            fetch(conn, id)
        })
    }

    /// Get a single event by id.
    #[instrument(skip(self), fields(event_id = %id))]
    pub fn get(&self, id: EventId) -> Result<EventRecord, StoreError> {
        self.db.with_conn(|conn| fetch(conn, id))
    }

    /// Total number of stored events.
    #[instrument(skip(self))]
    pub fn count(&self) -> Result<u64, StoreError> {
        self.db.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
            Ok(n as u64)
        })
    }

    /// Totals, distinct users, per-label counts, the busiest sources and
    /// users, and hourly timelines. Rows with a NULL label are left out of
    /// that label's aggregates; rows without a timestamp are left out of the
    /// timelines.
    #[instrument(skip(self))]
    pub fn summary(&self) -> Result<EventSummary, StoreError> {
        self.db.with_conn(|conn| {
            let (total, users): (i64, i64) = conn.query_row(
                "SELECT COUNT(*), COUNT(DISTINCT user_id) FROM events",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            Ok(EventSummary {
                total_events: total as u64,
                users_affected: users as u64,
                severity_distribution: label_counts(conn, LabelColumn::Severity)?,
                alert_status: label_counts(conn, LabelColumn::Status)?,
                event_counts_by_type: label_counts(conn, LabelColumn::EventType)?,
                top_source_countries: top_sources(conn, SUMMARY_TOP_N)?,
                top_affected_users: top_users(conn, SUMMARY_TOP_N)?,
                event_timeline: hourly_counts(conn, None)?,
                hourly_critical_events: hourly_counts(conn, Some("Critical"))?,
            })
        })
    }
}

/// Label columns that can be aggregated. Keeps column names out of caller
/// supplied strings.
#[derive(Clone, Copy, Debug)]
enum LabelColumn {
    Severity,
    Status,
    EventType,
}

impl LabelColumn {
    fn name(self) -> &'static str {
        match self {
            Self::Severity => "severity",
            Self::Status => "status",
            Self::EventType => "event_type",
        }
    }
}

fn label_counts(
    conn: &Connection,
    column: LabelColumn,
) -> Result<BTreeMap<String, u64>, StoreError> {
    let col = column.name();
    let mut stmt = conn.prepare(&format!(
        "SELECT {col}, COUNT(*) FROM events WHERE {col} IS NOT NULL GROUP BY {col}"
    ))?;
    let mut rows = stmt.query([])?;
    let mut counts = BTreeMap::new();
    while let Some(row) = rows.next()? {
        let label: String = row_helpers::get(row, 0, "events", col)?;
        let n: i64 = row_helpers::get(row, 1, "events", col)?;
        let _ = counts.insert(label, n as u64);
    }
    Ok(counts)
}

fn top_sources(conn: &Connection, limit: u32) -> Result<Vec<SourceCount>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT source, COUNT(*) AS n FROM events WHERE source IS NOT NULL
         GROUP BY source ORDER BY n DESC, source ASC LIMIT ?1",
    )?;
    let mut rows = stmt.query([limit])?;
    let mut sources = Vec::new();
    while let Some(row) = rows.next()? {
        let n: i64 = row_helpers::get(row, 1, "events", "source")?;
        sources.push(SourceCount {
            country: row_helpers::get(row, 0, "events", "source")?,
            count: n as u64,
        });
    }
    Ok(sources)
}

fn top_users(conn: &Connection, limit: u32) -> Result<Vec<UserActivity>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT user_id, COUNT(*) AS n FROM events WHERE user_id IS NOT NULL
         GROUP BY user_id ORDER BY n DESC, user_id ASC LIMIT ?1",
    )?;
    let mut rows = stmt.query([limit])?;
    let mut users = Vec::new();
    while let Some(row) = rows.next()? {
        let n: i64 = row_helpers::get(row, 1, "events", "user_id")?;
        users.push(UserActivity {
            user_id: row_helpers::get(row, 0, "events", "user_id")?,
            events: n as u64,
            severity_scores: BTreeMap::new(),
        });
    }
    if users.is_empty() {
        return Ok(users);
    }

    let mut stmt = conn.prepare(
        "SELECT user_id, severity, COUNT(*) FROM events
         WHERE user_id IS NOT NULL AND severity IS NOT NULL
         GROUP BY user_id, severity",
    )?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let user_id: String = row_helpers::get(row, 0, "events", "user_id")?;
        let Some(user) = users.iter_mut().find(|u| u.user_id == user_id) else {
            continue;
        };
        let severity: String = row_helpers::get(row, 1, "events", "severity")?;
        let n: i64 = row_helpers::get(row, 2, "events", "severity")?;
        let _ = user.severity_scores.insert(severity, n as u64);
    }
    Ok(users)
}

/// Events per hour bucket, optionally only those with the given severity.
fn hourly_counts(
    conn: &Connection,
    severity: Option<&str>,
) -> Result<Vec<HourlyCount>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {HOUR_BUCKET} AS hour, COUNT(*) FROM events
         WHERE timestamp IS NOT NULL AND (?1 IS NULL OR severity = ?1)
         GROUP BY hour ORDER BY hour ASC"
    ))?;
    let mut rows = stmt.query([severity])?;
    let mut buckets = Vec::new();
    while let Some(row) = rows.next()? {
        let n: i64 = row_helpers::get(row, 1, "events", "timestamp")?;
        buckets.push(HourlyCount {
            hour: row_helpers::get(row, 0, "events", "timestamp")?,
            count: n as u64,
        });
    }
    Ok(buckets)
}

fn fetch(conn: &Connection, id: EventId) -> Result<EventRecord, StoreError> {
    let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} WHERE id = ?1"))?;
    let mut rows = stmt.query([id.as_i64()])?;
    match rows.next()? {
        Some(row) => row_to_event(row),
        None => Err(StoreError::NotFound(format!("event {id}"))),
    }
}

fn row_to_event(row: &rusqlite::Row<'_>) -> Result<EventRecord, StoreError> {
    let raw_ts: Option<String> = row_helpers::get_opt(row, 1, "events", "timestamp")?;
    Ok(EventRecord {
        id: EventId::from_raw(row_helpers::get(row, 0, "events", "id")?),
        timestamp: row_helpers::parse_timestamp(raw_ts.as_deref(), "events", "timestamp")?,
        event_type: row_helpers::get_opt(row, 2, "events", "event_type")?,
        severity: row_helpers::get_opt(row, 3, "events", "severity")?,
        source: row_helpers::get_opt(row, 4, "events", "source")?,
        user_id: row_helpers::get_opt(row, 5, "events", "user_id")?,
        status: row_helpers::get_opt(row, 6, "events", "status")?,
    })
}
