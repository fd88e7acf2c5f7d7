use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::ids::EventId;
use crate::timestamp;

/// A persisted event, as read back from the store.
///
/// Field names are snake_case; the HTTP layer translates them to camelCase
/// on the way out.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: EventId,
    #[serde(with = "timestamp::serde_opt")]
    pub timestamp: Option<NaiveDateTime>,
    pub event_type: Option<String>,
    pub severity: Option<String>,
    pub source: Option<String>,
    pub user_id: Option<String>,
    pub status: Option<String>,
}

/// Timestamp as supplied by a writer: already parsed, or text still to be
/// coerced. JSON strings always arrive as [`TimestampInput::Text`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum TimestampInput {
    At(NaiveDateTime),
    Text(String),
}

impl TimestampInput {
    pub fn resolve(&self) -> Result<NaiveDateTime, CoreError> {
        match self {
            Self::At(ts) => Ok(*ts),
            Self::Text(raw) => timestamp::parse_timestamp(raw),
        }
    }
}

impl From<String> for TimestampInput {
    fn from(raw: String) -> Self {
        Self::Text(raw)
    }
}

impl From<&str> for TimestampInput {
    fn from(raw: &str) -> Self {
        Self::Text(raw.to_string())
    }
}

impl From<NaiveDateTime> for TimestampInput {
    fn from(ts: NaiveDateTime) -> Self {
        Self::At(ts)
    }
}

/// Fields accepted when creating an event.
///
/// Every field is optional, matching the nullable columns of the `events`
/// table. Unknown fields are rejected, including `id`, which only the store
/// assigns. The camelCase spellings that clients receive back are accepted
/// as aliases.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewEvent {
    pub timestamp: Option<TimestampInput>,
    #[serde(alias = "eventType")]
    pub event_type: Option<String>,
    pub severity: Option<String>,
    pub source: Option<String>,
    #[serde(alias = "userId")]
    pub user_id: Option<String>,
    pub status: Option<String>,
}

impl NewEvent {
    /// Coerce the timestamp, if any, into a point in time.
    pub fn resolve_timestamp(&self) -> Result<Option<NaiveDateTime>, CoreError> {
        self.timestamp.as_ref().map(TimestampInput::resolve).transpose()
    }
}

/// Aggregate view over all stored events.
///
/// Map keys are stored labels, so this type renames its own fields instead
/// of going through the key translator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub total_events: u64,
    /// Distinct non-null `user_id` values.
    pub users_affected: u64,
    pub severity_distribution: BTreeMap<String, u64>,
    pub alert_status: BTreeMap<String, u64>,
    pub event_counts_by_type: BTreeMap<String, u64>,
    /// Busiest sources first. The `source` column holds the origin country.
    pub top_source_countries: Vec<SourceCount>,
    /// Users with the most events first, with a per-severity breakdown.
    pub top_affected_users: Vec<UserActivity>,
    /// Events per hour, oldest hour first.
    pub event_timeline: Vec<HourlyCount>,
    /// `Critical` events per hour, oldest hour first.
    pub hourly_critical_events: Vec<HourlyCount>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceCount {
    pub country: String,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActivity {
    pub user_id: String,
    pub events: u64,
    pub severity_scores: BTreeMap<String, u64>,
}

/// Count for one hour bucket, keyed `YYYY-MM-DDTHH:00`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HourlyCount {
    pub hour: String,
    pub count: u64,
}

/// Optional restrictions on which events a listing returns.
///
/// Label fields match exactly. `start` and `end` are inclusive bounds on the
/// timestamp; events without a timestamp never match a bound.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub severity: Option<String>,
    pub event_type: Option<String>,
    pub source: Option<String>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl EventFilter {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
