//! Response shaping: snake_case domain values in, camelCase JSON out.

use eventlog_core::case::camelize_keys;
use eventlog_core::events::EventRecord;
use serde_json::Value;

/// One event in client format.
pub fn event_to_wire(event: &EventRecord) -> Result<Value, serde_json::Error> {
    Ok(camelize_keys(serde_json::to_value(event)?))
}

/// A page of events in client format.
pub fn events_to_wire(events: &[EventRecord]) -> Result<Value, serde_json::Error> {
    Ok(camelize_keys(serde_json::to_value(events)?))
}

/// `{"totalEvents": n}`.
pub fn count_to_wire(total: u64) -> Value {
    camelize_keys(serde_json::json!({ "total_events": total }))
}
