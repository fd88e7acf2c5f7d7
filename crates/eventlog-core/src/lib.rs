//! Domain types shared by the eventlog crates: the event record model,
//! timestamp coercion and the snake_case → camelCase key translator.

pub mod case;
pub mod errors;
pub mod events;
pub mod ids;
pub mod timestamp;

pub use errors::CoreError;
pub use events::{
    EventFilter, EventRecord, EventSummary, HourlyCount, NewEvent, SourceCount, TimestampInput,
    UserActivity,
};
pub use ids::EventId;
