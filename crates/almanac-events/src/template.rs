//! Small lookups and text helpers for template code.
//!
//! Every helper degrades to `false` or unchanged text instead of failing.

use chrono::{DateTime, Utc};

use crate::dates::DayBoundary;
use crate::event::{Event, EventId};
use crate::store::EventStore;

fn load<S: EventStore + ?Sized>(store: &S, id: EventId) -> Option<Event> {
    match store.event(id) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(event_id = id, "Failed to load event: {}", e);
            None
        }
    }
}

pub fn event_is_all_day<S: EventStore + ?Sized>(store: &S, id: EventId) -> bool {
    load(store, id).is_some_and(|event| event.is_all_day())
}

pub fn event_is_multiday<S: EventStore + ?Sized>(
    store: &S,
    id: EventId,
    boundary: &DayBoundary,
) -> bool {
    load(store, id).is_some_and(|event| event.is_multiday(boundary))
}

pub fn is_past_event<S: EventStore + ?Sized>(store: &S, id: EventId, now: DateTime<Utc>) -> bool {
    load(store, id).is_some_and(|event| event.is_past(now))
}

/// Append `field` to `body`, with `separator` only when both are non-empty.
pub fn separated_field(body: &str, separator: &str, field: &str) -> String {
    match (body.is_empty(), field.is_empty()) {
        (_, true) => body.to_string(),
        (true, false) => field.to_string(),
        (false, false) => format!("{}{}{}", body, separator, field),
    }
}
