//! Collaborator interfaces for events and persisted options, with in-memory
//! implementations.

use std::collections::{BTreeMap, HashMap};

use crate::error::ScheduleError;
use crate::event::{Event, EventId};

/// Read access to the events this crate formats.
pub trait EventStore {
    /// Look up one event. `Ok(None)` when the id does not resolve.
    fn event(&self, id: EventId) -> Result<Option<Event>, ScheduleError>;

    /// Every event in the collection, in no particular order.
    fn all_events(&self) -> Result<Vec<Event>, ScheduleError>;
}

impl<T: EventStore + ?Sized> EventStore for &T {
    fn event(&self, id: EventId) -> Result<Option<Event>, ScheduleError> {
        (**self).event(id)
    }

    fn all_events(&self) -> Result<Vec<Event>, ScheduleError> {
        (**self).all_events()
    }
}

/// Durable named scalar settings.
pub trait OptionStore {
    fn get(&self, key: &str) -> Result<Option<String>, ScheduleError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), ScheduleError>;

    fn remove(&mut self, key: &str) -> Result<(), ScheduleError>;

    /// Set two options together. When the second write fails both keys are
    /// removed, so neither value outlives the other.
    fn set_pair(&mut self, first: (&str, &str), second: (&str, &str)) -> Result<(), ScheduleError> {
        self.set(first.0, first.1)?;
        if let Err(e) = self.set(second.0, second.1) {
            for key in [first.0, second.0] {
                if let Err(cleanup) = self.remove(key) {
                    tracing::warn!(key, "Failed to remove option: {}", cleanup);
                }
            }
            return Err(e);
        }
        Ok(())
    }

    /// Remove two options, attempting both even when the first fails.
    fn remove_pair(&mut self, first: &str, second: &str) -> Result<(), ScheduleError> {
        let removed = self.remove(first);
        self.remove(second)?;
        removed
    }
}

impl<T: OptionStore + ?Sized> OptionStore for &mut T {
    fn get(&self, key: &str) -> Result<Option<String>, ScheduleError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ScheduleError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), ScheduleError> {
        (**self).remove(key)
    }

    fn set_pair(&mut self, first: (&str, &str), second: (&str, &str)) -> Result<(), ScheduleError> {
        (**self).set_pair(first, second)
    }

    fn remove_pair(&mut self, first: &str, second: &str) -> Result<(), ScheduleError> {
        (**self).remove_pair(first, second)
    }
}

/// Events held in memory, ordered by id.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventStore {
    events: BTreeMap<EventId, Event>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an event.
    pub fn insert(&mut self, event: Event) {
        self.events.insert(event.id, event);
    }

    pub fn remove(&mut self, id: EventId) -> Option<Event> {
        self.events.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl FromIterator<Event> for MemoryEventStore {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        let mut store = Self::new();
        for event in iter {
            store.insert(event);
        }
        store
    }
}

impl EventStore for MemoryEventStore {
    fn event(&self, id: EventId) -> Result<Option<Event>, ScheduleError> {
        Ok(self.events.get(&id).cloned())
    }

    fn all_events(&self) -> Result<Vec<Event>, ScheduleError> {
        Ok(self.events.values().cloned().collect())
    }
}

/// Options held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryOptionStore {
    values: HashMap<String, String>,
}

impl MemoryOptionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OptionStore for MemoryOptionStore {
    fn get(&self, key: &str) -> Result<Option<String>, ScheduleError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ScheduleError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), ScheduleError> {
        self.values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::UTC;

    fn event(id: EventId) -> Event {
        Event::new(
            id,
            UTC.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
            UTC.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_memory_event_store_lookup() {
        let store: MemoryEventStore = [event(1), event(2)].into_iter().collect();
        assert_eq!(store.len(), 2);
        assert_eq!(store.event(2).unwrap().unwrap().id, 2);
        assert!(store.event(3).unwrap().is_none());
    }

    #[test]
    fn test_memory_event_store_through_reference() {
        let mut store = MemoryEventStore::new();
        store.insert(event(5));

        fn count<S: EventStore>(events: S) -> usize {
            events.all_events().unwrap().len()
        }
        assert_eq!(count(&store), 1);
    }

    #[test]
    fn test_memory_option_store() {
        let mut options = MemoryOptionStore::new();
        assert!(options.get("earliest_date").unwrap().is_none());

        options.set("earliest_date", "2024-06-01 09:00:00").unwrap();
        assert_eq!(
            options.get("earliest_date").unwrap().as_deref(),
            Some("2024-06-01 09:00:00")
        );

        options.remove("earliest_date").unwrap();
        assert!(options.get("earliest_date").unwrap().is_none());
    }

    /// Rejects writes to one key.
    struct RejectingOptions {
        inner: MemoryOptionStore,
        rejected: &'static str,
    }

    impl OptionStore for RejectingOptions {
        fn get(&self, key: &str) -> Result<Option<String>, ScheduleError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), ScheduleError> {
            if key == self.rejected {
                return Err(ScheduleError::InvalidDate(value.to_string()));
            }
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<(), ScheduleError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_set_pair_failure_leaves_neither() {
        let mut options = RejectingOptions {
            inner: MemoryOptionStore::new(),
            rejected: "b",
        };
        options.inner.set("b", "old").unwrap();

        assert!(options.set_pair(("a", "new"), ("b", "new")).is_err());
        assert!(options.get("a").unwrap().is_none());
        assert!(options.get("b").unwrap().is_none());
    }

    #[test]
    fn test_pair_through_reference() {
        fn write<O: OptionStore>(mut options: O) {
            options.set_pair(("a", "1"), ("b", "2")).unwrap();
        }
        fn clear<O: OptionStore>(mut options: O) {
            options.remove_pair("a", "b").unwrap();
        }

        let mut options = MemoryOptionStore::new();
        write(&mut options);
        assert_eq!(options.get("b").unwrap().as_deref(), Some("2"));

        clear(&mut options);
        assert!(options.get("a").unwrap().is_none());
        assert!(options.get("b").unwrap().is_none());
    }
}
