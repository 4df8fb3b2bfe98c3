//! Request-scoped memo table for rendered schedules.

use std::collections::HashMap;

use crate::event::EventId;

/// Identifies one rendering of one event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScheduleKey {
    pub event_id: EventId,
    pub before: String,
    pub after: String,
    pub html: bool,
}

impl ScheduleKey {
    pub fn new(event_id: EventId, before: &str, after: &str, html: bool) -> Self {
        Self {
            event_id,
            before: before.to_string(),
            after: after.to_string(),
            html,
        }
    }
}

/// Rendered schedules for the lifetime of one request.
///
/// Entries are never evicted. Display settings changed after an entry was
/// written do not affect it until the cache is dropped or cleared.
#[derive(Debug, Clone, Default)]
pub struct ScheduleCache {
    entries: HashMap<ScheduleKey, String>,
    hits: u64,
    misses: u64,
}

impl ScheduleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a rendered schedule, counting the hit or miss.
    pub fn lookup(&mut self, key: &ScheduleKey) -> Option<&str> {
        match self.entries.get(key) {
            Some(value) => {
                self.hits += 1;
                Some(value.as_str())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, key: ScheduleKey, value: String) {
        self.entries.insert(key, value);
    }

    pub fn contains(&self, key: &ScheduleKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Forget all entries, e.g. when a new request starts.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_counts_hits_and_misses() {
        let mut cache = ScheduleCache::new();
        let key = ScheduleKey::new(1, "", "", true);

        assert!(cache.lookup(&key).is_none());
        cache.insert(key.clone(), "June 1".to_string());
        assert_eq!(cache.lookup(&key), Some("June 1"));

        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_keys_do_not_collide_on_separator_text() {
        // A joined "id:before:after" string would make these two equal.
        let a = ScheduleKey::new(1, "a:b", "", false);
        let b = ScheduleKey::new(1, "a", "b:", false);
        assert_ne!(a, b);

        let mut cache = ScheduleCache::new();
        cache.insert(a.clone(), "first".to_string());
        assert!(!cache.contains(&b));
    }

    #[test]
    fn test_clear() {
        let mut cache = ScheduleCache::new();
        cache.insert(ScheduleKey::new(1, "", "", false), "x".to_string());
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.hits(), 0);
    }
}
