//! Earliest start and latest end over the whole event collection.
//!
//! Both values live in the option store as canonical datetime text, in the
//! site timezone. A missing value triggers one rebuild scan that writes both.

use chrono_tz::Tz;

use crate::dates::{reformat, DB_DATETIME_FORMAT};
use crate::error::ScheduleError;
use crate::event::Event;
use crate::store::{EventStore, OptionStore};

/// Option key holding the earliest known start.
pub const EARLIEST_DATE_KEY: &str = "earliest_date";

/// Option key holding the latest known end.
pub const LATEST_DATE_KEY: &str = "latest_date";

/// Earliest start and latest end found by one scan.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeBounds {
    pub earliest_start: Event,
    pub latest_end: Event,
}

/// Resolves the known date range, rebuilding it from the event store on miss.
pub struct KnownRange<E, O> {
    events: E,
    options: O,
    timezone: Tz,
}

impl<E: EventStore, O: OptionStore> KnownRange<E, O> {
    pub fn new(events: E, options: O, timezone: Tz) -> Self {
        Self {
            events,
            options,
            timezone,
        }
    }

    /// Earliest known event start in `format`, `None` when there are no events.
    pub fn earliest(&mut self, format: &str) -> Option<String> {
        self.resolve(EARLIEST_DATE_KEY, format)
    }

    /// Latest known event end in `format`, `None` when there are no events.
    pub fn latest(&mut self, format: &str) -> Option<String> {
        self.resolve(LATEST_DATE_KEY, format)
    }

    /// Scan every event once and store both bounds from that scan.
    ///
    /// With no events both options are removed.
    pub fn rebuild(&mut self) -> Result<Option<RangeBounds>, ScheduleError> {
        let events = self.events.all_events()?;
        let bounds = scan(events);

        match &bounds {
            Some(bounds) => {
                let earliest = bounds
                    .earliest_start
                    .start
                    .with_timezone(&self.timezone)
                    .format(DB_DATETIME_FORMAT)
                    .to_string();
                let latest = bounds
                    .latest_end
                    .end
                    .with_timezone(&self.timezone)
                    .format(DB_DATETIME_FORMAT)
                    .to_string();

                self.options.set_pair(
                    (EARLIEST_DATE_KEY, earliest.as_str()),
                    (LATEST_DATE_KEY, latest.as_str()),
                )?;
                tracing::info!(%earliest, %latest, "Rebuilt known event range");
            }
            None => {
                self.options.remove_pair(EARLIEST_DATE_KEY, LATEST_DATE_KEY)?;
                tracing::info!("Known event range is empty");
            }
        }

        Ok(bounds)
    }

    /// Forget both bounds so the next lookup rebuilds.
    pub fn invalidate(&mut self) -> Result<(), ScheduleError> {
        self.options.remove_pair(EARLIEST_DATE_KEY, LATEST_DATE_KEY)
    }

    pub fn into_parts(self) -> (E, O) {
        (self.events, self.options)
    }

    fn resolve(&mut self, key: &str, format: &str) -> Option<String> {
        match self.try_resolve(key, format) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, "Known range unavailable: {}", e);
                None
            }
        }
    }

    fn try_resolve(&mut self, key: &str, format: &str) -> Result<Option<String>, ScheduleError> {
        if let Some(stored) = self.stored(key)? {
            return reformat(&stored, format).map(Some);
        }

        tracing::debug!(key, "Known range not cached, rebuilding");
        self.rebuild()?;

        match self.stored(key)? {
            Some(stored) => reformat(&stored, format).map(Some),
            None => Ok(None),
        }
    }

    /// The stored value for `key`, only while its counterpart is stored too.
    fn stored(&self, key: &str) -> Result<Option<String>, ScheduleError> {
        let earliest = self.options.get(EARLIEST_DATE_KEY)?;
        let latest = self.options.get(LATEST_DATE_KEY)?;
        match (earliest, latest) {
            (Some(earliest), Some(latest)) => {
                Ok(Some(if key == EARLIEST_DATE_KEY { earliest } else { latest }))
            }
            (None, None) => Ok(None),
            _ => {
                tracing::warn!("Known range has only one bound stored, rebuilding");
                Ok(None)
            }
        }
    }
}

/// Earliest-starting and latest-ending events, compared as instants.
fn scan(events: Vec<Event>) -> Option<RangeBounds> {
    let mut iter = events.into_iter();
    let first = iter.next()?;
    let mut bounds = RangeBounds {
        earliest_start: first.clone(),
        latest_end: first,
    };

    for event in iter {
        if event.start < bounds.earliest_start.start {
            bounds.earliest_start = event.clone();
        }
        if event.end > bounds.latest_end.end {
            bounds.latest_end = event;
        }
    }

    Some(bounds)
}
