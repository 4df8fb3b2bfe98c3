//! Event schedule rendering and known date range resolution.
//!
//! Provides the schedule formatter with its request-scoped memo table, the
//! known range resolver, and SQLite/in-memory stores for events and options.

pub mod dates;
pub mod error;
pub mod event;
pub mod range;
pub mod schedule;
pub mod sqlite;
pub mod store;
pub mod template;

pub use dates::{
    days_of_week, reformat, Clock, DayBoundary, DayNameStyle, FixedClock, SystemClock,
    DB_DATETIME_FORMAT, DB_DATE_FORMAT,
};
pub use error::ScheduleError;
pub use event::{Event, EventId};
pub use range::{KnownRange, RangeBounds, EARLIEST_DATE_KEY, LATEST_DATE_KEY};
pub use schedule::{
    DefaultPolicy, DisplaySettings, FormatSettings, ScheduleCache, ScheduleFormatter, ScheduleKey,
    SchedulePolicy,
};
pub use sqlite::SqliteStore;
pub use store::{EventStore, MemoryEventStore, MemoryOptionStore, OptionStore};
pub use template::{event_is_all_day, event_is_multiday, is_past_event, separated_field};
