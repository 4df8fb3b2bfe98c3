//! SQLite-backed event and option storage.

use chrono::DateTime;
use chrono_tz::Tz;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::error::ScheduleError;
use crate::event::{Event, EventId};
use crate::store::{EventStore, OptionStore};

/// SQLite store for events and the options that describe them.
pub struct SqliteStore {
    conn: Connection,
}

/// Columns of an `events` row before timezone resolution.
struct EventRow {
    id: EventId,
    start: String,
    end: String,
    timezone: String,
    all_day: bool,
    password_protected: bool,
}

impl SqliteStore {
    /// Open (or create) a store at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ScheduleError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store.
    pub fn in_memory() -> Result<Self, ScheduleError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> Result<(), ScheduleError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY,
                start_at TEXT NOT NULL,
                end_at TEXT NOT NULL,
                timezone TEXT NOT NULL,
                all_day INTEGER NOT NULL DEFAULT 0,
                password_protected INTEGER NOT NULL DEFAULT 0,
                start_ms INTEGER NOT NULL,
                end_ms INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS options (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_events_start ON events(start_ms);
            CREATE INDEX IF NOT EXISTS idx_events_end ON events(end_ms);
            "#,
        )?;
        Ok(())
    }

    /// Store an event, replacing any event with the same id.
    ///
    /// Both endpoints are stored in the start's timezone.
    pub fn store_event(&self, event: &Event) -> Result<(), ScheduleError> {
        let tz = event.start.timezone();
        let end = event.end.with_timezone(&tz);

        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO events
            (id, start_at, end_at, timezone, all_day, password_protected, start_ms, end_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                event.id,
                event.start.to_rfc3339(),
                end.to_rfc3339(),
                tz.name(),
                event.all_day as i32,
                event.password_protected as i32,
                event.start.timestamp_millis(),
                end.timestamp_millis(),
            ],
        )?;
        tracing::debug!(event_id = event.id, "Stored event");
        Ok(())
    }

    /// Delete an event.
    pub fn delete_event(&self, id: EventId) -> Result<(), ScheduleError> {
        self.conn.execute("DELETE FROM events WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Number of stored events.
    pub fn event_count(&self) -> Result<u64, ScheduleError> {
        let count: u64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Clear all stored events and options.
    pub fn clear(&self) -> Result<(), ScheduleError> {
        self.conn.execute_batch("DELETE FROM events; DELETE FROM options;")?;
        Ok(())
    }

    fn read_row(row: &rusqlite::Row) -> rusqlite::Result<EventRow> {
        Ok(EventRow {
            id: row.get(0)?,
            start: row.get(1)?,
            end: row.get(2)?,
            timezone: row.get(3)?,
            all_day: row.get::<_, i32>(4)? != 0,
            password_protected: row.get::<_, i32>(5)? != 0,
        })
    }

    fn row_to_event(row: EventRow) -> Result<Event, ScheduleError> {
        let invalid = |reason: String| ScheduleError::InvalidEvent { id: row.id, reason };

        let tz: Tz = row
            .timezone
            .parse()
            .map_err(|_| invalid(format!("unknown timezone {}", row.timezone)))?;
        let start = DateTime::parse_from_rfc3339(&row.start)
            .map_err(|e| invalid(format!("start: {}", e)))?
            .with_timezone(&tz);
        let end = DateTime::parse_from_rfc3339(&row.end)
            .map_err(|e| invalid(format!("end: {}", e)))?
            .with_timezone(&tz);

        Ok(Event {
            id: row.id,
            start,
            end,
            all_day: row.all_day,
            password_protected: row.password_protected,
        })
    }
}

const EVENT_COLUMNS: &str =
    "SELECT id, start_at, end_at, timezone, all_day, password_protected FROM events";

impl EventStore for SqliteStore {
    fn event(&self, id: EventId) -> Result<Option<Event>, ScheduleError> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE id = ?1", EVENT_COLUMNS))?;

        let row = stmt.query_row(params![id], Self::read_row).optional()?;
        row.map(Self::row_to_event).transpose()
    }

    fn all_events(&self) -> Result<Vec<Event>, ScheduleError> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY start_ms ASC", EVENT_COLUMNS))?;

        let rows = stmt
            .query_map([], Self::read_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(Self::row_to_event).collect()
    }
}

const SET_OPTION: &str = "INSERT OR REPLACE INTO options (key, value) VALUES (?1, ?2)";
const REMOVE_OPTION: &str = "DELETE FROM options WHERE key = ?1";

impl OptionStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, ScheduleError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM options WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ScheduleError> {
        self.conn.execute(SET_OPTION, params![key, value])?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), ScheduleError> {
        self.conn.execute(REMOVE_OPTION, params![key])?;
        Ok(())
    }

    /// Both writes commit in one transaction or not at all.
    fn set_pair(&mut self, first: (&str, &str), second: (&str, &str)) -> Result<(), ScheduleError> {
        let tx = self.conn.transaction()?;
        for (key, value) in [first, second] {
            tx.execute(SET_OPTION, params![key, value])?;
        }
        tx.commit()?;
        Ok(())
    }

    fn remove_pair(&mut self, first: &str, second: &str) -> Result<(), ScheduleError> {
        let tx = self.conn.transaction()?;
        for key in [first, second] {
            tx.execute(REMOVE_OPTION, params![key])?;
        }
        tx.commit()?;
        Ok(())
    }
}
