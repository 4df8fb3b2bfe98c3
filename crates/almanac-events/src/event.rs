//! The read-only event view the formatter and range resolver work on.

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;

use crate::dates::DayBoundary;

/// Identifier of an event in the event store.
pub type EventId = u64;

/// An event as supplied by the event store.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: EventId,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub all_day: bool,
    pub password_protected: bool,
}

impl Event {
    pub fn new(id: EventId, start: DateTime<Tz>, end: DateTime<Tz>) -> Self {
        Self {
            id,
            start,
            end,
            all_day: false,
            password_protected: false,
        }
    }

    pub fn all_day(mut self) -> Self {
        self.all_day = true;
        self
    }

    pub fn password_protected(mut self) -> Self {
        self.password_protected = true;
        self
    }

    pub fn is_all_day(&self) -> bool {
        self.all_day
    }

    /// The end instant on the start's wall clock.
    pub fn local_end(&self) -> DateTime<Tz> {
        self.end.with_timezone(&self.start.timezone())
    }

    /// Whether the event ends after the last second of its start day.
    ///
    /// The end is compared in the start's timezone, so the check follows the
    /// wall clock of the day the event starts on.
    pub fn is_multiday(&self, boundary: &DayBoundary) -> bool {
        self.local_end().naive_local() > boundary.end_of_day(self.start.date_naive())
    }

    /// Whether the event has already ended at `now`.
    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        now > self.end
    }

    /// Whether both endpoints fall in `year` in the start's timezone.
    pub fn within_year(&self, year: i32) -> bool {
        self.start.year() == year && self.local_end().year() == year
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use chrono::{NaiveTime, TimeZone};
    use chrono_tz::{America::New_York, Europe::Berlin, UTC};

    fn at(tz: Tz, y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Tz> {
        tz.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_same_day_is_not_multiday() {
        let event = Event::new(1, at(UTC, 2024, 6, 1, 9, 0), at(UTC, 2024, 6, 1, 23, 59));
        assert!(!event.is_multiday(&DayBoundary::default()));
    }

    #[test]
    fn test_midnight_end_is_multiday() {
        let event = Event::new(1, at(UTC, 2024, 6, 1, 22, 0), at(UTC, 2024, 6, 2, 0, 0));
        assert!(event.is_multiday(&DayBoundary::default()));
    }

    #[test]
    fn test_cutoff_keeps_late_night_on_same_day() {
        let boundary = DayBoundary::new(NaiveTime::from_hms_opt(4, 0, 0).unwrap());
        let event = Event::new(1, at(UTC, 2024, 6, 1, 22, 0), at(UTC, 2024, 6, 2, 2, 0));
        assert!(!event.is_multiday(&boundary));

        let event = Event::new(1, at(UTC, 2024, 6, 1, 22, 0), at(UTC, 2024, 6, 2, 4, 0));
        assert!(event.is_multiday(&boundary));
    }

    #[test]
    fn test_end_compared_in_start_timezone() {
        // 20:00 in New York is 02:00 the next day in Berlin.
        let start = at(New_York, 2024, 6, 1, 18, 0);
        let end = at(New_York, 2024, 6, 1, 20, 0).with_timezone(&Berlin);
        let event = Event::new(1, start, end);
        assert!(!event.is_multiday(&DayBoundary::default()));
    }

    #[test]
    fn test_local_end_uses_start_timezone() {
        let start = at(UTC, 2024, 12, 31, 20, 0);
        let event = Event::new(1, start, start.with_timezone(&Berlin));
        assert_eq!(event.end.year(), 2024);
        assert_eq!(event.local_end().timezone(), UTC);
        assert_eq!(event.local_end(), start);

        // 23:30 UTC on New Year's Eve is already 2025 in Berlin.
        let event = Event::new(
            2,
            at(UTC, 2024, 12, 31, 22, 0),
            at(UTC, 2024, 12, 31, 23, 30).with_timezone(&Berlin),
        );
        assert_eq!(event.end.year(), 2025);
        assert!(event.within_year(2024));
    }

    #[test]
    fn test_dst_transition_day_is_single_day() {
        // Clocks go forward at 02:00 on 2024-03-10 in New York.
        let event = Event::new(
            1,
            at(New_York, 2024, 3, 10, 0, 30),
            at(New_York, 2024, 3, 10, 23, 30),
        );
        assert!(!event.is_multiday(&DayBoundary::default()));
    }

    #[test]
    fn test_is_past() {
        let event = Event::new(1, at(UTC, 2024, 6, 1, 9, 0), at(UTC, 2024, 6, 1, 10, 0));
        assert!(event.is_past(Utc.with_ymd_and_hms(2024, 6, 1, 10, 1, 0).unwrap()));
        assert!(!event.is_past(Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()));
    }

    #[test]
    fn test_within_year() {
        let event = Event::new(1, at(UTC, 2024, 12, 31, 20, 0), at(UTC, 2025, 1, 1, 2, 0));
        assert!(!event.within_year(2024));
        assert!(!event.within_year(2025));

        let event = Event::new(2, at(UTC, 2024, 3, 1, 20, 0), at(UTC, 2024, 3, 2, 2, 0));
        assert!(event.within_year(2024));
    }

    #[test]
    fn test_builders() {
        let event = Event::new(7, at(UTC, 2024, 6, 1, 0, 0), at(UTC, 2024, 6, 2, 0, 0))
            .all_day()
            .password_protected();
        assert!(event.is_all_day());
        assert!(event.password_protected);
    }
}
