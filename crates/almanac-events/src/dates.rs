//! Date/time primitives shared by the schedule formatter and the known range.

use std::fmt::Write;

use almanac_core::{check_strftime, ConfigError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use chrono_tz::Tz;

use crate::error::ScheduleError;

/// Canonical storage format for datetimes.
pub const DB_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Canonical storage format for dates.
pub const DB_DATE_FORMAT: &str = "%Y-%m-%d";

/// Source of "now", injected wherever the current date matters.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a given instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Render a datetime with a strftime format.
///
/// A format chrono cannot apply renders as an empty string.
pub fn render(value: &DateTime<Tz>, format: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", value.format(format)).is_err() {
        tracing::warn!(format, "Date format could not be applied");
        out.clear();
    }
    out
}

/// Parse canonical datetime text. Date-only values are taken as midnight.
pub fn parse_canonical(value: &str) -> Result<NaiveDateTime, ScheduleError> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, DB_DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M"))
        .or_else(|_| {
            NaiveDate::parse_from_str(value, DB_DATE_FORMAT).map(|d| d.and_time(NaiveTime::MIN))
        })
        .map_err(|_| ScheduleError::InvalidDate(value.to_string()))
}

/// Convert canonical datetime text into another format.
pub fn reformat(value: &str, format: &str) -> Result<String, ScheduleError> {
    check_strftime(format)?;
    let parsed = parse_canonical(value)?;

    let mut out = String::new();
    write!(out, "{}", parsed.format(format))
        .map_err(|_| ConfigError::InvalidFormat(format.to_string()))?;
    Ok(out)
}

/// Day boundaries shifted by the multi-day cutoff.
///
/// With a cutoff of 04:00 a day runs from 04:00 to 03:59:59 the next morning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayBoundary {
    cutoff: NaiveTime,
}

impl Default for DayBoundary {
    fn default() -> Self {
        Self {
            cutoff: NaiveTime::MIN,
        }
    }
}

impl DayBoundary {
    pub fn new(cutoff: NaiveTime) -> Self {
        Self { cutoff }
    }

    pub fn cutoff(&self) -> NaiveTime {
        self.cutoff
    }

    /// First moment of the day that `date` names.
    pub fn beginning_of_day(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.cutoff)
    }

    /// Last second of the day that `date` names.
    pub fn end_of_day(&self, date: NaiveDate) -> NaiveDateTime {
        self.beginning_of_day(date)
            .checked_add_signed(TimeDelta::days(1) - TimeDelta::seconds(1))
            .unwrap_or(NaiveDateTime::MAX)
    }
}

/// How day names are abbreviated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayNameStyle {
    #[default]
    Full,
    Short,
    Min,
}

const DAYS_FULL: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];
const DAYS_SHORT: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const DAYS_MIN: [&str; 7] = ["S", "M", "T", "W", "T", "F", "S"];

/// Day names starting from `start_of_week` (0 = Sunday).
pub fn days_of_week(style: DayNameStyle, start_of_week: u8) -> Vec<&'static str> {
    let names = match style {
        DayNameStyle::Full => &DAYS_FULL,
        DayNameStyle::Short => &DAYS_SHORT,
        DayNameStyle::Min => &DAYS_MIN,
    };
    let start = usize::from(start_of_week % 7);
    names[start..].iter().chain(&names[..start]).copied().collect()
}
