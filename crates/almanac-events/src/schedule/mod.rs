//! Human-readable schedule strings for single events.
//!
//! A schedule is one of: a single date (all-day), a date and one time
//! (start equals end), a date with a time range, or a range spanning two
//! dates, with or without times. Results are memoized per
//! `(event, before, after, html)` for the lifetime of the formatter.

mod cache;

pub use cache::{ScheduleCache, ScheduleKey};

use almanac_core::{check_strftime, Config, DisplayConfig, FormatOverrides};
use chrono::{DateTime, Datelike, TimeDelta, TimeZone, Timelike};
use chrono_tz::Tz;

use crate::dates::{days_of_week, render, Clock, DayBoundary, DayNameStyle, SystemClock};
use crate::error::ScheduleError;
use crate::event::{Event, EventId};
use crate::store::EventStore;

const START_MARKER: &str = r#"<span class="event-date-start">"#;
const END_DATE_MARKER: &str = r#"<span class="event-date-end">"#;
const END_TIME_MARKER: &str = r#"<span class="event-time">"#;
const MARKER_CLOSE: &str = "</span>";

/// Which parts of a schedule are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSettings {
    pub show_end_time: bool,
    pub show_date: bool,
    pub show_time: bool,
}

impl Default for FormatSettings {
    fn default() -> Self {
        Self {
            show_end_time: true,
            show_date: true,
            show_time: true,
        }
    }
}

impl FormatSettings {
    /// Defaults with every set override applied.
    pub fn resolve(overrides: &FormatOverrides) -> Self {
        let defaults = Self::default();
        Self {
            show_end_time: overrides.show_end_time.unwrap_or(defaults.show_end_time),
            show_date: overrides.date.unwrap_or(defaults.show_date),
            show_time: overrides.time.unwrap_or(defaults.show_time),
        }
        .normalized()
    }

    /// Hidden times also hide the end time.
    pub fn normalized(mut self) -> Self {
        if !self.show_time {
            self.show_end_time = false;
        }
        self
    }
}

/// Formats, separators and day boundaries used for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySettings {
    pub date_with_year_format: String,
    pub date_without_year_format: String,
    pub time_format: String,
    pub datetime_separator: String,
    pub time_range_separator: String,
    pub boundary: DayBoundary,
    pub start_of_week: u8,
    pub site_timezone: Tz,
    pub overrides: FormatOverrides,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        let display = DisplayConfig::default();
        Self {
            date_with_year_format: display.date_with_year_format,
            date_without_year_format: display.date_without_year_format,
            time_format: display.time_format,
            datetime_separator: display.datetime_separator,
            time_range_separator: display.time_range_separator,
            boundary: DayBoundary::default(),
            start_of_week: display.start_of_week,
            site_timezone: Tz::UTC,
            overrides: FormatOverrides::default(),
        }
    }
}

impl DisplaySettings {
    /// Build validated settings from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, ScheduleError> {
        let display = &config.display;
        for format in [
            &display.date_with_year_format,
            &display.date_without_year_format,
            &display.time_format,
        ] {
            check_strftime(format)?;
        }

        Ok(Self {
            date_with_year_format: display.date_with_year_format.clone(),
            date_without_year_format: display.date_without_year_format.clone(),
            time_format: display.time_format.clone(),
            datetime_separator: display.datetime_separator.clone(),
            time_range_separator: display.time_range_separator.clone(),
            boundary: DayBoundary::new(display.multi_day_cutoff()?),
            start_of_week: display.start_of_week,
            site_timezone: display.site_timezone()?,
            overrides: config.schedule.formatting,
        })
    }

    /// Day names in calendar order, starting on the configured first day.
    pub fn days_of_week(&self, style: DayNameStyle) -> Vec<&'static str> {
        days_of_week(style, self.start_of_week)
    }
}

/// Decisions a host can take over from the formatter.
///
/// Every method defaults to passing the formatter's own choice through.
pub trait SchedulePolicy {
    /// Adjust which parts are shown. The end time is still hidden afterwards
    /// when times are hidden.
    fn formatting(&self, _event: &Event, settings: FormatSettings) -> FormatSettings {
        settings
    }

    /// Whether to drop the year from both dates.
    fn use_yearless_format(&self, _event: &Event, default: bool) -> bool {
        default
    }

    /// Date format for the end of a multi-day range.
    fn second_day_format(&self, _event: &Event, format: &str) -> String {
        format.to_string()
    }
}

/// Policy that keeps every default.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPolicy;

impl SchedulePolicy for DefaultPolicy {}

/// Renders and memoizes event schedules for one request.
pub struct ScheduleFormatter {
    settings: DisplaySettings,
    policy: Box<dyn SchedulePolicy>,
    clock: Box<dyn Clock>,
    cache: ScheduleCache,
}

impl ScheduleFormatter {
    pub fn new(settings: DisplaySettings) -> Self {
        Self {
            settings,
            policy: Box::new(DefaultPolicy),
            clock: Box::new(SystemClock),
            cache: ScheduleCache::new(),
        }
    }

    pub fn with_policy(mut self, policy: impl SchedulePolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Continue with an existing memo table.
    pub fn with_cache(mut self, cache: ScheduleCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn settings(&self) -> &DisplaySettings {
        &self.settings
    }

    /// Change display settings. Already cached schedules keep their text.
    pub fn settings_mut(&mut self) -> &mut DisplaySettings {
        &mut self.settings
    }

    pub fn cache(&self) -> &ScheduleCache {
        &self.cache
    }

    pub fn into_cache(self) -> ScheduleCache {
        self.cache
    }

    /// Schedule for the event with `id`, or an empty string when it does not
    /// resolve, cannot be read, or is password protected.
    pub fn schedule_details<S: EventStore + ?Sized>(
        &mut self,
        store: &S,
        id: EventId,
        before: &str,
        after: &str,
        html: bool,
    ) -> String {
        match store.event(id) {
            Ok(Some(event)) => self.format_event(&event, before, after, html),
            Ok(None) => {
                tracing::debug!(event_id = id, "No event to format");
                String::new()
            }
            Err(e) => {
                tracing::warn!(event_id = id, "Failed to load event: {}", e);
                String::new()
            }
        }
    }

    /// Schedule for `event` wrapped in `before` and `after`.
    pub fn format_event(&mut self, event: &Event, before: &str, after: &str, html: bool) -> String {
        if event.password_protected {
            return String::new();
        }

        let key = ScheduleKey::new(event.id, before, after, html);
        if let Some(cached) = self.cache.lookup(&key) {
            tracing::trace!(event_id = event.id, "Schedule cache hit");
            return cached.to_string();
        }

        let schedule = format!("{}{}{}", before, self.render_inner(event, html), after);
        tracing::debug!(event_id = event.id, html, "Rendered schedule");
        self.cache.insert(key, schedule.clone());
        schedule
    }

    /// Unwrapped, uncached schedule text.
    pub fn render_inner(&self, event: &Event, html: bool) -> String {
        let s = &self.settings;
        let FormatSettings {
            show_end_time,
            show_date: date,
            show_time: time,
        } = self
            .policy
            .formatting(event, FormatSettings::resolve(&s.overrides))
            .normalized();

        let current_year = self.clock.now().with_timezone(&s.site_timezone).year();
        let yearless = self
            .policy
            .use_yearless_format(event, event.within_year(current_year));
        let format = if yearless {
            &s.date_without_year_format
        } else {
            &s.date_with_year_format
        };

        let start = &event.start;
        let end = &event.local_end();
        let dt_sep = s.datetime_separator.as_str();
        let range_sep = s.time_range_separator.as_str();

        let mut out = String::new();
        let mut push = |shown: bool, text: &str| {
            if shown {
                out.push_str(text);
            }
        };

        push(html, START_MARKER);

        if event.is_multiday(&s.boundary) {
            let second_format = self.policy.second_day_format(event, format);

            if event.all_day {
                push(date, &render(start, format));
                push(html, MARKER_CLOSE);
                push(date, range_sep);
                push(html, END_DATE_MARKER);
                push(date, &render(&self.effective_end(event), &second_format));
            } else {
                push(date, &render(start, format));
                push(date && time, dt_sep);
                push(time, &render(start, &s.time_format));
                push(html, MARKER_CLOSE);
                push(date || time, range_sep);
                push(html, END_DATE_MARKER);
                push(date, &render(end, &second_format));
                push(date && time, dt_sep);
                push(time, &render(end, &s.time_format));
            }
        } else if event.all_day {
            push(date, &render(start, format));
        } else if start.hour() == end.hour() && start.minute() == end.minute() {
            push(date, &render(start, format));
            push(date && time, dt_sep);
            push(time, &render(start, &s.time_format));
        } else {
            push(date, &render(start, format));
            push(date && time, dt_sep);
            push(time, &render(start, &s.time_format));
            push(html, MARKER_CLOSE);
            push(show_end_time, range_sep);
            push(html, END_TIME_MARKER);
            push(show_end_time, &render(end, &s.time_format));
        }

        push(html, MARKER_CLOSE);
        out
    }

    /// End of an all-day range on the start's wall clock. An end at or
    /// before the start of its day belongs to the previous day.
    fn effective_end(&self, event: &Event) -> DateTime<Tz> {
        let end = event.local_end();
        let beginning = self.settings.boundary.beginning_of_day(end.date_naive());
        if end.naive_local() > beginning {
            return end;
        }

        let tz = end.timezone();
        end.naive_local()
            .checked_sub_signed(TimeDelta::days(1))
            .and_then(|previous| tz.from_local_datetime(&previous).earliest())
            .or_else(|| end.checked_sub_signed(TimeDelta::days(1)))
            .unwrap_or(end)
    }
}
