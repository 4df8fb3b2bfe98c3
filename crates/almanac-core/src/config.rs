use anyhow::{Context, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// Date/time display settings
    #[serde(default)]
    pub display: DisplayConfig,

    /// Schedule rendering settings
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// Date/time display settings used by every rendered schedule.
///
/// Formats use chrono's strftime syntax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Date format used when the year must be shown
    pub date_with_year_format: String,

    /// Date format used when the year can be omitted
    pub date_without_year_format: String,

    /// Time of day format
    pub time_format: String,

    /// Placed between a date and its time
    pub datetime_separator: String,

    /// Placed between the start and end of a range
    pub time_range_separator: String,

    /// Time of day (HH:MM) at which a new calendar day begins for multi-day checks
    pub multi_day_cutoff: String,

    /// First day of the week, 0 = Sunday through 6 = Saturday
    pub start_of_week: u8,

    /// IANA timezone name used for "today" and the known date range
    pub timezone: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            date_with_year_format: "%B %-d, %Y".to_string(),
            date_without_year_format: "%B %-d".to_string(),
            time_format: "%-I:%M%P".to_string(),
            datetime_separator: " @ ".to_string(),
            time_range_separator: " - ".to_string(),
            multi_day_cutoff: "00:00".to_string(),
            start_of_week: 0,
            timezone: "UTC".to_string(),
        }
    }
}

impl DisplayConfig {
    /// Parse the multi-day cutoff into a time of day.
    pub fn multi_day_cutoff(&self) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(self.multi_day_cutoff.trim(), "%H:%M")
            .map_err(|_| ConfigError::InvalidCutoff(self.multi_day_cutoff.clone()))
    }

    /// Parse the configured site timezone.
    pub fn site_timezone(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::UnknownTimezone(self.timezone.clone()))
    }
}

/// Overrides applied on top of the default schedule formatting settings.
///
/// Unset fields keep the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_end_time: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default)]
    pub formatting: FormatOverrides,
}

/// Check that a strftime format string contains no unknown specifiers.
pub fn check_strftime(format: &str) -> Result<(), ConfigError> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(ConfigError::InvalidFormat(format.to_string()));
    }
    Ok(())
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("almanac");

        Self {
            config_dir,
            display: DisplayConfig::default(),
            schedule: ScheduleConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, creating default if it doesn't exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();
        let display = &self.display;

        for (field, format) in [
            ("display.date_with_year_format", &display.date_with_year_format),
            (
                "display.date_without_year_format",
                &display.date_without_year_format,
            ),
            ("display.time_format", &display.time_format),
        ] {
            if format.trim().is_empty() {
                result.add_error(field, "Format must not be empty");
            } else if let Err(e) = check_strftime(format) {
                result.add_error(field, e.to_string());
            }
        }

        if !display.date_with_year_format.contains("%Y")
            && !display.date_with_year_format.contains("%y")
        {
            result.add_warning(
                "display.date_with_year_format",
                "Format with year does not contain a year specifier",
            );
        }

        if let Err(e) = display.multi_day_cutoff() {
            result.add_error("display.multi_day_cutoff", e.to_string());
        }

        if display.start_of_week > 6 {
            result.add_error(
                "display.start_of_week",
                "Start of week must be between 0 (Sunday) and 6 (Saturday)",
            );
        }

        if let Err(e) = display.site_timezone() {
            result.add_error("display.timezone", e.to_string());
        }

        if self.schedule.formatting.time == Some(false)
            && self.schedule.formatting.show_end_time == Some(true)
        {
            result.add_warning(
                "schedule.formatting.show_end_time",
                "End time is never shown when times are hidden",
            );
        }

        result
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Ensure config directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("almanac");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_invalid_format_specifier() {
        let mut config = Config::default();
        config.display.time_format = "%Q".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "display.time_format"));
    }

    #[test]
    fn test_empty_format_is_error() {
        let mut config = Config::default();
        config.display.date_without_year_format = "  ".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
    }

    #[test]
    fn test_invalid_cutoff() {
        let mut config = Config::default();
        config.display.multi_day_cutoff = "25:00".to_string();
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "display.multi_day_cutoff"));
    }

    #[test]
    fn test_cutoff_parses() {
        let mut display = DisplayConfig::default();
        display.multi_day_cutoff = "04:30".to_string();
        assert_eq!(
            display.multi_day_cutoff().unwrap(),
            NaiveTime::from_hms_opt(4, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_unknown_timezone() {
        let mut config = Config::default();
        config.display.timezone = "Mars/Olympus_Mons".to_string();
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "display.timezone"));
    }

    #[test]
    fn test_start_of_week_range() {
        let mut config = Config::default();
        config.display.start_of_week = 7;
        assert!(!config.validate().is_valid());
    }

    #[test]
    fn test_hidden_time_with_end_time_is_warning() {
        let mut config = Config::default();
        config.schedule.formatting.time = Some(false);
        config.schedule.formatting.show_end_time = Some(true);
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result
            .warnings
            .iter()
            .any(|w| w.field == "schedule.formatting.show_end_time"));
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: Config = toml::from_str(r#"config_dir = "/tmp/almanac""#).unwrap();
        assert_eq!(config.display, DisplayConfig::default());
        assert_eq!(config.schedule.formatting, FormatOverrides::default());
    }

    #[test]
    fn test_partial_overrides() {
        let config: Config = toml::from_str(
            r#"
            config_dir = "/tmp/almanac"

            [display]
            timezone = "Europe/Berlin"

            [schedule.formatting]
            show_end_time = false
            "#,
        )
        .unwrap();
        assert_eq!(config.display.timezone, "Europe/Berlin");
        assert_eq!(config.display.datetime_separator, " @ ");
        assert_eq!(config.schedule.formatting.show_end_time, Some(false));
        assert_eq!(config.schedule.formatting.time, None);
    }

    #[test]
    fn test_load_creates_default_then_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let created = Config::load_from(&path).unwrap();
        assert!(path.exists());

        let mut changed = created.clone();
        changed.display.time_range_separator = " to ".to_string();
        changed.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.display.time_range_separator, " to ");
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }
}
