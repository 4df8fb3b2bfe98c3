//! Error types for event lookup, date handling and storage.

use almanac_core::{ConfigError, DatabaseError, RusqliteErrorExt};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Invalid display settings: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid date value: {0}")]
    InvalidDate(String),

    #[error("Invalid stored event {id}: {reason}")]
    InvalidEvent { id: u64, reason: String },

    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),
}

impl From<rusqlite::Error> for ScheduleError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(err.into_database_error())
    }
}

impl ScheduleError {
    /// User-friendly error message for display.
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(e) => e.user_message().to_string(),
            Self::InvalidDate(value) => format!("Not a valid date: {}", value),
            Self::InvalidEvent { id, .. } => format!("Event {} has unreadable dates", id),
            Self::Storage(e) => e.user_message().to_string(),
        }
    }
}
