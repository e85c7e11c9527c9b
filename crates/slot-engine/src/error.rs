//! Error types for slot-engine operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlotError {
    /// Rejected before any provider call (bad duration, inverted window, missing field).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    /// The calendar provider call itself failed (network, auth, quota).
    #[error("Calendar provider failure: {0}")]
    Provider(String),

    /// The provider answered, but reported an error for one of the requested calendars.
    #[error("Calendar '{calendar_id}' unavailable: {reason}")]
    CalendarUnavailable { calendar_id: String, reason: String },

    #[error("No available time slots found")]
    NoSlotFound,

    #[error("Event '{0}' not found")]
    EventNotFound(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl SlotError {
    /// Whether the caller supplied bad input, as opposed to a downstream failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SlotError::InvalidInput(_) | SlotError::InvalidTimestamp(_) | SlotError::InvalidTimezone(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SlotError>;
