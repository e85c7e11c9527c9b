//! Scheduling defaults, optionally loaded from a TOML file.
//!
//! ```toml
//! buffer_before_minutes = 10
//! buffer_after_minutes = 5
//! horizon_days = 14
//! time_zone = "Europe/Berlin"
//! ```
//!
//! Missing keys fall back to the built-in defaults.

use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlotError};
use crate::provider::PRIMARY_CALENDAR;
use crate::query::Buffers;

pub const DEFAULT_BUFFER_MINUTES: i64 = 15;
pub const DEFAULT_HORIZON_DAYS: i64 = 7;
pub const DEFAULT_TIME_ZONE: &str = "UTC";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingDefaults {
    pub buffer_before_minutes: i64,
    pub buffer_after_minutes: i64,
    /// How far past the window start to look when no end is given.
    pub horizon_days: i64,
    pub time_zone: String,
    pub primary_calendar_id: String,
}

impl Default for SchedulingDefaults {
    fn default() -> Self {
        Self {
            buffer_before_minutes: DEFAULT_BUFFER_MINUTES,
            buffer_after_minutes: DEFAULT_BUFFER_MINUTES,
            horizon_days: DEFAULT_HORIZON_DAYS,
            time_zone: DEFAULT_TIME_ZONE.to_string(),
            primary_calendar_id: PRIMARY_CALENDAR.to_string(),
        }
    }
}

impl SchedulingDefaults {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let defaults: Self = toml::from_str(raw).map_err(|e| SlotError::Config(e.to_string()))?;
        defaults.validate()?;
        Ok(defaults)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| SlotError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        self.buffers()?;
        if self.horizon_days <= 0 {
            return Err(SlotError::Config(format!(
                "horizon_days must be positive, got {}",
                self.horizon_days
            )));
        }
        Duration::try_days(self.horizon_days).ok_or_else(|| {
            SlotError::Config(format!("horizon_days {} is out of range", self.horizon_days))
        })?;
        if self.time_zone.parse::<chrono_tz::Tz>().is_err() {
            return Err(SlotError::InvalidTimezone(self.time_zone.clone()));
        }
        if self.primary_calendar_id.trim().is_empty() {
            return Err(SlotError::Config("primary_calendar_id must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn buffers(&self) -> Result<Buffers> {
        Buffers::from_minutes(self.buffer_before_minutes, self.buffer_after_minutes)
    }

    /// The default lookahead. Falls back to the built-in horizon if the configured one
    /// cannot be represented.
    pub fn horizon(&self) -> Duration {
        Duration::try_days(self.horizon_days).unwrap_or_else(|| Duration::days(DEFAULT_HORIZON_DAYS))
    }
}
