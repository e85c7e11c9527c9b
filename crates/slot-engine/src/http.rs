//! Caller-facing request and response shapes.
//!
//! These mirror what an HTTP layer hands over: query-string values arrive as strings,
//! JSON bodies arrive loosely typed. Parsing them here keeps every rejection a
//! `SlotError::InvalidInput` raised before the provider is contacted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SchedulingDefaults;
use crate::error::{Result, SlotError};
use crate::event::{EventListOptions, EventOrder};
use crate::interval::{parse_timestamp, TimeInterval};
use crate::query::SlotQuery;
use crate::scheduler::{MeetingRequest, ScheduleOptions};

/// Query parameters of an availability lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityParams {
    pub time_min: Option<String>,
    pub time_max: Option<String>,
    pub duration: Option<String>,
    /// Comma-separated attendee calendar ids.
    pub attendees: Option<String>,
}

impl AvailabilityParams {
    /// Validate and convert into a [`SlotQuery`] using the default buffers.
    pub fn into_query(self, defaults: &SchedulingDefaults) -> Result<SlotQuery> {
        let (Some(time_min), Some(time_max), Some(duration)) =
            (self.time_min, self.time_max, self.duration)
        else {
            return Err(SlotError::InvalidInput(
                "timeMin, timeMax, and duration are required query parameters".to_string(),
            ));
        };

        let query = SlotQuery::new(
            parse_timestamp(&time_min)?,
            parse_timestamp(&time_max)?,
            parse_minutes(&duration)?,
        )?
        .with_buffers(defaults.buffers()?)
        .with_attendees(split_ids(self.attendees.as_deref()));
        Ok(query)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub available_slots: Vec<TimeInterval>,
}

impl From<Vec<TimeInterval>> for AvailabilityResponse {
    fn from(available_slots: Vec<TimeInterval>) -> Self {
        Self { available_slots }
    }
}

/// Query parameters of a raw free/busy lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeBusyParams {
    pub time_min: Option<String>,
    pub time_max: Option<String>,
    /// Comma-separated calendar ids. Empty means the primary calendar.
    pub calendar_ids: Option<String>,
}

impl FreeBusyParams {
    pub fn parse(&self) -> Result<(DateTime<Utc>, DateTime<Utc>, Vec<String>)> {
        let (Some(time_min), Some(time_max)) = (&self.time_min, &self.time_max) else {
            return Err(SlotError::InvalidInput(
                "timeMin and timeMax are required query parameters".to_string(),
            ));
        };
        Ok((
            parse_timestamp(time_min)?,
            parse_timestamp(time_max)?,
            split_ids(self.calendar_ids.as_deref()),
        ))
    }
}

/// Query parameters of an event listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsParams {
    pub time_min: Option<String>,
    pub time_max: Option<String>,
    /// Defaults to 50.
    pub max_results: Option<String>,
    /// `startTime` (default) or `updated`.
    pub order_by: Option<String>,
}

impl EventsParams {
    pub fn parse(&self) -> Result<(DateTime<Utc>, DateTime<Utc>, EventListOptions)> {
        let (Some(time_min), Some(time_max)) = (&self.time_min, &self.time_max) else {
            return Err(SlotError::InvalidInput(
                "timeMin and timeMax are required query parameters".to_string(),
            ));
        };

        let mut options = EventListOptions::default();
        if let Some(raw) = &self.max_results {
            options.max_results = raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    SlotError::InvalidInput(format!("maxResults '{}' is not a positive integer", raw))
                })?;
        }
        if let Some(raw) = &self.order_by {
            options.order_by = match raw.as_str() {
                "startTime" => EventOrder::StartTime,
                "updated" => EventOrder::Updated,
                other => {
                    return Err(SlotError::InvalidInput(format!(
                        "orderBy must be 'startTime' or 'updated', got '{}'",
                        other
                    )))
                }
            };
        }

        Ok((parse_timestamp(time_min)?, parse_timestamp(time_max)?, options))
    }
}

/// Answer of a calendar time zone lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimezoneResponse {
    pub timezone: String,
}

/// Either a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MinutesField {
    Number(i64),
    Text(String),
}

impl MinutesField {
    pub fn minutes(&self) -> Result<i64> {
        match self {
            MinutesField::Number(n) => Ok(*n),
            MinutesField::Text(raw) => parse_minutes(raw),
        }
    }
}

/// JSON body of a schedule-meeting call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleMeetingRequest {
    pub summary: Option<String>,
    pub duration: Option<MinutesField>,
    #[serde(default)]
    pub attendees: Vec<String>,
    pub time_min: Option<String>,
    pub time_max: Option<String>,
    pub time_zone: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
}

impl ScheduleMeetingRequest {
    pub fn into_meeting(self) -> Result<MeetingRequest> {
        let summary = self.summary.filter(|s| !s.trim().is_empty());
        let (Some(summary), Some(duration)) = (summary, self.duration) else {
            return Err(SlotError::InvalidInput(
                "summary and duration are required fields".to_string(),
            ));
        };
        let duration_minutes = duration.minutes()?;
        if duration_minutes <= 0 {
            return Err(SlotError::InvalidInput(format!(
                "duration must be a positive number of minutes, got {}",
                duration_minutes
            )));
        }

        let options = ScheduleOptions {
            time_min: self.time_min.as_deref().map(parse_timestamp).transpose()?,
            time_max: self.time_max.as_deref().map(parse_timestamp).transpose()?,
            time_zone: self.time_zone,
            description: self.description,
            location: self.location,
            buffer_before_minutes: None,
            buffer_after_minutes: None,
        };

        Ok(MeetingRequest::new(summary, duration_minutes)
            .with_attendees(self.attendees)
            .with_options(options))
    }
}

fn parse_minutes(raw: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| SlotError::InvalidInput(format!("duration '{}' is not a whole number of minutes", raw)))
}

/// Split a comma-separated id list, trimming and dropping empty entries.
pub fn split_ids(raw: Option<&str>) -> Vec<String> {
    raw.map(|list| {
        list.split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}
