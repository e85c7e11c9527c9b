//! Book a meeting in the first open slot.

use chrono::{DateTime, Utc};

use crate::availability::AvailabilityResolver;
use crate::config::SchedulingDefaults;
use crate::error::{Result, SlotError};
use crate::event::{Attendee, CalendarEvent, ConferenceData, EventTime, Reminders};
use crate::interval::minutes;
use crate::provider::CalendarProvider;
use crate::query::{Buffers, SlotQuery};

/// Optional knobs for [`schedule_first_available`]. Anything left `None` comes from
/// [`SchedulingDefaults`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleOptions {
    pub time_min: Option<DateTime<Utc>>,
    pub time_max: Option<DateTime<Utc>>,
    pub time_zone: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub buffer_before_minutes: Option<i64>,
    pub buffer_after_minutes: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingRequest {
    pub summary: String,
    pub duration_minutes: i64,
    /// Attendee emails. Each is also queried as a calendar id.
    pub attendees: Vec<String>,
    pub options: ScheduleOptions,
}

impl MeetingRequest {
    pub fn new(summary: impl Into<String>, duration_minutes: i64) -> Self {
        Self {
            summary: summary.into(),
            duration_minutes,
            attendees: Vec::new(),
            options: ScheduleOptions::default(),
        }
    }

    pub fn with_attendees<I, S>(mut self, attendees: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attendees.extend(attendees.into_iter().map(Into::into));
        self
    }

    pub fn with_options(mut self, options: ScheduleOptions) -> Self {
        self.options = options;
        self
    }
}

/// Find the first open slot for `request` and create the event there.
///
/// The window defaults to `[now, now + horizon]`. Each end defaults on its own, so a
/// `time_min` past the horizon with no `time_max` is an inverted window. The event always lasts exactly `duration_minutes`, starting
/// at the beginning of the first slot.
///
/// # Errors
/// - `InvalidInput` / `InvalidTimezone` for a bad request, before the provider is called.
/// - `NoSlotFound` when the window has no slot long enough.
/// - Provider errors from either the free/busy read or event creation.
#[tracing::instrument(skip_all, fields(summary = %request.summary, duration_minutes = request.duration_minutes))]
pub async fn schedule_first_available<P: CalendarProvider>(
    resolver: &AvailabilityResolver<P>,
    request: &MeetingRequest,
    defaults: &SchedulingDefaults,
) -> Result<CalendarEvent> {
    if request.summary.trim().is_empty() {
        return Err(SlotError::InvalidInput("summary is required".to_string()));
    }

    let options = &request.options;
    let time_zone = options
        .time_zone
        .clone()
        .unwrap_or_else(|| defaults.time_zone.clone());
    time_zone
        .parse::<chrono_tz::Tz>()
        .map_err(|_| SlotError::InvalidTimezone(time_zone.clone()))?;

    let now = Utc::now();
    let time_min = options.time_min.unwrap_or(now);
    let time_max = options.time_max.unwrap_or_else(|| {
        now.checked_add_signed(defaults.horizon())
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    });

    let buffers = Buffers::from_minutes(
        options
            .buffer_before_minutes
            .unwrap_or(defaults.buffer_before_minutes),
        options
            .buffer_after_minutes
            .unwrap_or(defaults.buffer_after_minutes),
    )?;

    let query = SlotQuery::new(time_min, time_max, request.duration_minutes)?
        .with_buffers(buffers)
        .with_attendees(request.attendees.iter().cloned());

    let slots = resolver.find_available_slots(&query).await?;
    let Some(slot) = slots.first() else {
        tracing::warn!(
            time_min = %time_min.to_rfc3339(),
            time_max = %time_max.to_rfc3339(),
            "no available time slots found"
        );
        return Err(SlotError::NoSlotFound);
    };

    let start = slot.start;
    let end = start + minutes(request.duration_minutes, "duration")?;

    let draft = CalendarEvent {
        id: None,
        summary: request.summary.clone(),
        description: Some(options.description.clone().unwrap_or_default()),
        location: Some(options.location.clone().unwrap_or_default()),
        start: EventTime {
            date_time: start,
            time_zone: time_zone.clone(),
        },
        end: EventTime {
            date_time: end,
            time_zone,
        },
        attendees: request.attendees.iter().map(Attendee::new).collect(),
        conference_data: Some(ConferenceData::hangouts_meet()),
        reminders: Some(Reminders::use_default()),
        status: None,
        updated: None,
        html_link: None,
        hangout_link: None,
    };

    let event = resolver.provider().create_event(draft).await?;
    tracing::info!(
        event_id = event.id.as_deref().unwrap_or_default(),
        start = %start.to_rfc3339(),
        "scheduled meeting"
    );
    Ok(event)
}
