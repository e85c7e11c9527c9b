//! Availability resolution across the primary calendar and any attendee calendars.
//!
//! The resolver makes exactly one provider read per call, then hands the flattened busy
//! intervals to the sweep in [`crate::freebusy`]. It keeps no state between calls.

use chrono::{DateTime, Utc};

use crate::error::{Result, SlotError};
use crate::freebusy::{self, BusyIndex, FreeBusyResponse};
use crate::interval::TimeInterval;
use crate::provider::{CalendarProvider, PRIMARY_CALENDAR};
use crate::query::{Buffers, SlotQuery};

pub struct AvailabilityResolver<P> {
    provider: P,
    primary_calendar_id: String,
}

impl<P: CalendarProvider> AvailabilityResolver<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            primary_calendar_id: PRIMARY_CALENDAR.to_string(),
        }
    }

    /// Use a calendar other than `primary` as the implicit organizer calendar.
    pub fn with_primary_calendar(mut self, calendar_id: impl Into<String>) -> Self {
        self.primary_calendar_id = calendar_id.into();
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn primary_calendar_id(&self) -> &str {
        &self.primary_calendar_id
    }

    /// Raw free/busy data for `calendar_ids`, or for the primary calendar alone if none
    /// are given.
    pub async fn free_busy(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        calendar_ids: &[String],
    ) -> Result<FreeBusyResponse> {
        if time_min > time_max {
            return Err(SlotError::InvalidInput(format!(
                "timeMin {} is after timeMax {}",
                time_min.to_rfc3339(),
                time_max.to_rfc3339()
            )));
        }
        let ids = if calendar_ids.is_empty() {
            vec![self.primary_calendar_id.clone()]
        } else {
            calendar_ids.to_vec()
        };
        self.provider.get_free_busy(time_min, time_max, &ids).await
    }

    /// Busy intervals for the primary calendar plus every attendee in `query`.
    pub async fn fetch_busy(&self, query: &SlotQuery) -> Result<BusyIndex> {
        let ids = query.calendar_ids(&self.primary_calendar_id);
        let response = self
            .provider
            .get_free_busy(query.window_start(), query.window_end(), &ids)
            .await?;
        response.into_busy_index()
    }

    /// Open slots in the query window long enough for the query's duration.
    ///
    /// # Errors
    /// Provider failures and per-calendar errors are returned as-is. An empty `Vec` is a
    /// valid answer, not an error.
    #[tracing::instrument(
        skip(self, query),
        fields(
            duration_minutes = query.duration_minutes(),
            attendees = query.attendee_calendar_ids().len(),
        )
    )]
    pub async fn find_available_slots(&self, query: &SlotQuery) -> Result<Vec<TimeInterval>> {
        let index = self.fetch_busy(query).await?;
        let busy = freebusy::flatten_busy(&index);
        tracing::debug!(calendars = index.len(), busy = busy.len(), "fetched busy intervals");

        let slots = freebusy::find_open_slots(&busy, query);
        tracing::debug!(slots = slots.len(), "computed open slots");
        Ok(slots)
    }

    /// Positional form of [`Self::find_available_slots`].
    ///
    /// Input is validated before the provider is called.
    pub async fn find_slots(
        &self,
        duration_minutes: i64,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        attendee_ids: &[String],
        buffer_before_minutes: i64,
        buffer_after_minutes: i64,
    ) -> Result<Vec<TimeInterval>> {
        let query = SlotQuery::new(window_start, window_end, duration_minutes)?
            .with_buffers(Buffers::from_minutes(buffer_before_minutes, buffer_after_minutes)?)
            .with_attendees(attendee_ids.iter().cloned());
        self.find_available_slots(&query).await
    }
}
