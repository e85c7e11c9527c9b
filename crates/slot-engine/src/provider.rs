//! The calendar provider seam.
//!
//! The resolver never talks to a calendar service directly. It is handed something that
//! implements [`CalendarProvider`]: a real API client in production, or the
//! [`InMemoryProvider`] for fixtures and tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Result, SlotError};
use crate::event::{CalendarEvent, EventListOptions, EventOrder, EventPatch};
use crate::freebusy::{CalendarBusy, CalendarFault, FreeBusyResponse};
use crate::interval::TimeInterval;

/// Calendar id that stands for the authenticated user's own calendar.
pub const PRIMARY_CALENDAR: &str = "primary";

const CANCELLED: &str = "cancelled";

#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Busy intervals for each of `calendar_ids` between `time_min` and `time_max`.
    async fn get_free_busy(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        calendar_ids: &[String],
    ) -> Result<FreeBusyResponse>;

    /// Create an event on the primary calendar and return it as stored.
    async fn create_event(&self, draft: CalendarEvent) -> Result<CalendarEvent>;

    /// Look up one event on the primary calendar. `None` when no event has that id.
    async fn get_event(&self, event_id: &str) -> Result<Option<CalendarEvent>>;

    /// Events on the primary calendar that overlap `[time_min, time_max)`.
    async fn list_events(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        options: &EventListOptions,
    ) -> Result<Vec<CalendarEvent>>;

    /// Apply `patch` to an existing event and return it as stored.
    async fn update_event(&self, event_id: &str, patch: EventPatch) -> Result<CalendarEvent>;

    /// Remove an event. Its time stops counting as busy.
    async fn delete_event(&self, event_id: &str) -> Result<()>;

    /// IANA time zone of the primary calendar.
    async fn calendar_time_zone(&self) -> Result<String>;
}

#[async_trait]
impl<P: CalendarProvider + ?Sized> CalendarProvider for Arc<P> {
    async fn get_free_busy(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        calendar_ids: &[String],
    ) -> Result<FreeBusyResponse> {
        (**self).get_free_busy(time_min, time_max, calendar_ids).await
    }

    async fn create_event(&self, draft: CalendarEvent) -> Result<CalendarEvent> {
        (**self).create_event(draft).await
    }

    async fn get_event(&self, event_id: &str) -> Result<Option<CalendarEvent>> {
        (**self).get_event(event_id).await
    }

    async fn list_events(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        options: &EventListOptions,
    ) -> Result<Vec<CalendarEvent>> {
        (**self).list_events(time_min, time_max, options).await
    }

    async fn update_event(&self, event_id: &str, patch: EventPatch) -> Result<CalendarEvent> {
        (**self).update_event(event_id, patch).await
    }

    async fn delete_event(&self, event_id: &str) -> Result<()> {
        (**self).delete_event(event_id).await
    }

    async fn calendar_time_zone(&self) -> Result<String> {
        (**self).calendar_time_zone().await
    }
}

/// On-disk form of an [`InMemoryProvider`]: a recorded free/busy answer, optionally
/// extended with stored events and the primary calendar's time zone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderFixture {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time_min: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time_max: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time_zone: Option<String>,
    #[serde(default)]
    calendars: BTreeMap<String, CalendarBusy>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    events: Vec<CalendarEvent>,
}

/// A provider backed by fixture data held in memory.
///
/// Free/busy answers include every stored interval that overlaps the requested range,
/// unclipped. Unknown calendars answer with a `notFound` error. The primary calendar's
/// busy time is its fixture busy list plus the span of every stored event, so deleting
/// or moving an event frees or moves its busy time.
#[derive(Debug)]
pub struct InMemoryProvider {
    primary_calendar_id: String,
    state: RwLock<ProviderState>,
}

#[derive(Debug)]
struct ProviderState {
    recorded: Option<(DateTime<Utc>, DateTime<Utc>)>,
    time_zone: String,
    calendars: BTreeMap<String, CalendarBusy>,
    events: Vec<CalendarEvent>,
}

impl InMemoryProvider {
    /// An empty provider with a primary calendar that has no busy time.
    pub fn new() -> Self {
        let mut calendars = BTreeMap::new();
        calendars.insert(PRIMARY_CALENDAR.to_string(), CalendarBusy::default());
        Self {
            primary_calendar_id: PRIMARY_CALENDAR.to_string(),
            state: RwLock::new(ProviderState {
                recorded: None,
                time_zone: "UTC".to_string(),
                calendars,
                events: Vec::new(),
            }),
        }
    }

    /// Seed from a recorded free/busy response. Per-calendar errors are replayed as-is.
    pub fn from_response(response: FreeBusyResponse) -> Self {
        let mut provider = Self::new();
        let state = provider.state.get_mut();
        state.recorded = Some((response.time_min, response.time_max));
        state.calendars.extend(response.calendars);
        provider
    }

    /// Seed from a JSON fixture: a free/busy response, optionally carrying `events` and
    /// `timeZone`. Fixture events without an id are given one.
    ///
    /// Busy data is replayed untouched; malformed intervals surface when a caller reads
    /// them back through [`FreeBusyResponse::into_busy_index`].
    pub fn from_json(json: &str) -> Result<Self> {
        let fixture: ProviderFixture = serde_json::from_str(json)?;
        let mut provider = Self::new();
        let state = provider.state.get_mut();
        state.recorded = fixture.time_min.zip(fixture.time_max);
        state.calendars.extend(fixture.calendars);
        if let Some(time_zone) = fixture.time_zone {
            state.time_zone = validate_time_zone(time_zone)?;
        }
        for mut event in fixture.events {
            check_span(&event)?;
            if event.id.is_none() {
                event.id = Some(new_event_id());
            }
            state.events.push(event);
        }
        Ok(provider)
    }

    /// Serialize the provider back into the fixture form [`Self::from_json`] reads.
    pub async fn to_fixture_json(&self) -> Result<String> {
        let state = self.state.read().await;
        let fixture = ProviderFixture {
            time_min: state.recorded.map(|(min, _)| min),
            time_max: state.recorded.map(|(_, max)| max),
            time_zone: Some(state.time_zone.clone()),
            calendars: state.calendars.clone(),
            events: state.events.clone(),
        };
        Ok(serde_json::to_string_pretty(&fixture)?)
    }

    /// Name the calendar that created events land on. Defaults to `primary`.
    pub fn with_primary_calendar(mut self, calendar_id: impl Into<String>) -> Self {
        let calendar_id = calendar_id.into();
        self.state
            .get_mut()
            .calendars
            .entry(calendar_id.clone())
            .or_default();
        self.primary_calendar_id = calendar_id;
        self
    }

    /// Set the primary calendar's time zone. Defaults to `UTC`.
    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Result<Self> {
        self.state.get_mut().time_zone = validate_time_zone(time_zone.into())?;
        Ok(self)
    }

    /// Append busy intervals to a calendar, creating it if needed.
    pub fn with_busy(
        mut self,
        calendar_id: impl Into<String>,
        intervals: impl IntoIterator<Item = TimeInterval>,
    ) -> Self {
        self.state
            .get_mut()
            .calendars
            .entry(calendar_id.into())
            .or_default()
            .busy
            .extend(intervals);
        self
    }

    /// Make a calendar answer with the given error reason.
    pub fn with_fault(mut self, calendar_id: impl Into<String>, reason: impl Into<String>) -> Self {
        self.state
            .get_mut()
            .calendars
            .entry(calendar_id.into())
            .or_default()
            .errors
            .push(CalendarFault {
                domain: "global".to_string(),
                reason: reason.into(),
            });
        self
    }

    /// Events currently stored, in creation order.
    pub async fn created_events(&self) -> Vec<CalendarEvent> {
        self.state.read().await.events.clone()
    }
}

impl Default for InMemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderState {
    fn busy_for(&self, calendar_id: &str, primary: &str, range: &TimeInterval) -> CalendarBusy {
        let Some(calendar) = self.calendars.get(calendar_id) else {
            return CalendarBusy {
                busy: Vec::new(),
                errors: vec![CalendarFault::not_found()],
            };
        };

        let mut busy: Vec<TimeInterval> = calendar
            .busy
            .iter()
            .filter(|b| b.overlaps(range))
            .copied()
            .collect();
        if calendar_id == primary {
            busy.extend(
                self.events
                    .iter()
                    .filter(|e| e.status.as_deref() != Some(CANCELLED))
                    .map(CalendarEvent::interval)
                    .filter(|span| span.overlaps(range)),
            );
        }

        CalendarBusy {
            busy,
            errors: calendar.errors.clone(),
        }
    }

    fn event_mut(&mut self, event_id: &str) -> Result<&mut CalendarEvent> {
        self.events
            .iter_mut()
            .find(|e| e.id.as_deref() == Some(event_id))
            .ok_or_else(|| SlotError::EventNotFound(event_id.to_string()))
    }
}

fn new_event_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn check_span(event: &CalendarEvent) -> Result<()> {
    let span = event.interval();
    if span.start >= span.end {
        return Err(SlotError::Provider(format!(
            "event '{}' must end after it starts",
            event.summary
        )));
    }
    Ok(())
}

fn validate_time_zone(time_zone: String) -> Result<String> {
    time_zone
        .parse::<chrono_tz::Tz>()
        .map_err(|_| SlotError::InvalidTimezone(time_zone.clone()))?;
    Ok(time_zone)
}

#[async_trait]
impl CalendarProvider for InMemoryProvider {
    async fn get_free_busy(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        calendar_ids: &[String],
    ) -> Result<FreeBusyResponse> {
        let range = TimeInterval {
            start: time_min,
            end: time_max,
        };
        let state = self.state.read().await;
        let calendars = calendar_ids
            .iter()
            .map(|id| {
                let answer = state.busy_for(id, &self.primary_calendar_id, &range);
                (id.clone(), answer)
            })
            .collect();

        Ok(FreeBusyResponse {
            time_min,
            time_max,
            calendars,
        })
    }

    async fn create_event(&self, draft: CalendarEvent) -> Result<CalendarEvent> {
        check_span(&draft)?;

        let mut event = draft;
        event.id = Some(new_event_id());
        event.status = Some("confirmed".to_string());
        event.updated = Some(Utc::now());

        self.state.write().await.events.push(event.clone());
        Ok(event)
    }

    async fn get_event(&self, event_id: &str) -> Result<Option<CalendarEvent>> {
        let state = self.state.read().await;
        Ok(state
            .events
            .iter()
            .find(|e| e.id.as_deref() == Some(event_id))
            .cloned())
    }

    async fn list_events(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        options: &EventListOptions,
    ) -> Result<Vec<CalendarEvent>> {
        if time_min > time_max {
            return Err(SlotError::InvalidInput(
                "timeMin must not be after timeMax".to_string(),
            ));
        }
        if options.max_results == 0 {
            return Err(SlotError::InvalidInput(
                "maxResults must be at least 1".to_string(),
            ));
        }

        let range = TimeInterval {
            start: time_min,
            end: time_max,
        };
        let state = self.state.read().await;
        let mut events: Vec<CalendarEvent> = state
            .events
            .iter()
            .filter(|e| e.status.as_deref() != Some(CANCELLED))
            .filter(|e| e.interval().overlaps(&range))
            .cloned()
            .collect();
        match options.order_by {
            EventOrder::StartTime => events.sort_by_key(|e| e.start.date_time),
            EventOrder::Updated => events.sort_by_key(|e| e.updated),
        }
        events.truncate(options.max_results);
        Ok(events)
    }

    async fn update_event(&self, event_id: &str, patch: EventPatch) -> Result<CalendarEvent> {
        let mut state = self.state.write().await;
        let stored = state.event_mut(event_id)?;

        let mut updated = stored.clone();
        updated.apply(patch);
        let span = updated.interval();
        if span.start >= span.end {
            return Err(SlotError::InvalidInput(format!(
                "event '{}' must end after it starts",
                event_id
            )));
        }
        updated.updated = Some(Utc::now());

        *stored = updated.clone();
        Ok(updated)
    }

    async fn delete_event(&self, event_id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let before = state.events.len();
        state.events.retain(|e| e.id.as_deref() != Some(event_id));
        if state.events.len() == before {
            return Err(SlotError::EventNotFound(event_id.to_string()));
        }
        Ok(())
    }

    async fn calendar_time_zone(&self) -> Result<String> {
        Ok(self.state.read().await.time_zone.clone())
    }
}
