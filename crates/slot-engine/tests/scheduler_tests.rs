//! Tests for booking the first available slot.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use slot_engine::event::HANGOUTS_MEET;
use slot_engine::{
    schedule_first_available, AvailabilityResolver, InMemoryProvider, MeetingRequest,
    ScheduleOptions, SchedulingDefaults, SlotError, TimeInterval,
};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn at(hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 16, hour, min, 0).unwrap()
}

fn span(start: (u32, u32), end: (u32, u32)) -> TimeInterval {
    TimeInterval::new(at(start.0, start.1), at(end.0, end.1)).unwrap()
}

fn workday() -> ScheduleOptions {
    ScheduleOptions {
        time_min: Some(at(9, 0)),
        time_max: Some(at(17, 0)),
        ..ScheduleOptions::default()
    }
}

// ── Happy path ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn books_first_slot_with_default_buffers() {
    let provider = InMemoryProvider::new()
        .with_busy("primary", [span((9, 0), (10, 0))])
        .with_busy("alice@example.com", Vec::<TimeInterval>::new());
    let resolver = AvailabilityResolver::new(provider);
    let request = MeetingRequest::new("Design review", 30)
        .with_attendees(["alice@example.com"])
        .with_options(workday());

    let event = schedule_first_available(&resolver, &request, &SchedulingDefaults::default())
        .await
        .unwrap();

    // Default 15 minute trailing buffer after 10:00.
    assert_eq!(event.start.date_time, at(10, 15));
    assert_eq!(event.end.date_time, at(10, 45));
    assert_eq!(event.start.time_zone, "UTC");
    assert_eq!(event.summary, "Design review");
    assert_eq!(event.description.as_deref(), Some(""));
    assert_eq!(event.attendees.len(), 1);
    assert_eq!(event.attendees[0].email, "alice@example.com");
    assert!(event.id.is_some());
    assert_eq!(event.status.as_deref(), Some("confirmed"));

    let conference = event.conference_data.as_ref().unwrap();
    let create = conference.create_request.as_ref().unwrap();
    assert_eq!(create.conference_solution_key.kind, HANGOUTS_MEET);
    assert!(!create.request_id.is_empty());
    assert!(event.reminders.as_ref().unwrap().use_default);
}

#[tokio::test]
async fn unknown_attendee_calendar_books_nothing() {
    let provider = Arc::new(InMemoryProvider::new());
    let resolver = AvailabilityResolver::new(Arc::clone(&provider));
    let request = MeetingRequest::new("Design review", 30)
        .with_attendees(["ghost@example.com"])
        .with_options(workday());

    let err = schedule_first_available(&resolver, &request, &SchedulingDefaults::default())
        .await
        .unwrap_err();

    assert!(matches!(err, SlotError::CalendarUnavailable { .. }));
    assert!(provider.created_events().await.is_empty());
}

#[tokio::test]
async fn event_lasts_exactly_the_duration_not_the_slot() {
    let resolver = AvailabilityResolver::new(InMemoryProvider::new());
    let request = MeetingRequest::new("1:1", 45).with_options(workday());

    let event = schedule_first_available(&resolver, &request, &SchedulingDefaults::default())
        .await
        .unwrap();

    assert_eq!(event.start.date_time, at(9, 0));
    assert_eq!(event.end.date_time - event.start.date_time, Duration::minutes(45));
}

#[tokio::test]
async fn created_event_blocks_the_next_booking() {
    let provider = Arc::new(InMemoryProvider::new());
    let resolver = AvailabilityResolver::new(Arc::clone(&provider));
    let request = MeetingRequest::new("Standup", 30).with_options(workday());
    let defaults = SchedulingDefaults::default();

    let first = schedule_first_available(&resolver, &request, &defaults).await.unwrap();
    let second = schedule_first_available(&resolver, &request, &defaults).await.unwrap();

    assert_eq!(first.start.date_time, at(9, 0));
    // 09:00-09:30 plus a 15 minute trailing buffer.
    assert_eq!(second.start.date_time, at(9, 45));
    assert!(!first.interval().overlaps(&second.interval()));
    assert_eq!(provider.created_events().await.len(), 2);
}

#[tokio::test]
async fn options_override_buffers_and_event_details() {
    let resolver = AvailabilityResolver::new(
        InMemoryProvider::new().with_busy("primary", [span((9, 0), (10, 0))]),
    );
    let request = MeetingRequest::new("Planning", 60).with_options(ScheduleOptions {
        time_zone: Some("America/New_York".to_string()),
        description: Some("Quarterly planning".to_string()),
        location: Some("Room 4".to_string()),
        buffer_before_minutes: Some(0),
        buffer_after_minutes: Some(0),
        ..workday()
    });

    let event = schedule_first_available(&resolver, &request, &SchedulingDefaults::default())
        .await
        .unwrap();

    assert_eq!(event.start.date_time, at(10, 0));
    assert_eq!(event.start.time_zone, "America/New_York");
    assert_eq!(event.description.as_deref(), Some("Quarterly planning"));
    assert_eq!(event.location.as_deref(), Some("Room 4"));
}

#[tokio::test]
async fn config_defaults_supply_buffers() {
    let resolver = AvailabilityResolver::new(
        InMemoryProvider::new().with_busy("primary", [span((9, 0), (10, 0))]),
    );
    let defaults = SchedulingDefaults {
        buffer_after_minutes: 30,
        ..SchedulingDefaults::default()
    };
    let request = MeetingRequest::new("Sync", 30).with_options(workday());

    let event = schedule_first_available(&resolver, &request, &defaults).await.unwrap();
    assert_eq!(event.start.date_time, at(10, 30));
}

#[tokio::test]
async fn default_window_starts_now() {
    let resolver = AvailabilityResolver::new(InMemoryProvider::new());
    let before = Utc::now();

    let event = schedule_first_available(
        &resolver,
        &MeetingRequest::new("Soon", 30),
        &SchedulingDefaults::default(),
    )
    .await
    .unwrap();

    let after = Utc::now();
    assert!(event.start.date_time >= before);
    assert!(event.start.date_time <= after);
}

#[tokio::test]
async fn default_window_ends_one_horizon_after_now() {
    // Busy for the next six days: the only room left is on day seven.
    let now = Utc::now();
    let blocked = TimeInterval::new(now - Duration::hours(1), now + Duration::days(6)).unwrap();
    let resolver = AvailabilityResolver::new(InMemoryProvider::new().with_busy("primary", [blocked]));
    let request = MeetingRequest::new("Later", 60).with_options(ScheduleOptions {
        buffer_before_minutes: Some(0),
        buffer_after_minutes: Some(0),
        ..ScheduleOptions::default()
    });

    let event = schedule_first_available(&resolver, &request, &SchedulingDefaults::default())
        .await
        .unwrap();
    assert_eq!(event.start.date_time, blocked.end);

    // Busy for eight days: nothing inside now + 7 days.
    let blocked = TimeInterval::new(now - Duration::hours(1), now + Duration::days(8)).unwrap();
    let resolver = AvailabilityResolver::new(InMemoryProvider::new().with_busy("primary", [blocked]));
    let err = schedule_first_available(&resolver, &request, &SchedulingDefaults::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SlotError::NoSlotFound));
}

#[tokio::test]
async fn time_min_past_default_horizon_is_an_inverted_window() {
    let provider = Arc::new(InMemoryProvider::new());
    let resolver = AvailabilityResolver::new(Arc::clone(&provider));
    let request = MeetingRequest::new("Too far out", 30).with_options(ScheduleOptions {
        time_min: Some(Utc::now() + Duration::days(10)),
        ..ScheduleOptions::default()
    });

    let err = schedule_first_available(&resolver, &request, &SchedulingDefaults::default())
        .await
        .unwrap_err();

    assert!(matches!(err, SlotError::InvalidInput(_)));
    assert!(provider.created_events().await.is_empty());
}

// ── Failures ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn fully_booked_window_is_no_slot_found() {
    let provider = Arc::new(InMemoryProvider::new().with_busy("primary", [span((9, 0), (17, 0))]));
    let resolver = AvailabilityResolver::new(Arc::clone(&provider));
    let request = MeetingRequest::new("Impossible", 30).with_options(workday());

    let err = schedule_first_available(&resolver, &request, &SchedulingDefaults::default())
        .await
        .unwrap_err();

    assert!(matches!(err, SlotError::NoSlotFound));
    assert_eq!(err.to_string(), "No available time slots found");
    assert!(provider.created_events().await.is_empty());
}

#[tokio::test]
async fn blank_summary_rejected() {
    let resolver = AvailabilityResolver::new(InMemoryProvider::new());
    let err = schedule_first_available(
        &resolver,
        &MeetingRequest::new("   ", 30).with_options(workday()),
        &SchedulingDefaults::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SlotError::InvalidInput(_)));
}

#[tokio::test]
async fn unknown_time_zone_rejected() {
    let resolver = AvailabilityResolver::new(InMemoryProvider::new());
    let request = MeetingRequest::new("Offworld", 30).with_options(ScheduleOptions {
        time_zone: Some("Mars/Olympus_Mons".to_string()),
        ..workday()
    });

    let err = schedule_first_available(&resolver, &request, &SchedulingDefaults::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SlotError::InvalidTimezone(_)));
}

#[tokio::test]
async fn non_positive_duration_rejected() {
    let resolver = AvailabilityResolver::new(InMemoryProvider::new());
    let err = schedule_first_available(
        &resolver,
        &MeetingRequest::new("Zero", 0).with_options(workday()),
        &SchedulingDefaults::default(),
    )
    .await
    .unwrap_err();
    assert!(err.is_client_error());
}
