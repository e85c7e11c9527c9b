//! Compute free time slots from per-calendar busy data.
//!
//! Busy intervals from every calendar are flattened, stable-sorted by start, and walked
//! with a cursor that only moves forward. Overlapping or nested busy time therefore needs
//! no pre-merge: a later interval swallowed by an earlier buffered one leaves no gap.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlotError};
use crate::interval::TimeInterval;
use crate::query::SlotQuery;

/// Busy intervals keyed by calendar id, unsorted as received.
pub type BusyIndex = BTreeMap<String, Vec<TimeInterval>>;

/// A per-calendar error reported inside an otherwise successful free/busy answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarFault {
    #[serde(default)]
    pub domain: String,
    pub reason: String,
}

impl CalendarFault {
    pub fn not_found() -> Self {
        Self {
            domain: "global".to_string(),
            reason: "notFound".to_string(),
        }
    }
}

/// Busy data for one calendar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarBusy {
    #[serde(default)]
    pub busy: Vec<TimeInterval>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<CalendarFault>,
}

/// Free/busy answer as returned by a calendar provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeBusyResponse {
    pub time_min: DateTime<Utc>,
    pub time_max: DateTime<Utc>,
    #[serde(default)]
    pub calendars: BTreeMap<String, CalendarBusy>,
}

impl FreeBusyResponse {
    /// Strip the response down to busy intervals per calendar.
    ///
    /// A calendar that carries errors is treated as a failed fetch, never as a calendar
    /// with no busy time. A busy interval that ends before it starts fails the whole
    /// response as a provider error.
    pub fn into_busy_index(self) -> Result<BusyIndex> {
        let mut index = BusyIndex::new();
        for (calendar_id, calendar) in self.calendars {
            if let Some(fault) = calendar.errors.first() {
                return Err(SlotError::CalendarUnavailable {
                    calendar_id,
                    reason: fault.reason.clone(),
                });
            }
            if let Some(bad) = calendar.busy.iter().find(|b| b.start > b.end) {
                return Err(SlotError::Provider(format!(
                    "calendar '{}' reported a busy interval ending {} before its start {}",
                    calendar_id,
                    bad.end.to_rfc3339(),
                    bad.start.to_rfc3339()
                )));
            }
            index.insert(calendar_id, calendar.busy);
        }
        Ok(index)
    }
}

/// Flatten every calendar's busy intervals into one list. Duplicates are kept.
pub fn flatten_busy(index: &BusyIndex) -> Vec<TimeInterval> {
    index.values().flatten().copied().collect()
}

/// Find every gap in the query window that can host a meeting of the query's duration.
///
/// Each busy interval is padded by the query's buffers. Busy intervals are not clipped to
/// the window first, so a buffered interval that starts before the window and ends inside
/// it pushes the first slot later. Emitted slots never extend past `window_end`.
///
/// The result is chronological and every slot satisfies `end - start >= duration`.
pub fn find_open_slots(busy: &[TimeInterval], query: &SlotQuery) -> Vec<TimeInterval> {
    let mut sorted = busy.to_vec();
    // `sort_by_key` is stable, so ties keep their received order.
    sorted.sort_by_key(|interval| interval.start);

    let window_end = query.window_end();
    let min_len = query.duration();
    let buffers = query.buffers();

    let mut slots = Vec::new();
    let mut cursor = query.window_start();

    for interval in &sorted {
        if cursor >= window_end {
            break;
        }
        let padded = interval.buffered(buffers.before(), buffers.after());
        if padded.start > cursor {
            push_if_fits(&mut slots, cursor, padded.start.min(window_end), min_len);
        }
        cursor = cursor.max(padded.end);
    }

    // Trailing gap after the last busy interval.
    if window_end > cursor {
        push_if_fits(&mut slots, cursor, window_end, min_len);
    }

    slots
}

/// Flatten the index and run [`find_open_slots`] over it.
pub fn find_open_slots_in(index: &BusyIndex, query: &SlotQuery) -> Vec<TimeInterval> {
    find_open_slots(&flatten_busy(index), query)
}

fn push_if_fits(
    slots: &mut Vec<TimeInterval>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    min_len: Duration,
) {
    if end > start && end - start >= min_len {
        slots.push(TimeInterval { start, end });
    }
}
