//! Validated slot queries.
//!
//! A [`SlotQuery`] can only be built through its constructors, so every query that reaches
//! the resolver already satisfies `window_start <= window_end`, a positive duration and
//! non-negative buffers.

use chrono::{DateTime, Duration, Utc};

use crate::error::{Result, SlotError};
use crate::interval::minutes;

/// Padding applied around every busy interval, never around the window itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Buffers {
    before: Duration,
    after: Duration,
}

impl Buffers {
    pub fn none() -> Self {
        Self {
            before: Duration::zero(),
            after: Duration::zero(),
        }
    }

    /// Build buffers from minute counts. Negative values are rejected.
    pub fn from_minutes(before: i64, after: i64) -> Result<Self> {
        if before < 0 || after < 0 {
            return Err(SlotError::InvalidInput(format!(
                "buffers must be non-negative (before={}, after={})",
                before, after
            )));
        }
        Ok(Self {
            before: minutes(before, "buffer before")?,
            after: minutes(after, "buffer after")?,
        })
    }

    pub fn before(&self) -> Duration {
        self.before
    }

    pub fn after(&self) -> Duration {
        self.after
    }
}

impl Default for Buffers {
    fn default() -> Self {
        Self::none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotQuery {
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    duration: Duration,
    buffers: Buffers,
    attendee_calendar_ids: Vec<String>,
}

impl SlotQuery {
    /// Build a query with no buffers and no attendees.
    ///
    /// # Errors
    /// `SlotError::InvalidInput` if `duration_minutes <= 0` or the window is inverted.
    /// An empty window (`window_start == window_end`) is accepted and resolves to no slots.
    pub fn new(
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        duration_minutes: i64,
    ) -> Result<Self> {
        if duration_minutes <= 0 {
            return Err(SlotError::InvalidInput(format!(
                "duration must be a positive number of minutes, got {}",
                duration_minutes
            )));
        }
        if window_start > window_end {
            return Err(SlotError::InvalidInput(format!(
                "window start {} is after window end {}",
                window_start.to_rfc3339(),
                window_end.to_rfc3339()
            )));
        }
        Ok(Self {
            window_start,
            window_end,
            duration: minutes(duration_minutes, "duration")?,
            buffers: Buffers::none(),
            attendee_calendar_ids: Vec::new(),
        })
    }

    pub fn with_buffers(mut self, buffers: Buffers) -> Self {
        self.buffers = buffers;
        self
    }

    /// Add attendee calendars. The primary calendar is implied and need not be listed.
    pub fn with_attendees<I, S>(mut self, attendees: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attendee_calendar_ids
            .extend(attendees.into_iter().map(Into::into));
        self
    }

    pub fn window_start(&self) -> DateTime<Utc> {
        self.window_start
    }

    pub fn window_end(&self) -> DateTime<Utc> {
        self.window_end
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn duration_minutes(&self) -> i64 {
        self.duration.num_minutes()
    }

    pub fn buffers(&self) -> Buffers {
        self.buffers
    }

    pub fn attendee_calendar_ids(&self) -> &[String] {
        &self.attendee_calendar_ids
    }

    /// Calendars to fetch busy time for: `primary` first, then the attendees in order.
    pub fn calendar_ids(&self, primary: &str) -> Vec<String> {
        std::iter::once(primary.to_string())
            .chain(self.attendee_calendar_ids.iter().cloned())
            .collect()
    }
}
