//! Time intervals shared by busy blocks and free slots.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlotError};

/// A `[start, end]` range in UTC.
///
/// The same type carries busy blocks reported by a calendar and the free slots computed
/// from them. Serializes as `{"start": "...", "end": "..."}` with RFC 3339 timestamps,
/// which is also the provider's free/busy wire shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeInterval {
    /// Build an interval, rejecting `start > end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(SlotError::InvalidInput(format!(
                "interval start {} is after end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse both endpoints from RFC 3339 strings.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_timestamp(start)?, parse_timestamp(end)?)
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whole minutes covered, truncated toward zero.
    pub fn duration_minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    /// Whether the interval is long enough to host something of `min_len`.
    pub fn fits(&self, min_len: Duration) -> bool {
        self.duration() >= min_len
    }

    /// Half-open overlap test. Touching intervals do not overlap.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, other: &TimeInterval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Pad the interval by `before` on the left and `after` on the right.
    ///
    /// Saturates at the representable range instead of overflowing.
    pub fn buffered(&self, before: Duration, after: Duration) -> TimeInterval {
        TimeInterval {
            start: self
                .start
                .checked_sub_signed(before)
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            end: self
                .end
                .checked_add_signed(after)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }
}

/// Parse an RFC 3339 / ISO-8601 timestamp with any offset and normalize it to UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SlotError::InvalidTimestamp(format!("'{}': {}", raw, e)))
}

/// Convert a minute count to a [`Duration`], rejecting values chrono cannot represent.
pub(crate) fn minutes(value: i64, what: &str) -> Result<Duration> {
    Duration::try_minutes(value)
        .ok_or_else(|| SlotError::InvalidInput(format!("{} of {} minutes is out of range", what, value)))
}
