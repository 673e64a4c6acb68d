//! Time and timestamp helpers.

use chrono::{DateTime, TimeDelta, Utc};

/// UTC timestamp used for event boundaries, trigger times and audit records.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// A closed interval of time, `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl TimeWindow {
    /// The sliding window looked at by one refresh pass:
    /// `[now - historic, now + preload]`.
    #[must_use]
    pub fn around(now: Timestamp, historic: TimeDelta, preload: TimeDelta) -> Self {
        Self {
            start: now - historic,
            end: now + preload,
        }
    }

    /// Whether `[start, end]` intersects this window.
    #[must_use]
    pub fn overlaps(&self, start: Timestamp, end: Timestamp) -> bool {
        start <= self.end && end >= self.start
    }
}
