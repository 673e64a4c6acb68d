//! Calendar port: read events from a watched calendar.

use std::future::Future;

use calswitch_domain::calendar::{CalendarEvent, CalendarId};
use calswitch_domain::time::TimeWindow;

/// Source of calendar events.
pub trait CalendarSource: Send + Sync {
    /// Return every event of `calendar` overlapping `window`.
    fn fetch_events(
        &self,
        calendar: &CalendarId,
        window: TimeWindow,
    ) -> impl Future<Output = Result<Vec<CalendarEvent>, CalendarError>> + Send;
}

impl<T: CalendarSource> CalendarSource for std::sync::Arc<T> {
    fn fetch_events(
        &self,
        calendar: &CalendarId,
        window: TimeWindow,
    ) -> impl Future<Output = Result<Vec<CalendarEvent>, CalendarError>> + Send {
        (**self).fetch_events(calendar, window)
    }
}

/// Failure to read one calendar.
#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    /// The source does not know this calendar.
    #[error("unknown calendar {0}")]
    NotFound(CalendarId),

    /// The calendar exists but could not be read right now.
    #[error("calendar {calendar} unavailable")]
    Unavailable {
        calendar: CalendarId,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
