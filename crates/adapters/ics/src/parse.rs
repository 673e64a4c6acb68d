//! VEVENT extraction using the icalendar crate's parser.

use chrono::{Local, NaiveDateTime, TimeDelta, TimeZone, Utc};
use icalendar::parser::{Component, read_calendar, unfold};
use icalendar::{CalendarDateTime, DatePerhapsTime};

use calswitch_domain::calendar::CalendarEvent;
use calswitch_domain::time::Timestamp;

/// Parse every VEVENT of an ICS document.
///
/// Events whose start cannot be read are dropped with a warning. A missing
/// `DTEND` ends a timed event at its start and an all-day event one day
/// later. Recurrence rules are carried along but not expanded.
pub(crate) fn parse_events(content: &str) -> Result<Vec<CalendarEvent>, String> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).map_err(|err| err.to_string())?;

    Ok(calendar
        .components
        .iter()
        .filter(|c| c.name == "VEVENT")
        .filter_map(|vevent| {
            let event = to_event(vevent);
            if event.is_none() {
                let uid = vevent.find_prop("UID").map(|p| p.val.to_string());
                tracing::warn!(?uid, "skipping VEVENT without a usable DTSTART");
            }
            event
        })
        .collect())
}

fn to_event(vevent: &Component<'_>) -> Option<CalendarEvent> {
    let start = DatePerhapsTime::try_from(vevent.find_prop("DTSTART")?).ok()?;
    let end = vevent
        .find_prop("DTEND")
        .and_then(|p| DatePerhapsTime::try_from(p).ok());

    let start_utc = to_utc(&start)?;
    let end_utc = match end {
        Some(end) => to_utc(&end)?,
        None if matches!(start, DatePerhapsTime::Date(_)) => start_utc + TimeDelta::days(1),
        None => start_utc,
    };

    let summary = vevent
        .find_prop("SUMMARY")
        .map(|p| p.val.to_string())
        .unwrap_or_default();
    let mut event = CalendarEvent::new(summary, start_utc, end_utc);

    if let Some(uid) = vevent.find_prop("UID") {
        event = event.with_uid(uid.val.to_string());
    }
    if let Some(description) = vevent.find_prop("DESCRIPTION") {
        event = event.with_description(description.val.to_string());
    }
    if let Some(location) = vevent.find_prop("LOCATION") {
        event = event.with_location(location.val.to_string());
    }
    if let Some(recurrence_id) = vevent.find_prop("RECURRENCE-ID") {
        event = event.with_recurrence_id(recurrence_id.val.to_string());
    }
    if let Some(rrule) = vevent.find_prop("RRULE") {
        event = event.with_rrule(rrule.val.to_string());
    }

    Some(event)
}

/// Convert an ICS time to UTC. Floating times and dates are read in the
/// local timezone; dates start at midnight.
fn to_utc(time: &DatePerhapsTime) -> Option<Timestamp> {
    match time {
        DatePerhapsTime::Date(date) => from_local(date.and_hms_opt(0, 0, 0)?),
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => Some(*dt),
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)) => from_local(*naive),
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
            let Ok(tz) = tzid.parse::<chrono_tz::Tz>() else {
                tracing::debug!(tzid = %tzid, "unknown timezone");
                return None;
            };
            tz.from_local_datetime(date_time)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
        }
    }
}

fn from_local(naive: NaiveDateTime) -> Option<Timestamp> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}
