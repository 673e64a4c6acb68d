//! Calendar events and their content fingerprints.
//!
//! Calendars are opaque to the scheduler: an event is only a summary, two
//! boundaries and a handful of optional identifying fields. Identity for
//! diffing is the [`Fingerprint`] of the whole content, never a source id.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::time::Timestamp;

/// Identifier of a watched calendar (e.g. `"calendar.lights"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarId(String);

impl CalendarId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CalendarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One calendar entry, as returned by a calendar source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub summary: String,
    pub start: Timestamp,
    pub end: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rrule: Option<String>,
}

impl CalendarEvent {
    /// Create an event with only the mandatory fields set.
    #[must_use]
    pub fn new(summary: impl Into<String>, start: Timestamp, end: Timestamp) -> Self {
        Self {
            summary: summary.into(),
            start,
            end,
            uid: None,
            description: None,
            location: None,
            recurrence_id: None,
            rrule: None,
        }
    }

    #[must_use]
    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn with_recurrence_id(mut self, recurrence_id: impl Into<String>) -> Self {
        self.recurrence_id = Some(recurrence_id.into());
        self
    }

    #[must_use]
    pub fn with_rrule(mut self, rrule: impl Into<String>) -> Self {
        self.rrule = Some(rrule.into());
        self
    }

    /// Digest of the full event content.
    ///
    /// Every field is fed to the hash as `name`, byte length, bytes, so no
    /// two distinct field layouts can produce the same preimage. Absent
    /// optional fields are encoded with a distinct marker.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        let mut hasher = Sha256::new();
        let mut field = |name: &str, value: Option<&str>| {
            hasher.update(name.as_bytes());
            match value {
                Some(value) => {
                    hasher.update([1u8]);
                    hasher.update((value.len() as u64).to_be_bytes());
                    hasher.update(value.as_bytes());
                }
                None => hasher.update([0u8]),
            }
        };

        field("summary", Some(&self.summary));
        field("start", Some(&self.start.to_rfc3339()));
        field("end", Some(&self.end.to_rfc3339()));
        field("uid", self.uid.as_deref());
        field("description", self.description.as_deref());
        field("location", self.location.as_deref());
        field("recurrence_id", self.recurrence_id.as_deref());
        field("rrule", self.rrule.as_deref());

        Fingerprint(hex::encode(hasher.finalize()))
    }
}

/// Content digest identifying a [`CalendarEvent`] across refresh passes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Lowercase hex form of the digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight hex characters, for log lines.
    #[must_use]
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn at(secs: i64) -> Timestamp {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn event() -> CalendarEvent {
        CalendarEvent::new("Kitchen Light", at(1_000), at(2_000))
    }

    #[test]
    fn should_produce_same_fingerprint_for_same_content() {
        assert_eq!(event().fingerprint(), event().fingerprint());
        let e = event();
        assert_eq!(e.fingerprint(), e.fingerprint());
    }

    #[test]
    fn should_produce_64_lowercase_hex_chars() {
        let fp = event().fingerprint();
        assert_eq!(fp.as_str().len(), 64);
        assert!(
            fp.as_str()
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
        assert_eq!(fp.short(), &fp.as_str()[..8]);
    }

    #[test]
    fn should_change_fingerprint_when_any_field_changes() {
        let base = event().fingerprint();
        let variants = [
            CalendarEvent::new("Kitchen Light+", at(1_000), at(2_000)),
            CalendarEvent::new("Kitchen Light", at(1_001), at(2_000)),
            CalendarEvent::new("Kitchen Light", at(1_000), at(2_001)),
            event().with_uid("abc"),
            event().with_description("notes"),
            event().with_location("home"),
            event().with_recurrence_id("20240101T000000Z"),
            event().with_rrule("FREQ=DAILY"),
        ];

        for variant in &variants {
            assert_ne!(variant.fingerprint(), base, "{variant:?}");
        }
    }

    #[test]
    fn should_not_confuse_empty_optional_with_absent_optional() {
        let absent = event();
        let empty = event().with_description("");
        assert_ne!(absent.fingerprint(), empty.fingerprint());
    }

    #[test]
    fn should_not_confuse_values_shifted_between_fields() {
        let a = event().with_description("x").with_location("");
        let b = event().with_description("").with_location("x");
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn should_roundtrip_event_through_serde_json() {
        let e = event().with_uid("uid-1");
        let json = serde_json::to_string(&e).unwrap();
        let parsed: CalendarEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, e);
        assert_eq!(parsed.fingerprint(), e.fingerprint());
    }

    #[test]
    fn should_shorten_fingerprint_without_splitting_characters() {
        let short = Fingerprint("abcdef0123456789".to_string());
        assert_eq!(short.short(), "abcdef01");

        let tiny = Fingerprint("abc".to_string());
        assert_eq!(tiny.short(), "abc");

        let wide: Fingerprint = serde_json::from_str("\"aéééé\"").unwrap();
        assert_eq!(wide.short(), "aéééé");
    }

    #[test]
    fn should_display_calendar_id() {
        assert_eq!(CalendarId::new("calendar.lights").to_string(), "calendar.lights");
    }
}
