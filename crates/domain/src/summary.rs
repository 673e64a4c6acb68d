//! Event summary grammar.
//!
//! A summary names the target to switch, optionally decorated:
//!
//! | Summary          | Reference      | Invert | One-shot |
//! |------------------|----------------|--------|----------|
//! | `Kitchen Light`  | `Kitchen Light`| no     | no       |
//! | `!Kitchen Light` | `Kitchen Light`| yes    | no       |
//! | `Kitchen Light+` | `Kitchen Light`| no     | yes      |
//! | `!Fan+`          | `Fan`          | yes    | yes      |
//!
//! The reference is not checked against anything here; resolution happens
//! in the application layer.

use serde::{Deserialize, Serialize};

use crate::error::MalformedSummary;

const INVERT_PREFIX: char = '!';
const ONE_SHOT_SUFFIX: char = '+';

/// Result of parsing an event summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedSummary {
    /// Entity id, friendly name, or `"<area> <name>"` of the target.
    pub target_reference: String,
    /// Swap which event boundary turns the target on and off.
    pub invert: bool,
    /// Schedule a single action and ignore the event's end.
    pub one_shot: bool,
}

impl std::str::FromStr for ParsedSummary {
    type Err = MalformedSummary;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Parse a summary, left to right.
///
/// # Errors
///
/// Returns [`MalformedSummary`] when the summary is empty or nothing but
/// whitespace remains once the modifiers are stripped.
pub fn parse(summary: &str) -> Result<ParsedSummary, MalformedSummary> {
    let (rest, invert) = match summary.strip_prefix(INVERT_PREFIX) {
        Some(rest) => (rest, true),
        None => (summary, false),
    };
    let (rest, one_shot) = match rest.strip_suffix(ONE_SHOT_SUFFIX) {
        Some(rest) => (rest, true),
        None => (rest, false),
    };

    let target_reference = rest.trim();
    if target_reference.is_empty() {
        return Err(MalformedSummary {
            summary: summary.to_string(),
        });
    }

    Ok(ParsedSummary {
        target_reference: target_reference.to_string(),
        invert,
        one_shot,
    })
}
