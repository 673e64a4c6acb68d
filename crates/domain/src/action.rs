//! Action plan: the `turn_on` / `turn_off` triggers derived from one event.

use serde::{Deserialize, Serialize};

use crate::calendar::CalendarEvent;
use crate::error::DegenerateAction;
use crate::summary::ParsedSummary;
use crate::time::Timestamp;

/// Command sent to a target when a trigger fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    TurnOn,
    TurnOff,
}

impl ActionKind {
    /// Service name understood by dispatchers.
    #[must_use]
    pub fn service(self) -> &'static str {
        match self {
            Self::TurnOn => "turn_on",
            Self::TurnOff => "turn_off",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.service())
    }
}

/// One `(kind, trigger_time)` pair of an [`ActionPlan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedAction {
    pub kind: ActionKind,
    pub at: Timestamp,
}

/// The triggers of one scheduled action.
///
/// Holds at most one `turn_on` and at most one `turn_off`, and never
/// neither. Entries are kept in `on`, `off` order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPlan {
    entries: Vec<PlannedAction>,
}

impl ActionPlan {
    /// Build a plan from optional `on` and `off` trigger times.
    ///
    /// # Errors
    ///
    /// Returns [`DegenerateAction`] when both times are absent.
    pub fn new(on: Option<Timestamp>, off: Option<Timestamp>) -> Result<Self, DegenerateAction> {
        let entries: Vec<_> = [(ActionKind::TurnOn, on), (ActionKind::TurnOff, off)]
            .into_iter()
            .filter_map(|(kind, at)| at.map(|at| PlannedAction { kind, at }))
            .collect();

        if entries.is_empty() {
            return Err(DegenerateAction);
        }
        Ok(Self { entries })
    }

    /// Apply the summary modifiers to the event boundaries.
    ///
    /// `on = start`, `off = end` unless one-shot (no `off`); then swap
    /// both when inverted, so an inverted one-shot turns the target off
    /// at `start`.
    ///
    /// # Errors
    ///
    /// Returns [`DegenerateAction`] when no trigger remains.
    pub fn from_event(
        summary: &ParsedSummary,
        event: &CalendarEvent,
    ) -> Result<Self, DegenerateAction> {
        let mut on = Some(event.start);
        let mut off = if summary.one_shot {
            None
        } else {
            Some(event.end)
        };

        if summary.invert {
            std::mem::swap(&mut on, &mut off);
        }

        Self::new(on, off)
    }

    /// Entries in `on`, `off` order.
    #[must_use]
    pub fn entries(&self) -> &[PlannedAction] {
        &self.entries
    }

    /// Trigger time of the given kind, if planned.
    #[must_use]
    pub fn time_of(&self, kind: ActionKind) -> Option<Timestamp> {
        self.entries.iter().find(|e| e.kind == kind).map(|e| e.at)
    }

    /// Entries sorted by trigger time, latest first.
    ///
    /// The sort is stable: when both triggers share a time, `turn_on`
    /// stays ahead of `turn_off`.
    #[must_use]
    pub fn latest_first(&self) -> Vec<PlannedAction> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| b.at.cmp(&a.at));
        sorted
    }
}
