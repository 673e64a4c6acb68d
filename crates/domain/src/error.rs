//! Common error types used across the workspace.
//!
//! Every failure that can happen while turning a calendar event into a
//! scheduled action is recoverable: the event is skipped for the current
//! refresh pass and reconsidered on the next one.

/// Reasons a calendar event could not be turned into a scheduled action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulingError {
    /// The summary does not name a target.
    #[error("malformed summary")]
    MalformedSummary(#[from] MalformedSummary),

    /// No known target matches the summary's reference.
    #[error("target not resolvable")]
    TargetNotResolvable(#[from] TargetNotResolvable),

    /// Neither an `on` nor an `off` trigger remains after interpretation.
    #[error("degenerate action")]
    DegenerateAction(#[from] DegenerateAction),
}

/// The summary is empty, or nothing is left once the modifiers are stripped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("summary {summary:?} has no target reference")]
pub struct MalformedSummary {
    pub summary: String,
}

/// The resolution collaborator found nothing for a reference.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no target matches {reference:?}")]
pub struct TargetNotResolvable {
    pub reference: String,
}

/// An action plan would contain no trigger at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("event yields neither a turn_on nor a turn_off trigger")]
pub struct DegenerateAction;
