//! Audit records: what the scheduler sent, to whom, and when.

use serde::{Deserialize, Serialize};

use crate::action::ActionKind;
use crate::id::AuditId;
use crate::target::TargetId;
use crate::time::{self, Timestamp};

/// Name under which audit entries appear in the log book.
pub const AUDIT_SOURCE: &str = "Scheduler";

/// Record of one fired trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: AuditId,
    pub target_id: TargetId,
    pub display_label: String,
    pub action: ActionKind,
    pub recorded_at: Timestamp,
}

impl AuditRecord {
    /// Create a record stamped with the current time.
    #[must_use]
    pub fn new(target_id: TargetId, display_label: impl Into<String>, action: ActionKind) -> Self {
        Self {
            id: AuditId::new(),
            target_id,
            display_label: display_label.into(),
            action,
            recorded_at: time::now(),
        }
    }

    /// Human-readable log book line.
    #[must_use]
    pub fn message(&self) -> String {
        format!("send command {} for {}", self.action, self.display_label)
    }
}
