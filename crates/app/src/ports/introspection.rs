//! Introspection port: list the tasks the scheduler currently holds.

use serde::Serialize;

use calswitch_domain::action::ActionKind;
use calswitch_domain::target::TargetId;
use calswitch_domain::time::Timestamp;

/// One pending trigger, as reported to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledTask {
    pub target_id: TargetId,
    pub display_label: String,
    pub action: ActionKind,
    pub at: Timestamp,
}

/// Read-only view of scheduled tasks.
pub trait TaskIntrospection: Send + Sync {
    /// Tasks currently scheduled.
    ///
    /// Not implemented yet: every implementation in this workspace returns
    /// an empty list, and API consumers rely on that shape.
    fn scheduled_tasks(&self) -> Vec<ScheduledTask>;
}

impl<T: TaskIntrospection> TaskIntrospection for std::sync::Arc<T> {
    fn scheduled_tasks(&self) -> Vec<ScheduledTask> {
        (**self).scheduled_tasks()
    }
}
