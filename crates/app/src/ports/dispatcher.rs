//! Dispatch port: deliver `turn_on` / `turn_off` commands to targets.

use std::future::Future;

use calswitch_domain::action::ActionKind;
use calswitch_domain::target::TargetId;

/// Sends commands to targets.
///
/// Callers treat dispatch as fire-and-forget: the returned future is
/// spawned and only its error, if any, is logged.
pub trait Dispatcher: Send + Sync {
    fn invoke(
        &self,
        target: &TargetId,
        action: ActionKind,
    ) -> impl Future<Output = Result<(), DispatchError>> + Send;
}

impl<T: Dispatcher> Dispatcher for std::sync::Arc<T> {
    fn invoke(
        &self,
        target: &TargetId,
        action: ActionKind,
    ) -> impl Future<Output = Result<(), DispatchError>> + Send {
        (**self).invoke(target, action)
    }
}

/// Failure to deliver a command.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The target disappeared between resolution and firing.
    #[error("unknown target {0}")]
    UnknownTarget(TargetId),

    /// The target does not accept this command.
    #[error("target {target} does not support {action}")]
    Unsupported {
        target: TargetId,
        action: ActionKind,
    },

    /// Transport or device failure.
    #[error("dispatch failed")]
    Failed(#[source] Box<dyn std::error::Error + Send + Sync>),
}
