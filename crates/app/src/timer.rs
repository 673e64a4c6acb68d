//! Tokio-backed [`Timer`]: one sleeping task per registration.

use std::time::Duration;

use calswitch_domain::time::{self, Timestamp};

use crate::ports::{Timer, TimerCallback, TimerError, TimerHandle};

/// Timer that spawns a task sleeping until the requested instant.
///
/// The delay is computed against the wall clock at registration time.
/// Cancelling aborts the task; aborting a task that already fired is a
/// no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

impl Timer for TokioTimer {
    fn schedule_at(
        &self,
        at: Timestamp,
        callback: TimerCallback,
    ) -> Result<TimerHandle, TimerError> {
        let runtime = tokio::runtime::Handle::try_current()?;
        let delay = (at - time::now()).to_std().unwrap_or(Duration::ZERO);

        let task = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        });
        let abort = task.abort_handle();

        Ok(TimerHandle::new(move || abort.abort()))
    }
}
