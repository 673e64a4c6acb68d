//! Timer port: run a callback at a point in time, with explicit cancellation.

use calswitch_domain::time::Timestamp;

/// Work run when a timer fires.
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Schedules callbacks for a future (or already elapsed) instant.
///
/// An instant in the past fires as soon as possible.
pub trait Timer: Send + Sync {
    /// Register `callback` to run at `at`.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError`] when the registration is refused.
    fn schedule_at(&self, at: Timestamp, callback: TimerCallback)
    -> Result<TimerHandle, TimerError>;
}

impl<T: Timer> Timer for std::sync::Arc<T> {
    fn schedule_at(
        &self,
        at: Timestamp,
        callback: TimerCallback,
    ) -> Result<TimerHandle, TimerError> {
        (**self).schedule_at(at, callback)
    }
}

/// Owned cancellation capability for one registered timer.
///
/// Cancelling is idempotent, and cancelling a timer that already fired is
/// a no-op.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TimerHandle {
    /// Wrap the closure that cancels the underlying timer.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Cancel the timer. Only the first call has an effect.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_none()
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Failure to register a timer.
#[derive(Debug, thiserror::Error)]
pub enum TimerError {
    /// No async runtime is available to drive the timer.
    #[error("no timer runtime available")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    /// The timer backend refused a registration for `at`.
    #[error("timer registration for {at} rejected")]
    Rejected { at: Timestamp },
}
