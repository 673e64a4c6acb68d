//! Port definitions: the traits the engine drives and adapters implement.
//!
//! Calendars, target lookup, dispatch, audit and timers all sit behind a
//! port so the engine can be exercised with in-memory fakes.

pub mod audit;
pub mod calendar;
pub mod dispatcher;
pub mod introspection;
pub mod resolver;
pub mod timer;

pub use audit::AuditSink;
pub use calendar::{CalendarError, CalendarSource};
pub use dispatcher::{DispatchError, Dispatcher};
pub use introspection::{ScheduledTask, TaskIntrospection};
pub use resolver::TargetResolver;
pub use timer::{Timer, TimerCallback, TimerError, TimerHandle};
