//! # calswitch-app
//!
//! Application layer: the reconciliation engine and its **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `CalendarSource`: fetch the events of one calendar over a window
//!   - `TargetResolver`: turn a summary reference into a device
//!   - `Dispatcher`: send `turn_on` / `turn_off` to a device
//!   - `AuditSink`: keep the trail of sent commands
//!   - `Timer`: run a callback at an absolute instant, cancellably
//! - Define **driving/inbound ports**:
//!   - `ReconciliationEngine`: start, stop, refresh
//!   - `TaskIntrospection`: list scheduled tasks
//! - Provide **in-process infrastructure** (audit bus, tokio timer) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `calswitch-domain` only (plus `tokio` for tasks, timers and channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod audit_bus;
pub mod engine;
pub mod ports;
pub mod scheduled_action;
pub mod timer;

#[cfg(test)]
mod testing;
