//! # calswitch-domain
//!
//! Pure domain model for the calswitch calendar-driven scheduler.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Calendar events** and their content **fingerprints**
//! - Parse event **summaries** (`!` invert prefix, `+` one-shot suffix)
//! - Define **Action plans** (the `turn_on` / `turn_off` trigger pairs
//!   derived from one event)
//! - Define **Targets** (resolved devices) and **Audit records**
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod action;
pub mod audit;
pub mod calendar;
pub mod summary;
pub mod target;
