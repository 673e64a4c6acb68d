//! # calswitch-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Routes
//! - `GET /health`: liveness check, answers `OK`
//! - `GET /api/scheduler/tasks`: tasks the scheduler reports as scheduled
//!
//! ## Dependency rule
//! Depends on `calswitch-app` (for port traits) and `calswitch-domain`
//! (for domain types used in response mapping). Never leaks axum types
//! into the domain.

pub mod api;
pub mod router;
pub mod state;
