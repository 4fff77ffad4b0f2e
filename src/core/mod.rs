//! Core business logic - framework-agnostic scheduling and pricing.
//!
//! `recurrence` and `pricing` are pure functions; `pause` owns the
//! subscription lifecycle state machine; `subscription` is the thin
//! orchestrator the web boundary talks to.

/// Pause/resume lifecycle state machine
pub mod pause;
/// Discount rule evaluation and price quotes
pub mod pricing;
/// Weekly recurrence pattern expansion
pub mod recurrence;
/// Orchestration of creation, scheduling, pausing, and quoting
pub mod subscription;
