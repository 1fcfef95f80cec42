//! Courier job to driver allocation.
//!
//! The [`dispatch`] module holds the engine: capacity bookkeeping, hard
//! constraint filtering, weighted scoring, deterministic selection and the
//! batch auto-assigner. The remaining modules carry the service plumbing
//! shared with the `courier-dispatch-api` binary.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod telemetry;
