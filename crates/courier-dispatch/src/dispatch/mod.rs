//! Job-to-driver allocation.
//!
//! Leaves first: [`capacity`] keeps per-driver counts for a run,
//! [`constraints`] filters drivers on hard rules, [`scoring`] ranks the
//! survivors, [`selection`] picks one, and [`batch`] strings them together
//! over a FIFO queue. [`engine`] and [`service`] are the entry points.

pub mod batch;
pub mod capacity;
pub mod constraints;
pub mod decision;
pub mod domain;
pub mod engine;
pub mod policy;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod selection;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use batch::{BatchAutoAssigner, BatchRun, BatchSummary};
pub use capacity::CapacityTracker;
pub use constraints::{ConstraintEvaluator, HardConstraintResult, RuleOutcome};
pub use decision::{AssignmentDecision, FailureReason};
pub use domain::{
    AssignmentMode, CommittedLoad, Driver, DriverId, Job, JobId, JobStatus, Region,
    RegionCodeError, RegionCoverage, TimeSlot, TimeSlotError, VehicleType,
};
pub use engine::{run_for_pending, DispatchEngine};
pub use policy::{AssignmentConfig, HardConstraint, SoftRule, SoftRuleSetting};
pub use repository::{
    AssignmentConfigSource, DispatchRepository, DispatchSnapshot, RepositoryError,
    StaticConfigSource,
};
pub use router::{dispatch_router, ManualAssignmentRequest};
pub use scoring::{ScoreResult, ScoringEngine};
pub use selection::AssignmentSelector;
pub use service::{DispatchService, DispatchServiceError};
pub use validation::ValidationError;
