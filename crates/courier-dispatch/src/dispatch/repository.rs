use serde::{Deserialize, Serialize};

use super::decision::AssignmentDecision;
use super::domain::{Driver, DriverId, Job, JobId};
use super::policy::AssignmentConfig;

/// Job and roster store owned by the booking system.
///
/// Implementations are expected to stage writes without blocking on remote
/// I/O: `record_decision` is called while the per-day commit lock is held.
pub trait DispatchRepository: Send + Sync {
    /// Jobs still awaiting a driver (`booked` or `pending-assignment`).
    fn list_pending_jobs(&self) -> Result<Vec<Job>, RepositoryError>;
    /// Active drivers with their committed load as of this call.
    fn list_active_drivers(&self) -> Result<Vec<Driver>, RepositoryError>;
    fn find_job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError>;
    fn find_driver(&self, id: &DriverId) -> Result<Option<Driver>, RepositoryError>;
    /// Persist one decision. Recording the same decision twice must be a no-op;
    /// assigning a job already committed to another driver is a `Conflict`.
    fn record_decision(
        &self,
        job: &Job,
        decision: &AssignmentDecision,
    ) -> Result<(), RepositoryError>;
}

/// Settings store holding the hot-reloadable policy. Read once per run.
pub trait AssignmentConfigSource: Send + Sync {
    fn current(&self) -> Result<AssignmentConfig, RepositoryError>;
}

/// Fixed policy, for tests and single-shot CLI runs.
#[derive(Debug, Clone, Default)]
pub struct StaticConfigSource(pub AssignmentConfig);

impl AssignmentConfigSource for StaticConfigSource {
    fn current(&self) -> Result<AssignmentConfig, RepositoryError> {
        Ok(self.0.clone())
    }
}

/// Error enumeration for collaborator failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Snapshot file layout used by the CLI and fixtures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchSnapshot {
    #[serde(default)]
    pub jobs: Vec<Job>,
    #[serde(default)]
    pub drivers: Vec<Driver>,
}
