use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::batch::BatchRun;
use super::capacity::CapacityTracker;
use super::decision::AssignmentDecision;
use super::domain::{AssignmentMode, DriverId, Job, JobId};
use super::engine::DispatchEngine;
use super::repository::{AssignmentConfigSource, DispatchRepository, RepositoryError};
use super::scoring::ScoreResult;
use super::validation::ValidationError;

/// One commit lock per pickup date.
///
/// Every write that can change a driver's count for a day goes through the
/// lock for that day, so a manual assignment cannot interleave with a batch
/// run touching the same date. Entries nobody holds a handle to are dropped
/// on the next acquisition, so the map only tracks dates in flight.
#[derive(Debug, Default)]
struct DayLocks {
    locks: Mutex<HashMap<NaiveDate, Arc<Mutex<()>>>>,
}

impl DayLocks {
    /// Handles for `dates`, ascending, so callers always lock in the same order.
    fn handles(&self, dates: &BTreeSet<NaiveDate>) -> Vec<Arc<Mutex<()>>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        dates
            .iter()
            .map(|date| locks.entry(*date).or_default().clone())
            .collect()
    }
}

/// Service composing the collaborators with the dispatch engine.
pub struct DispatchService<R, C> {
    repository: Arc<R>,
    config_source: Arc<C>,
    day_locks: DayLocks,
}

impl<R, C> DispatchService<R, C>
where
    R: DispatchRepository + 'static,
    C: AssignmentConfigSource + 'static,
{
    pub fn new(repository: Arc<R>, config_source: Arc<C>) -> Self {
        Self {
            repository,
            config_source,
            day_locks: DayLocks::default(),
        }
    }

    fn engine(&self) -> Result<DispatchEngine, DispatchServiceError> {
        let config = self.config_source.current()?;
        Ok(DispatchEngine::new(config)?)
    }

    fn find_job(&self, job_id: &JobId) -> Result<Job, DispatchServiceError> {
        self.repository
            .find_job(job_id)?
            .ok_or_else(|| DispatchServiceError::JobNotFound(job_id.clone()))
    }

    /// Assign a specific driver to a job on an operator's request.
    pub fn assign_one(
        &self,
        job_id: &JobId,
        driver_id: &DriverId,
        mode: AssignmentMode,
    ) -> Result<AssignmentDecision, DispatchServiceError> {
        let engine = self.engine()?;

        let pickup_date = self.find_job(job_id)?.pickup_date;

        let handles = self.day_locks.handles(&BTreeSet::from([pickup_date]));
        let _guards: Vec<_> = handles
            .iter()
            .map(|lock| lock.lock().unwrap_or_else(PoisonError::into_inner))
            .collect();

        // Re-read under the lock so status and load include any commit that
        // finished while we were waiting.
        let job = self.find_job(job_id)?;
        let driver = self
            .repository
            .find_driver(driver_id)?
            .ok_or_else(|| DispatchServiceError::DriverNotFound(driver_id.clone()))?;

        let mut tracker = CapacityTracker::from_roster(std::slice::from_ref(&driver));
        let decision = engine.assign_one(&job, &driver, &mut tracker, mode)?;
        self.repository.record_decision(&job, &decision)?;

        info!(
            job_id = %job.id,
            driver_id = %driver.id,
            accepted = decision.is_assigned(),
            "manual assignment recorded"
        );
        Ok(decision)
    }

    /// Auto-assign every pending job.
    pub fn run_for_pending(&self) -> Result<BatchRun, DispatchServiceError> {
        self.run_inner(None)
    }

    pub fn run_for_pending_until(
        &self,
        cancel: &CancellationToken,
    ) -> Result<BatchRun, DispatchServiceError> {
        self.run_inner(Some(cancel))
    }

    fn run_inner(
        &self,
        cancel: Option<&CancellationToken>,
    ) -> Result<BatchRun, DispatchServiceError> {
        let engine = self.engine()?;

        let dates: BTreeSet<NaiveDate> = self
            .repository
            .list_pending_jobs()?
            .iter()
            .map(|job| job.pickup_date)
            .collect();

        let handles = self.day_locks.handles(&dates);
        let _guards: Vec<_> = handles
            .iter()
            .map(|lock| lock.lock().unwrap_or_else(PoisonError::into_inner))
            .collect();

        // Jobs booked for a date we did not lock wait for the next run.
        let pending: Vec<_> = self
            .repository
            .list_pending_jobs()?
            .into_iter()
            .filter(|job| dates.contains(&job.pickup_date))
            .collect();
        let drivers = self.repository.list_active_drivers()?;
        let run = match cancel {
            Some(flag) => engine.run_for_pending_until(&pending, &drivers, flag)?,
            None => engine.run_for_pending(&pending, &drivers)?,
        };

        let jobs: HashMap<&JobId, _> = pending.iter().map(|job| (&job.id, job)).collect();
        for decision in &run.decisions {
            if let Some(job) = jobs.get(&decision.job_id) {
                self.repository.record_decision(job, decision)?;
            }
        }

        Ok(run)
    }

    /// Read-only scoring breakdown for one job across the active roster.
    pub fn preview_scores(&self, job_id: &JobId) -> Result<Vec<ScoreResult>, DispatchServiceError> {
        let engine = self.engine()?;
        let job = self.find_job(job_id)?;
        let drivers = self.repository.list_active_drivers()?;
        let tracker = CapacityTracker::from_roster(&drivers);
        Ok(engine.preview_scores(&job, &drivers, &tracker)?)
    }
}

/// Error raised by the dispatch service.
#[derive(Debug, thiserror::Error)]
pub enum DispatchServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("job {0} not found")]
    JobNotFound(JobId),
    #[error("driver {0} not found")]
    DriverNotFound(DriverId),
}
