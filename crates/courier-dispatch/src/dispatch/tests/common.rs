use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::dispatch::decision::{AssignmentDecision, FailureReason};
use crate::dispatch::domain::{
    CommittedLoad, Driver, DriverId, Job, JobId, JobStatus, Region, TimeSlot, VehicleType,
};
use crate::dispatch::engine::DispatchEngine;
use crate::dispatch::policy::AssignmentConfig;
use crate::dispatch::repository::{DispatchRepository, RepositoryError, StaticConfigSource};
use crate::dispatch::service::DispatchService;

pub(super) fn pickup_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date")
}

pub(super) fn slot(raw: &str) -> TimeSlot {
    TimeSlot::parse(raw).expect("valid slot")
}

fn booked_at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0)
        .single()
        .expect("valid timestamp")
        + Duration::minutes(minutes)
}

/// Pending job in the 09:00 slot, booked `order` minutes after the first one.
pub(super) fn job(id: &str, region: Region, order: i64) -> Job {
    Job {
        id: JobId(id.to_string()),
        pickup_region: region,
        pickup_date: pickup_date(),
        pickup_slot: slot("09:00-11:00"),
        required_vehicle: None,
        status: JobStatus::PendingAssignment,
        created_at: booked_at(order),
    }
}

/// Active car driver working 08:00-18:00 whose slot limit never binds.
pub(super) fn driver(id: &str, region: Region, max_jobs_per_day: u32) -> Driver {
    Driver {
        id: DriverId(id.to_string()),
        primary_region: region,
        secondary_regions: BTreeSet::new(),
        vehicle_type: VehicleType::Car,
        is_active: true,
        max_jobs_per_day,
        max_jobs_per_slot: max_jobs_per_day.max(1),
        work_day_start_hour: 8,
        work_day_end_hour: 18,
        committed: Vec::new(),
    }
}

/// Add `jobs` already committed on the pickup date, outside the test slot.
pub(super) fn with_load(mut driver: Driver, jobs: u32) -> Driver {
    driver.committed.push(CommittedLoad {
        date: pickup_date(),
        slot: slot("14:00-16:00"),
        jobs,
    });
    driver
}

pub(super) fn with_secondary(mut driver: Driver, region: Region) -> Driver {
    driver.secondary_regions.insert(region);
    driver
}

pub(super) fn engine() -> DispatchEngine {
    DispatchEngine::new(AssignmentConfig::default()).expect("default policy is valid")
}

pub(super) fn engine_with(config: AssignmentConfig) -> DispatchEngine {
    DispatchEngine::new(config).expect("policy is valid")
}

pub(super) fn driver_id(id: &str) -> DriverId {
    DriverId(id.to_string())
}

pub(super) fn job_id(id: &str) -> JobId {
    JobId(id.to_string())
}

#[derive(Default)]
struct MemoryState {
    jobs: BTreeMap<JobId, Job>,
    drivers: BTreeMap<DriverId, Driver>,
    failures: BTreeMap<JobId, FailureReason>,
    recorded: Vec<AssignmentDecision>,
}

/// In-process repository that applies decisions the way the booking store does.
#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryRepository {
    pub(super) fn seeded(jobs: Vec<Job>, drivers: Vec<Driver>) -> Self {
        let repository = Self::default();
        {
            let mut state = repository.state.lock().expect("repository mutex poisoned");
            state.jobs = jobs.into_iter().map(|job| (job.id.clone(), job)).collect();
            state.drivers = drivers
                .into_iter()
                .map(|driver| (driver.id.clone(), driver))
                .collect();
        }
        repository
    }

    pub(super) fn job(&self, id: &str) -> Job {
        let state = self.state.lock().expect("repository mutex poisoned");
        state.jobs.get(&job_id(id)).cloned().expect("job exists")
    }

    pub(super) fn committed_today(&self, id: &str) -> u32 {
        let state = self.state.lock().expect("repository mutex poisoned");
        state
            .drivers
            .get(&driver_id(id))
            .map(|driver| {
                driver
                    .committed
                    .iter()
                    .filter(|load| load.date == pickup_date())
                    .map(|load| load.jobs)
                    .sum()
            })
            .unwrap_or(0)
    }

    pub(super) fn failure(&self, id: &str) -> Option<FailureReason> {
        let state = self.state.lock().expect("repository mutex poisoned");
        state.failures.get(&job_id(id)).copied()
    }

    pub(super) fn recorded(&self) -> Vec<AssignmentDecision> {
        let state = self.state.lock().expect("repository mutex poisoned");
        state.recorded.clone()
    }
}

impl DispatchRepository for MemoryRepository {
    fn list_pending_jobs(&self) -> Result<Vec<Job>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state
            .jobs
            .values()
            .filter(|job| job.status.awaits_assignment())
            .cloned()
            .collect())
    }

    fn list_active_drivers(&self) -> Result<Vec<Driver>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state
            .drivers
            .values()
            .filter(|driver| driver.is_active)
            .cloned()
            .collect())
    }

    fn find_job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state.jobs.get(id).cloned())
    }

    fn find_driver(&self, id: &DriverId) -> Result<Option<Driver>, RepositoryError> {
        let state = self.state.lock().expect("repository mutex poisoned");
        Ok(state.drivers.get(id).cloned())
    }

    fn record_decision(
        &self,
        job: &Job,
        decision: &AssignmentDecision,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("repository mutex poisoned");
        if state.recorded.contains(decision) {
            return Ok(());
        }
        if let Some(driver_id) = &decision.driver_id {
            let committed_elsewhere = state
                .recorded
                .iter()
                .any(|earlier| earlier.job_id == job.id && earlier.is_assigned());
            if committed_elsewhere {
                return Err(RepositoryError::Conflict);
            }
            if !state.drivers.contains_key(driver_id) {
                return Err(RepositoryError::NotFound);
            }
        }
        state.recorded.push(decision.clone());

        match (&decision.driver_id, decision.failure_reason) {
            (Some(driver_id), _) => {
                if let Some(stored) = state.jobs.get_mut(&job.id) {
                    stored.status = JobStatus::Assigned;
                }
                state.failures.remove(&job.id);
                if let Some(driver) = state.drivers.get_mut(driver_id) {
                    driver.committed.push(CommittedLoad {
                        date: job.pickup_date,
                        slot: job.pickup_slot,
                        jobs: 1,
                    });
                }
            }
            (None, Some(reason)) => {
                state.failures.insert(job.id.clone(), reason);
            }
            (None, None) => {}
        }
        Ok(())
    }
}

pub(super) struct UnavailableRepository;

impl DispatchRepository for UnavailableRepository {
    fn list_pending_jobs(&self) -> Result<Vec<Job>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_active_drivers(&self) -> Result<Vec<Driver>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_job(&self, _id: &JobId) -> Result<Option<Job>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_driver(&self, _id: &DriverId) -> Result<Option<Driver>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn record_decision(
        &self,
        _job: &Job,
        _decision: &AssignmentDecision,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Reads from a replica that lags the primary; writes go to the primary.
pub(super) struct LaggingRepository {
    primary: MemoryRepository,
    stale_jobs: BTreeMap<JobId, Job>,
}

impl LaggingRepository {
    pub(super) fn new(primary: MemoryRepository, stale_jobs: Vec<Job>) -> Self {
        Self {
            primary,
            stale_jobs: stale_jobs
                .into_iter()
                .map(|job| (job.id.clone(), job))
                .collect(),
        }
    }
}

impl DispatchRepository for LaggingRepository {
    fn list_pending_jobs(&self) -> Result<Vec<Job>, RepositoryError> {
        Ok(self.stale_jobs.values().cloned().collect())
    }

    fn list_active_drivers(&self) -> Result<Vec<Driver>, RepositoryError> {
        self.primary.list_active_drivers()
    }

    fn find_job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        Ok(self.stale_jobs.get(id).cloned())
    }

    fn find_driver(&self, id: &DriverId) -> Result<Option<Driver>, RepositoryError> {
        self.primary.find_driver(id)
    }

    fn record_decision(
        &self,
        job: &Job,
        decision: &AssignmentDecision,
    ) -> Result<(), RepositoryError> {
        self.primary.record_decision(job, decision)
    }
}

pub(super) type MemoryService = DispatchService<MemoryRepository, StaticConfigSource>;

pub(super) fn build_service(
    jobs: Vec<Job>,
    drivers: Vec<Driver>,
) -> (Arc<MemoryService>, MemoryRepository) {
    let repository = MemoryRepository::seeded(jobs, drivers);
    let service = DispatchService::new(
        Arc::new(repository.clone()),
        Arc::new(StaticConfigSource(AssignmentConfig::default())),
    );
    (Arc::new(service), repository)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
