use chrono::{Duration, NaiveDate, TimeZone, Utc};
use courier_dispatch::config::load_policy_file;
use courier_dispatch::dispatch::{
    AssignmentConfig, AssignmentConfigSource, AssignmentDecision, CommittedLoad,
    DispatchRepository, DispatchSnapshot, Driver, DriverId, FailureReason, Job, JobId, JobStatus,
    Region, RepositoryError, TimeSlot, VehicleType,
};
use courier_dispatch::error::AppError;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct Store {
    jobs: BTreeMap<JobId, Job>,
    drivers: BTreeMap<DriverId, Driver>,
    failures: BTreeMap<JobId, FailureReason>,
    applied: HashMap<JobId, DriverId>,
}

/// Process-local stand-in for the booking database.
#[derive(Default, Clone)]
pub(crate) struct InMemoryDispatchRepository {
    store: Arc<Mutex<Store>>,
}

impl InMemoryDispatchRepository {
    pub(crate) fn from_snapshot(snapshot: DispatchSnapshot) -> Self {
        let repository = Self::default();
        {
            let mut store = repository.store.lock().expect("repository mutex poisoned");
            store.jobs = snapshot
                .jobs
                .into_iter()
                .map(|job| (job.id.clone(), job))
                .collect();
            store.drivers = snapshot
                .drivers
                .into_iter()
                .map(|driver| (driver.id.clone(), driver))
                .collect();
        }
        repository
    }

    #[cfg(test)]
    pub(crate) fn failure(&self, id: &JobId) -> Option<FailureReason> {
        let store = self.store.lock().expect("repository mutex poisoned");
        store.failures.get(id).copied()
    }
}

impl DispatchRepository for InMemoryDispatchRepository {
    fn list_pending_jobs(&self) -> Result<Vec<Job>, RepositoryError> {
        let store = self.store.lock().expect("repository mutex poisoned");
        Ok(store
            .jobs
            .values()
            .filter(|job| job.status.awaits_assignment())
            .cloned()
            .collect())
    }

    fn list_active_drivers(&self) -> Result<Vec<Driver>, RepositoryError> {
        let store = self.store.lock().expect("repository mutex poisoned");
        Ok(store
            .drivers
            .values()
            .filter(|driver| driver.is_active)
            .cloned()
            .collect())
    }

    fn find_job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        let store = self.store.lock().expect("repository mutex poisoned");
        Ok(store.jobs.get(id).cloned())
    }

    fn find_driver(&self, id: &DriverId) -> Result<Option<Driver>, RepositoryError> {
        let store = self.store.lock().expect("repository mutex poisoned");
        Ok(store.drivers.get(id).cloned())
    }

    fn record_decision(
        &self,
        job: &Job,
        decision: &AssignmentDecision,
    ) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().expect("repository mutex poisoned");
        let Some(driver_id) = &decision.driver_id else {
            if let Some(reason) = decision.failure_reason {
                store.failures.insert(job.id.clone(), reason);
            }
            return Ok(());
        };

        // A job is committed once; replays of the same decision are no-ops.
        match store.applied.get(&job.id) {
            Some(committed) if committed == driver_id => return Ok(()),
            Some(_) => return Err(RepositoryError::Conflict),
            None => {}
        }
        let Some(driver) = store.drivers.get_mut(driver_id) else {
            return Err(RepositoryError::NotFound);
        };
        driver.committed.push(CommittedLoad {
            date: job.pickup_date,
            slot: job.pickup_slot,
            jobs: 1,
        });

        store.applied.insert(job.id.clone(), driver_id.clone());
        store.failures.remove(&job.id);
        if let Some(stored) = store.jobs.get_mut(&job.id) {
            stored.status = JobStatus::Assigned;
        }
        Ok(())
    }
}

/// Policy read from disk on every run so edits apply without a restart.
#[derive(Debug, Clone, Default)]
pub(crate) struct FilePolicySource {
    path: Option<PathBuf>,
}

impl FilePolicySource {
    pub(crate) fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl AssignmentConfigSource for FilePolicySource {
    fn current(&self) -> Result<AssignmentConfig, RepositoryError> {
        match &self.path {
            Some(path) => {
                load_policy_file(path).map_err(|err| RepositoryError::Unavailable(err.to_string()))
            }
            None => Ok(AssignmentConfig::default()),
        }
    }
}

pub(crate) fn load_snapshot(path: &Path) -> Result<DispatchSnapshot, AppError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

fn slot(raw: &str) -> TimeSlot {
    TimeSlot::parse(raw).expect("demo slot literal is valid")
}

/// Seeded roster and queue used by `demo` and by `serve` when no snapshot is given.
pub(crate) fn demo_snapshot(date: NaiveDate) -> DispatchSnapshot {
    let booked = date
        .and_hms_opt(0, 0, 0)
        .map(|midnight| Utc.from_utc_datetime(&midnight) - Duration::hours(15))
        .unwrap_or_else(Utc::now);

    let driver = |id: &str, region: Region, secondary: &[Region], vehicle, per_day, committed| {
        Driver {
            id: DriverId(id.to_string()),
            primary_region: region,
            secondary_regions: secondary.iter().copied().collect::<BTreeSet<_>>(),
            vehicle_type: vehicle,
            is_active: true,
            max_jobs_per_day: per_day,
            max_jobs_per_slot: 2,
            work_day_start_hour: 7,
            work_day_end_hour: 19,
            committed: if committed == 0 {
                Vec::new()
            } else {
                vec![CommittedLoad {
                    date,
                    slot: slot("07:00-09:00"),
                    jobs: committed,
                }]
            },
        }
    };

    let drivers = vec![
        driver("drv-amara", Region::Central, &[Region::North], VehicleType::Van, 4, 1),
        driver("drv-bo", Region::East, &[Region::Central, Region::NorthEast], VehicleType::Car, 5, 0),
        driver("drv-chidi", Region::SouthWest, &[Region::South], VehicleType::Truck, 3, 2),
        driver("drv-dana", Region::North, &[], VehicleType::Motorcycle, 6, 0),
    ];

    let jobs = [
        ("job-1001", Region::Central, "09:00-11:00", None),
        ("job-1002", Region::Central, "09:00-11:00", Some(VehicleType::Van)),
        ("job-1003", Region::NorthEast, "11:00-13:00", None),
        ("job-1004", Region::South, "13:00-15:00", Some(VehicleType::Truck)),
        ("job-1005", Region::West, "15:00-17:00", None),
        ("job-1006", Region::North, "20:00-21:00", None),
        ("job-1007", Region::Central, "09:00-11:00", Some(VehicleType::Van)),
    ]
    .into_iter()
    .enumerate()
    .map(|(index, (id, region, window, vehicle))| Job {
        id: JobId(id.to_string()),
        pickup_region: region,
        pickup_date: date,
        pickup_slot: slot(window),
        required_vehicle: vehicle,
        status: JobStatus::PendingAssignment,
        created_at: booked + Duration::minutes(index as i64 * 7),
    })
    .collect();

    DispatchSnapshot { jobs, drivers }
}
