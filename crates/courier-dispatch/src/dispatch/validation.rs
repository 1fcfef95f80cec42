use std::collections::HashSet;

use super::domain::{Driver, DriverId, Job, JobId};

/// Malformed input. Fatal: the caller has to fix the data, nothing is retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("job id must not be empty")]
    EmptyJobId,
    #[error("driver id must not be empty")]
    EmptyDriverId,
    #[error("driver {driver} has invalid working hours {start}..{end}")]
    InvalidWorkingHours { driver: DriverId, start: u8, end: u8 },
    #[error("driver {0} appears more than once in the roster")]
    DuplicateDriver(DriverId),
    #[error("job {0} appears more than once in the queue")]
    DuplicateJob(JobId),
    #[error("soft rule {rule} has invalid weight {weight}")]
    InvalidWeight { rule: &'static str, weight: f64 },
    #[error("enabled soft rule weights sum to {0}, which is not finite")]
    InvalidWeightSum(f64),
    #[error("batch run needs at least one driver")]
    EmptyRoster,
    #[error("job {job} is {status} and cannot be assigned")]
    NotAwaitingAssignment { job: JobId, status: &'static str },
}

pub fn validate_job(job: &Job) -> Result<(), ValidationError> {
    if job.id.0.trim().is_empty() {
        return Err(ValidationError::EmptyJobId);
    }
    Ok(())
}

pub fn validate_driver(driver: &Driver) -> Result<(), ValidationError> {
    if driver.id.0.trim().is_empty() {
        return Err(ValidationError::EmptyDriverId);
    }
    let (start, end) = (driver.work_day_start_hour, driver.work_day_end_hour);
    if start > 23 || end > 23 || start >= end {
        return Err(ValidationError::InvalidWorkingHours {
            driver: driver.id.clone(),
            start,
            end,
        });
    }
    Ok(())
}

pub fn validate_roster(drivers: &[Driver]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for driver in drivers {
        validate_driver(driver)?;
        if !seen.insert(&driver.id) {
            return Err(ValidationError::DuplicateDriver(driver.id.clone()));
        }
    }
    Ok(())
}

pub fn validate_jobs(jobs: &[Job]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for job in jobs {
        validate_job(job)?;
        if !seen.insert(&job.id) {
            return Err(ValidationError::DuplicateJob(job.id.clone()));
        }
    }
    Ok(())
}
