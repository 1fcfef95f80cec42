use serde::{Deserialize, Serialize};

use super::constraints::HardConstraintResult;
use super::domain::{AssignmentMode, DriverId, JobId};
use super::policy::HardConstraint;

/// Why a job was left without a driver. A business outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    NoEligibleDriver,
    NoCapacity,
    OutsideWorkingHours,
    NoRegionCoverage,
    NoVehicleMatch,
    ConfigDisabled,
}

impl FailureReason {
    pub const fn code(self) -> &'static str {
        match self {
            FailureReason::NoEligibleDriver => "NO_ELIGIBLE_DRIVER",
            FailureReason::NoCapacity => "NO_CAPACITY",
            FailureReason::OutsideWorkingHours => "OUTSIDE_WORKING_HOURS",
            FailureReason::NoRegionCoverage => "NO_REGION_COVERAGE",
            FailureReason::NoVehicleMatch => "NO_VEHICLE_MATCH",
            FailureReason::ConfigDisabled => "CONFIG_DISABLED",
        }
    }

    pub fn summary(self) -> String {
        match self {
            FailureReason::NoEligibleDriver => "no active driver is eligible".to_string(),
            FailureReason::NoCapacity => "matching drivers are fully booked".to_string(),
            FailureReason::OutsideWorkingHours => {
                "pickup slot falls outside driver working hours".to_string()
            }
            FailureReason::NoRegionCoverage => "no driver covers the pickup region".to_string(),
            FailureReason::NoVehicleMatch => "no driver has the required vehicle".to_string(),
            FailureReason::ConfigDisabled => "auto-assignment is disabled".to_string(),
        }
    }

    fn from_constraint(constraint: HardConstraint) -> Self {
        match constraint {
            HardConstraint::SlotCapacity => FailureReason::NoCapacity,
            HardConstraint::RegionMatch => FailureReason::NoRegionCoverage,
            HardConstraint::VehicleMatch => FailureReason::NoVehicleMatch,
            HardConstraint::WorkingHours => FailureReason::OutsideWorkingHours,
            HardConstraint::ActiveDriver => FailureReason::NoEligibleDriver,
        }
    }
}

/// Capacity and region first: they are what an operator can act on.
const REASON_PRIORITY: [HardConstraint; 5] = [
    HardConstraint::SlotCapacity,
    HardConstraint::RegionMatch,
    HardConstraint::VehicleMatch,
    HardConstraint::WorkingHours,
    HardConstraint::ActiveDriver,
];

/// Pick the single most useful reason when no driver qualified.
///
/// Only the nearest misses (drivers with the fewest failed constraints) are
/// considered, so a driver that is right in every way but full yields
/// `NoCapacity` even if others are in the wrong region.
pub fn diagnose(results: &[&HardConstraintResult]) -> FailureReason {
    let failures: Vec<Vec<HardConstraint>> = results.iter().map(|result| result.failed()).collect();

    let Some(fewest) = failures
        .iter()
        .map(Vec::len)
        .filter(|count| *count > 0)
        .min()
    else {
        return FailureReason::NoEligibleDriver;
    };

    REASON_PRIORITY
        .into_iter()
        .find(|constraint| {
            failures
                .iter()
                .filter(|failed| failed.len() == fewest)
                .any(|failed| failed.contains(constraint))
        })
        .map(FailureReason::from_constraint)
        .unwrap_or(FailureReason::NoEligibleDriver)
}

/// Result of trying to place one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentDecision {
    pub job_id: JobId,
    pub driver_id: Option<DriverId>,
    pub mode: AssignmentMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<FailureReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_score: Option<f64>,
}

impl AssignmentDecision {
    pub fn assigned(
        job_id: JobId,
        driver_id: DriverId,
        mode: AssignmentMode,
        total_score: Option<f64>,
    ) -> Self {
        Self {
            job_id,
            driver_id: Some(driver_id),
            mode,
            failure_reason: None,
            total_score,
        }
    }

    pub fn unassigned(job_id: JobId, mode: AssignmentMode, reason: FailureReason) -> Self {
        Self {
            job_id,
            driver_id: None,
            mode,
            failure_reason: Some(reason),
            total_score: None,
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.driver_id.is_some()
    }

    pub fn summary(&self) -> String {
        match (&self.driver_id, self.failure_reason) {
            (Some(driver), _) => format!("job {} assigned to {}", self.job_id, driver),
            (None, Some(reason)) => format!("job {} unassigned: {}", self.job_id, reason.summary()),
            (None, None) => format!("job {} unassigned", self.job_id),
        }
    }
}
